//! Rolling mean and sample standard deviation.
//!
//! MEAN(n)[i] = sum(C[i-j] for j in 0..n) / n
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - MEAN(n)[i])^2 for j in 0..n) / (n - 1))
//! Warmup: first (n-1) points are `None`.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingStats {
    pub mean: f64,
    pub std_dev: f64,
}

pub fn rolling_stats(closes: &[f64], period: usize) -> Vec<Option<RollingStats>> {
    let mut values = Vec::with_capacity(closes.len());
    if period < 2 {
        values.resize(closes.len(), None);
        return values;
    }
    let warmup = period - 1;

    for i in 0..closes.len() {
        if i < warmup {
            values.push(None);
            continue;
        }

        let window = &closes[i + 1 - period..=i];
        // Work relative to the first close so a run of identical closes
        // yields an exact zero deviation and an exact mean.
        let base = window[0];
        let offset = window.iter().map(|c| c - base).sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|c| {
                let diff = (c - base) - offset;
                diff * diff
            })
            .sum::<f64>()
            / (period - 1) as f64;

        values.push(Some(RollingStats {
            mean: base + offset,
            std_dev: variance.sqrt(),
        }));
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_is_none() {
        let stats = rolling_stats(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);

        assert!(stats[0].is_none());
        assert!(stats[1].is_none());
        assert!(stats[2].is_some());
        assert!(stats[3].is_some());
        assert!(stats[4].is_some());
    }

    #[test]
    fn constant_values_have_zero_stddev() {
        let stats = rolling_stats(&[100.0; 5], 3);

        for s in stats.iter().skip(2) {
            let s = s.unwrap();
            assert_eq!(s.mean, 100.0);
            assert_eq!(s.std_dev, 0.0);
        }
    }

    #[test]
    fn inexact_constant_prices_have_exact_zero_stddev() {
        let stats = rolling_stats(&[0.1; 20], 20);
        let s = stats[19].unwrap();
        assert_eq!(s.mean, 0.1);
        assert_eq!(s.std_dev, 0.0);

        for k in 0..10_000 {
            let price = 1.0 + k as f64 * 0.0137;
            let stats = rolling_stats(&[price; 20], 20);
            let s = stats[19].unwrap();
            assert_eq!(s.std_dev, 0.0, "price {price}");
            assert_eq!(s.mean, price, "price {price}");
        }
    }

    #[test]
    fn sample_divisor() {
        // mean 20, squared deviations 100 + 0 + 100, / (3 - 1) = 100
        let stats = rolling_stats(&[10.0, 20.0, 30.0], 3);
        let s = stats[2].unwrap();
        assert!((s.mean - 20.0).abs() < 1e-10);
        assert!((s.std_dev - 10.0).abs() < 1e-10);
    }

    #[test]
    fn known_values() {
        // Population stddev of this set is 2; sample stddev is sqrt(32 / 7).
        let stats = rolling_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        let s = stats[7].unwrap();
        assert!((s.mean - 5.0).abs() < 1e-10);
        assert!((s.std_dev - (32.0_f64 / 7.0).sqrt()).abs() < 1e-10);
    }

    #[test]
    fn window_slides() {
        let stats = rolling_stats(&[1.0, 2.0, 3.0, 10.0], 3);
        let s = stats[3].unwrap();
        assert!((s.mean - 5.0).abs() < 1e-10);
    }

    #[test]
    fn series_shorter_than_period() {
        let stats = rolling_stats(&[1.0, 2.0], 5);
        assert_eq!(stats.len(), 2);
        assert!(stats.iter().all(Option::is_none));
    }

    #[test]
    fn degenerate_period_yields_none() {
        let stats = rolling_stats(&[1.0, 2.0, 3.0], 1);
        assert_eq!(stats, vec![None, None, None]);
    }
}
