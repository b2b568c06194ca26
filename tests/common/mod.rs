#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use zrevert::domain::backtest::BacktestConfig;
use zrevert::domain::error::ZrevertError;
pub use zrevert::domain::ohlcv::{OhlcvBar, PriceSeries};
use zrevert::domain::strategy::StrategyParams;
use zrevert::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ZrevertError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(ZrevertError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, ZrevertError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ZrevertError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(ZrevertError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// Daily bars from 2020-01-01; each open equals the previous close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2020, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open,
                high: open.max(close),
                low: open.min(close),
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

pub fn series(closes: &[f64]) -> PriceSeries {
    PriceSeries::new("TEST", bars_from_closes(closes)).unwrap()
}

/// 25 closes at 100 followed by 5 at 70.
pub fn drop_scenario() -> Vec<f64> {
    let mut closes = vec![100.0; 25];
    closes.extend([70.0; 5]);
    closes
}

pub fn default_params() -> StrategyParams {
    StrategyParams::default()
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2020, 1, 1),
        end_date: date(2024, 12, 31),
        initial_capital: 10_000.0,
        commission: 0.0,
        margin: 1.0,
        trade_on_close: false,
        risk_free_rate: 0.0,
    }
}
