//! CSV directory data adapter.
//!
//! Each code lives in `<base_path>/<CODE>.csv`. Columns are found by header
//! name, case-insensitively, so exports with extra columns (`Adj Close`) or a
//! different column order load as-is. Rows carrying `null` prices, as in
//! Yahoo Finance exports for non-trading days, are skipped.

use crate::domain::error::ZrevertError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, path: &str) -> Result<Self, ZrevertError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| ZrevertError::Data {
                reason: format!("{path}: missing {name} column"),
            })
        };
        Ok(Columns {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{code}.csv"))
    }

    fn read_all(&self, code: &str) -> Result<Vec<OhlcvBar>, ZrevertError> {
        let path = self.csv_path(code);
        let display = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| ZrevertError::Data {
            reason: format!("failed to read {display}: {e}"),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let columns = Columns::from_headers(rdr.headers()?, &display)?;
        let mut bars = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result?;
            // header is line 1
            let line = line + 2;
            let field = |idx: usize, name: &str| {
                record.get(idx).map(str::trim).ok_or_else(|| ZrevertError::Data {
                    reason: format!("{display}:{line}: missing {name} value"),
                })
            };

            let date_str = field(columns.date, "date")?;
            let date = parse_date(date_str).ok_or_else(|| ZrevertError::Data {
                reason: format!("{display}:{line}: invalid date '{date_str}'"),
            })?;

            let raw = [
                field(columns.open, "open")?,
                field(columns.high, "high")?,
                field(columns.low, "low")?,
                field(columns.close, "close")?,
            ];
            if raw.iter().any(|v| v.eq_ignore_ascii_case("null") || v.is_empty()) {
                let file = display.as_str();
                tracing::debug!(file = %file, line, "skipping row without prices");
                continue;
            }

            let mut prices = [0.0_f64; 4];
            for (slot, (value, name)) in prices
                .iter_mut()
                .zip(raw.iter().zip(["open", "high", "low", "close"]))
            {
                *slot = value.parse().map_err(|e| ZrevertError::Data {
                    reason: format!("{display}:{line}: invalid {name} value '{value}': {e}"),
                })?;
            }

            let volume = match columns.volume {
                Some(idx) => {
                    let v = field(idx, "volume")?;
                    if v.is_empty() || v.eq_ignore_ascii_case("null") {
                        0.0
                    } else {
                        v.parse().map_err(|e| ZrevertError::Data {
                            reason: format!("{display}:{line}: invalid volume value '{v}': {e}"),
                        })?
                    }
                }
                None => 0.0,
            };

            let [open, high, low, close] = prices;
            bars.push(OhlcvBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    // Timestamps such as "2020-01-01 00:00:00+05:30" keep only the date part.
    let date_part = value.split([' ', 'T']).next().unwrap_or(value);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ZrevertError> {
        let bars: Vec<OhlcvBar> = self
            .read_all(code)?
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect();
        tracing::debug!(code, bars = bars.len(), %start_date, %end_date, "fetched bars");
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ZrevertError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ZrevertError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ZrevertError::Data {
                reason: format!("directory entry error: {e}"),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(code) = name_str.strip_suffix(".csv") {
                symbols.push(code.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ZrevertError> {
        if !self.csv_path(code).exists() {
            return Ok(None);
        }
        let bars = self.read_all(code)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
