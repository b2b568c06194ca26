//! Data access port trait.

use crate::domain::error::ZrevertError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code` with `start_date <= date <= end_date`, ascending.
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ZrevertError>;

    fn list_symbols(&self) -> Result<Vec<String>, ZrevertError>;

    /// First date, last date and bar count, or `None` when the code has no bars.
    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ZrevertError>;
}
