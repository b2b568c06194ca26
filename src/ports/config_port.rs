//! Configuration access port trait.
//!
//! Missing keys fall back to the caller's default; present but unparsable
//! values are an error rather than a silent default.

use crate::domain::error::ZrevertError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, ZrevertError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, ZrevertError>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, ZrevertError>;
}
