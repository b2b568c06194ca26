//! INI file configuration adapter.

use crate::domain::error::ZrevertError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ZrevertError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| ZrevertError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ZrevertError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ZrevertError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }

    fn value(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.value(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, ZrevertError> {
        match self.value(section, key) {
            None => Ok(default),
            Some(v) => v.parse().map_err(|_| {
                ZrevertError::invalid(section, key, format!("expected an integer, got '{v}'"))
            }),
        }
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, ZrevertError> {
        match self.value(section, key) {
            None => Ok(default),
            Some(v) => v.parse().map_err(|_| {
                ZrevertError::invalid(section, key, format!("expected a number, got '{v}'"))
            }),
        }
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, ZrevertError> {
        match self.value(section, key) {
            None => Ok(default),
            Some(v) => Self::parse_bool(&v).ok_or_else(|| {
                ZrevertError::invalid(section, key, format!("expected a boolean, got '{v}'"))
            }),
        }
    }
}
