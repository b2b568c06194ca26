//! Domain error types.

/// Top-level error type for zrevert.
#[derive(Debug, thiserror::Error)]
pub enum ZrevertError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {code} between {start} and {end}")]
    NoData {
        code: String,
        start: String,
        end: String,
    },

    #[error("price series for {code} is empty")]
    EmptySeries { code: String },

    #[error("price series for {code} is not strictly ascending at {date}")]
    UnorderedSeries { code: String, date: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ZrevertError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ZrevertError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        ZrevertError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&ZrevertError> for std::process::ExitCode {
    fn from(err: &ZrevertError) -> Self {
        let code: u8 = match err {
            ZrevertError::Io(_) | ZrevertError::Report { .. } => 1,
            ZrevertError::ConfigParse { .. }
            | ZrevertError::ConfigMissing { .. }
            | ZrevertError::ConfigInvalid { .. } => 2,
            ZrevertError::Data { .. } | ZrevertError::Csv(_) => 3,
            ZrevertError::NoData { .. }
            | ZrevertError::EmptySeries { .. }
            | ZrevertError::UnorderedSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
