//! # Tariff Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid tariff table {code}: {}", .errors.join("; "))]
    InvalidTable { code: String, errors: Vec<String> },

    #[error("unknown tariff region: {0}")]
    UnknownRegion(String),

    #[error("built-in tariff table cannot be changed: {0}")]
    BuiltIn(String),

    #[error("failed to decode tariff tables: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
