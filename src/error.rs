use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the meter's outer layer.
///
/// Metering itself never fails; these cover tariff loading, the geocoding
/// collaborator and the service lifecycle.
#[derive(Error, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Error {
    #[error("code: invalid_tariff, description: {0}")]
    InvalidTariff(String),

    #[error("code: geocode_failed, description: {0}")]
    GeocodeFailed(String),

    #[error("code: no_active_trip")]
    NoActiveTrip,

    #[error("code: service_stopped")]
    ServiceStopped,

    #[error("code: server_error, description: {0}")]
    ServerError(String),
}

impl Error {
    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> &str {
        match self {
            Self::InvalidTariff(_) => "invalid_tariff",
            Self::GeocodeFailed(_) => "geocode_failed",
            Self::NoActiveTrip => "no_active_trip",
            Self::ServiceStopped => "service_stopped",
            Self::ServerError(_) => "server_error",
        }
    }

    /// Returns the error description.
    #[must_use]
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<Self>() {
            Some(Self::InvalidTariff(e)) => Self::InvalidTariff(format!("{err}: {e}")),
            Some(Self::GeocodeFailed(e)) => Self::GeocodeFailed(format!("{err}: {e}")),
            Some(Self::ServerError(e)) => Self::ServerError(format!("{err}: {e}")),
            Some(Self::NoActiveTrip) => Self::NoActiveTrip,
            Some(Self::ServiceStopped) => Self::ServiceStopped,
            None => {
                if let Some(tariff) = err.downcast_ref::<tariff::Error>() {
                    return Self::InvalidTariff(format!("{err}: {tariff}"));
                }
                let stack = err.chain().fold(String::new(), |cause, e| format!("{cause} -> {e}"));
                let stack = stack.trim_start_matches(" -> ").to_string();
                Self::ServerError(stack)
            }
        }
    }
}

impl From<tariff::Error> for Error {
    fn from(err: tariff::Error) -> Self {
        Self::InvalidTariff(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use anyhow::{Context, anyhow};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn meter_context() {
        let result = Err::<(), Error>(Error::GeocodeFailed("timed out".to_string()))
            .context("resolving departure");
        let err: Error = result.unwrap_err().into();

        assert_eq!(err.code(), "geocode_failed");
        assert_eq!(
            err.to_string(),
            "code: geocode_failed, description: resolving departure: timed out"
        );
    }

    #[test]
    fn anyhow_context() {
        let result = Err::<(), anyhow::Error>(anyhow!("connection reset")).context("geocoder");
        let err: Error = result.unwrap_err().into();

        assert_eq!(err.to_string(), "code: server_error, description: geocoder -> connection reset");
    }

    #[test]
    fn tariff_errors_keep_their_code() {
        let err: Error = tariff::Error::BuiltIn("seoul".to_string()).into();
        assert_eq!(err.code(), "invalid_tariff");
        assert!(err.description().contains("seoul"));

        let result = Err::<(), tariff::Error>(tariff::Error::UnknownRegion("jeju".to_string()))
            .context("removing table");
        let err: Error = result.unwrap_err().into();
        assert_eq!(err.code(), "invalid_tariff");
    }

    #[test]
    fn unit_variants() {
        assert_eq!(Error::NoActiveTrip.to_string(), "code: no_active_trip");
        assert_eq!(Error::ServiceStopped.code(), "service_stopped");
    }
}
