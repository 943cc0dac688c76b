use crate::client::WeatherError;
use crate::repo::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

/// Outcomes of the subscription lifecycle and weather lookups
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Validation errors, raised before any storage access
    #[error("{0}")]
    InvalidFrequency(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Invalid token")]
    InvalidToken,
    // State machine errors
    #[error("Email already subscribed for this city")]
    AlreadyExists,
    #[error("Subscription not found")]
    NotFound,
    #[error("Subscription already confirmed")]
    AlreadyConfirmed,
    #[error("City not found")]
    CityNotFound,
    // Collaborator errors
    #[error("Subscription store unavailable")]
    StoreUnavailable(#[source] StoreError),
    #[error("Weather provider unavailable")]
    ProviderUnavailable(#[source] WeatherError),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => Self::AlreadyExists,
            StoreError::AlreadyConfirmed => Self::AlreadyConfirmed,
            StoreError::NotFound => Self::NotFound,
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<WeatherError> for Error {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::CityNotFound => Self::CityNotFound,
            other => Self::ProviderUnavailable(other),
        }
    }
}

/// Render an error and its chain of sources, one per line
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
