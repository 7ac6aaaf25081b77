//! Weather data sources
//!
//! [`OpenMeteoClient`] pulls hourly and daily series from the Open-Meteo
//! HTTP API with bounded retries; [`JsonFileSource`] replays a payload that
//! was saved to disk earlier. Both implement [`wetl_core::WeatherSource`].

pub mod json_file;
pub mod open_meteo;

pub use json_file::*;
pub use open_meteo::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Transport failures, server errors and rate limiting are worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(_) => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
