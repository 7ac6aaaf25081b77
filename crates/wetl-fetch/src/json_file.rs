//! Replay of a saved API payload

use crate::FetchResult;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wetl_core::{FetchRequest, ForecastResponse, WeatherSource};

/// Parse an API payload
pub fn parse_forecast(bytes: &[u8]) -> FetchResult<ForecastResponse> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Reads a pre-fetched [`ForecastResponse`] from a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> FetchResult<ForecastResponse> {
        info!(path = %self.path.display(), "Loading weather data from file");
        let bytes = tokio::fs::read(&self.path).await?;
        parse_forecast(&bytes)
    }
}

#[async_trait::async_trait]
impl WeatherSource for JsonFileSource {
    /// The file already fixes location and dates; the request is ignored
    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<ForecastResponse> {
        debug!(?request, "Serving request from saved payload");
        Ok(self.load().await?)
    }
}
