//! Open-Meteo forecast client

use crate::{FetchError, FetchResult};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;
use wetl_core::{FetchRequest, ForecastResponse, HourlyChannel, WeatherSource};

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DAILY_CHANNELS: &str = "sunrise,sunset,daylight_duration";
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based), capped at one minute
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

pub struct OpenMeteoClient {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> FetchResult<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            retry: RetryPolicy {
                max_attempts: retry.max_attempts.max(1),
                ..retry
            },
        })
    }

    /// Full request URL: base plus location, dates and the fixed unit settings
    pub fn request_url(&self, request: &FetchRequest) -> Url {
        let hourly = HourlyChannel::ALL
            .iter()
            .map(|c| c.key())
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &request.latitude.to_string())
            .append_pair("longitude", &request.longitude.to_string())
            .append_pair("start_date", &request.start_date.format("%Y-%m-%d").to_string())
            .append_pair("end_date", &request.end_date.format("%Y-%m-%d").to_string())
            .append_pair("hourly", &hourly)
            .append_pair("daily", DAILY_CHANNELS)
            .append_pair("timezone", "auto")
            .append_pair("timeformat", "unixtime")
            .append_pair("wind_speed_unit", "kn")
            .append_pair("temperature_unit", "fahrenheit")
            .append_pair("precipitation_unit", "inch");
        url
    }

    /// Fetch the forecast, retrying transient failures
    pub async fn fetch_forecast(&self, request: &FetchRequest) -> FetchResult<ForecastResponse> {
        let url = self.request_url(request);
        info!(
            latitude = request.latitude,
            longitude = request.longitude,
            start_date = %request.start_date,
            end_date = %request.end_date,
            "Fetching weather data"
        );

        let mut attempt = 1;
        loop {
            match self.fetch_once(&url).await {
                Ok(response) => {
                    if response.hourly.is_none() {
                        warn!("API response carries no hourly block");
                    }
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Weather API request failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> FetchResult<ForecastResponse> {
        debug!(%url, "GET");
        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait::async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<ForecastResponse> {
        Ok(self.fetch_forecast(request).await?)
    }
}
