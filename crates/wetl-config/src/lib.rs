use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_CSV_PATH: &str = "./output/weather_data.csv";
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub delay_ms: Option<u64>,
    pub multiplier: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retry: Option<RetryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: 55.0344,
            longitude: 82.9434,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub csv_path: Option<String>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub api: Option<ApiConfig>,
    pub location: Option<LocationConfig>,
    pub output: Option<OutputConfig>,
    pub database: Option<DatabaseConfig>,
    pub http: Option<HttpConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Retry settings with defaults applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay: Duration,
    pub multiplier: f64,
}

impl AppConfig {
    /// Load configuration from WETL_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("WETL_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg = toml::from_str::<AppConfig>(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let location = self.location();
        if !(-90.0..=90.0).contains(&location.latitude) {
            return Err(ConfigError::Invalid {
                key: "location.latitude",
                reason: format!("{} is outside [-90, 90]", location.latitude),
            });
        }
        if !(-180.0..=180.0).contains(&location.longitude) {
            return Err(ConfigError::Invalid {
                key: "location.longitude",
                reason: format!("{} is outside [-180, 180]", location.longitude),
            });
        }
        if self.batch_size() == 0 {
            return Err(ConfigError::Invalid {
                key: "output.batch_size",
                reason: "must be at least 1".into(),
            });
        }
        let retry = self.retry();
        if retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "api.retry.max_attempts",
                reason: "must be at least 1".into(),
            });
        }
        if !retry.multiplier.is_finite() || retry.multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                key: "api.retry.multiplier",
                reason: format!("{} must be a finite number >= 1", retry.multiplier),
            });
        }
        Ok(())
    }

    /// Forecast API base URL (default Open-Meteo forecast endpoint)
    pub fn api_base_url(&self) -> String {
        self.api
            .as_ref()
            .and_then(|a| a.base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// Per-request timeout (default 30s)
    pub fn api_timeout(&self) -> Duration {
        let secs = self.api.as_ref().and_then(|a| a.timeout_secs).unwrap_or(30);
        Duration::from_secs(secs)
    }

    /// Retry policy (default 3 attempts, 1s delay doubling)
    pub fn retry(&self) -> RetrySettings {
        let retry = self.api.as_ref().and_then(|a| a.retry.as_ref());
        RetrySettings {
            max_attempts: retry.and_then(|r| r.max_attempts).unwrap_or(3),
            delay: Duration::from_millis(retry.and_then(|r| r.delay_ms).unwrap_or(1000)),
            multiplier: retry.and_then(|r| r.multiplier).unwrap_or(2.0),
        }
    }

    /// Default location for requests that do not name one
    pub fn location(&self) -> LocationConfig {
        self.location.clone().unwrap_or_default()
    }

    pub fn csv_path(&self) -> String {
        self.output
            .as_ref()
            .and_then(|o| o.csv_path.clone())
            .unwrap_or_else(|| DEFAULT_CSV_PATH.to_string())
    }

    pub fn batch_size(&self) -> usize {
        self.output.as_ref().and_then(|o| o.batch_size).unwrap_or(1000)
    }

    /// Database URL; `DATABASE_URL` takes precedence over the file
    pub fn database_url(&self) -> Option<String> {
        self.resolve_database_url(std::env::var("DATABASE_URL").ok())
    }

    fn resolve_database_url(&self, env: Option<String>) -> Option<String> {
        env.or_else(|| self.database.as_ref().and_then(|d| d.url.clone()))
            .filter(|url| !url.trim().is_empty())
    }

    /// Get HTTP bind address (default 0.0.0.0:8080)
    pub fn http_bind(&self) -> String {
        self.http
            .as_ref()
            .and_then(|h| h.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.http_bind(), "0.0.0.0:8080");
        assert_eq!(cfg.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(cfg.api_timeout(), Duration::from_secs(30));
        assert_eq!(
            cfg.retry(),
            RetrySettings {
                max_attempts: 3,
                delay: Duration::from_millis(1000),
                multiplier: 2.0,
            }
        );
        assert_eq!(cfg.location().latitude, 55.0344);
        assert_eq!(cfg.location().longitude, 82.9434);
        assert_eq!(cfg.csv_path(), "./output/weather_data.csv");
        assert_eq!(cfg.batch_size(), 1000);
        assert_eq!(cfg.resolve_database_url(None), None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parses_full_file() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [api]
            base_url = "http://localhost:9000/v1/archive"
            timeout_secs = 5
            [api.retry]
            max_attempts = 5
            delay_ms = 250
            multiplier = 1.5
            [location]
            latitude = 52.52
            longitude = 13.41
            [output]
            csv_path = "/tmp/out.csv"
            batch_size = 50
            [database]
            url = "mysql://etl:etl@db/weather"
            [http]
            bind = "127.0.0.1:9090"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.api_base_url(), "http://localhost:9000/v1/archive");
        assert_eq!(cfg.api_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.retry().max_attempts, 5);
        assert_eq!(cfg.retry().delay, Duration::from_millis(250));
        assert_eq!(cfg.retry().multiplier, 1.5);
        assert_eq!(cfg.location().latitude, 52.52);
        assert_eq!(cfg.csv_path(), "/tmp/out.csv");
        assert_eq!(cfg.batch_size(), 50);
        assert_eq!(cfg.http_bind(), "127.0.0.1:9090");
        assert_eq!(
            cfg.resolve_database_url(None).as_deref(),
            Some("mysql://etl:etl@db/weather")
        );
    }

    #[test]
    fn env_database_url_wins() {
        let cfg = AppConfig::from_toml_str("[database]\nurl = \"mysql://file/db\"\n").unwrap();
        assert_eq!(
            cfg.resolve_database_url(Some("mysql://env/db".into())).as_deref(),
            Some("mysql://env/db")
        );
        assert_eq!(cfg.resolve_database_url(Some("  ".into())), None);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            AppConfig::from_toml_str("[location]\nlatitude = 91.0\nlongitude = 0.0\n"),
            Err(ConfigError::Invalid { key: "location.latitude", .. })
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[output]\nbatch_size = 0\n"),
            Err(ConfigError::Invalid { key: "output.batch_size", .. })
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[api.retry]\nmultiplier = 0.5\n"),
            Err(ConfigError::Invalid { key: "api.retry.multiplier", .. })
        ));
        assert!(matches!(
            AppConfig::from_toml_str("[http\n"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.batch_size(), 1000);

        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[http]\nbind = \"127.0.0.1:1\"\n").unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().http_bind(), "127.0.0.1:1");
    }
}
