use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,wetl=debug";

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line, for log shippers
    #[default]
    Json,
    /// Human-readable lines for terminals
    Pretty,
}

impl LogFormat {
    /// `WETL_LOG_FORMAT=pretty` selects [`LogFormat::Pretty`]; anything else is JSON
    pub fn from_env() -> Self {
        Self::parse(std::env::var("WETL_LOG_FORMAT").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("pretty") || v.eq_ignore_ascii_case("text") => {
                LogFormat::Pretty
            }
            _ => LogFormat::Json,
        }
    }
}

fn env_filter() -> EnvFilter {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    EnvFilter::new(directives)
}

/// Initialize logging
/// - RUST_LOG respected; default to "info,wetl=debug"
/// - safe to call more than once; later calls are no-ops
pub fn init(service_name: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter());
    let installed = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(service = %service_name, ?format, "Logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!(LogFormat::parse(None), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("PRETTY")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(Some(" text ")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
    }

    #[test]
    fn init_twice_is_harmless() {
        init("wetl-test", LogFormat::Pretty);
        init("wetl-test", LogFormat::Json);
    }
}
