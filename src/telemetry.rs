use tracing_subscriber::EnvFilter;
use crate::config::LoggingSettings;
use crate::error::StartupError;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Supported formats
/// are `json` (default), `pretty` and `compact`.
pub fn init_tracing(settings: &LoggingSettings) -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| StartupError::Telemetry(format!("invalid log level {:?}: {}", settings.level, e)))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    let result = match settings.format.as_str() {
        "pretty" => subscriber.pretty().try_init(),
        "compact" => subscriber.compact().try_init(),
        "json" => subscriber.json().try_init(),
        other => {
            return Err(StartupError::Telemetry(format!("unknown log format: {}", other)));
        }
    };

    result.map_err(|e| StartupError::Telemetry(e.to_string()))
}
