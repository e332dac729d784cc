use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Map a configured level name to a tracing level, falling back to INFO
pub fn parse_level(log_level: &str) -> Level {
    match log_level.to_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "INFO" => Level::INFO,
        "WARN" | "WARNING" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to INFO", log_level);
            Level::INFO
        }
    }
}

/// Install a global subscriber for the library's log output.
///
/// Fails if another global subscriber is already installed.
pub fn init_logging(log_level: &str, log_format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level = parse_level(log_level);

    // LOG_LEVEL from settings takes precedence over RUST_LOG
    let filter_string = format!("reconlib={},reqwest=warn,hyper=warn", level);
    let env_filter = tracing_subscriber::EnvFilter::new(filter_string);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match log_format.to_lowercase().as_str() {
        "json" => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true);

            subscriber.with(json_layer).try_init()?;
        }
        "plain" | "text" => {
            let plain_layer = tracing_subscriber::fmt::layer().with_target(true);

            subscriber.with(plain_layer).try_init()?;
        }
        _ => {
            return Err(format!("Invalid log format '{}'", log_format).into());
        }
    }

    tracing::debug!("Logging initialized at level {}", level);
    Ok(())
}

/// Initialize logging from library settings
pub fn init_from_settings(
    settings: &crate::config::Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&settings.log_level, &settings.log_format)
}
