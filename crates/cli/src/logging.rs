use std::io;

use quickquote_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

/// Installs the global subscriber. Logs go to stderr so stdout stays the
/// wizard's rendering surface.
pub fn init(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(io::stderr);

    let result = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if result.is_err() {
        tracing::debug!(
            event_name = "system.logging.already_initialized",
            "subscriber already set"
        );
    }
}

/// Falls back to default logging when the config does not load; the
/// command itself reports the config failure.
pub fn init_from(options: &LoadOptions) {
    match AppConfig::load(options.clone()) {
        Ok(config) => init(&config),
        Err(_) => init(&AppConfig::default()),
    }
}
