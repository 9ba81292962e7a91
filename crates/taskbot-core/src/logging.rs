use tracing::Span;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize logging/tracing for the bot.
///
/// `level` comes from configuration (`LOG_LEVEL`); `RUST_LOG` overrides it.
pub fn init(service_name: &str, level: &str) -> Result<()> {
    let level = filter_level(level);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,taskbot={level},taskbot_core={level},taskbot_telegram={level},{service_name}={level}"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install log subscriber: {e}")))
}

/// Logging handle for one component.
///
/// Components take the span at construction and record their events inside
/// it, so log lines carry the component name without any global registry.
pub fn component_span(name: &'static str) -> Span {
    tracing::info_span!("taskbot", component = name)
}

/// Map a config level (`INFO`, `WARNING`, `CRITICAL`, ...) to a tracing filter
/// directive. Unknown values fall back to `info`.
pub fn filter_level(level: &str) -> &'static str {
    match level.trim().to_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" | "CRITICAL" | "FATAL" => "error",
        _ => "info",
    }
}
