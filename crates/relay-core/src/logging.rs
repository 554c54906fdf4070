use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize structured logging for the bot.
///
/// `RUST_LOG` wins over `level` when set. With `json` enabled every event is
/// one JSON object per line, including its structured fields.
pub fn init(service_name: &str, level: &str, json: bool) -> Result<()> {
    let level = level.trim().to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,relay={level},relay_core={level},relay_telegram={level},{service_name}={level}"
        ))
    });

    let builder = fmt().with_env_filter(filter).with_target(true);
    let installed = if json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.with_ansi(false).try_init()
    };

    installed.map_err(|e| Error::Config(format!("logging init failed: {e}")))
}
