use crate::config::LogSettings;
use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init_logger(settings: &LogSettings) -> anyhow::Result<()> {
    let level_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(settings.show_target)
        .with_thread_ids(settings.show_thread_ids)
        .with_ansi(settings.ansi_colors);

    tracing_subscriber::registry()
        .with(level_filter)
        .with(console_layer)
        .try_init()
        .context("installing log subscriber")?;

    tracing::debug!(level = %settings.level, "Logging initialized");
    Ok(())
}
