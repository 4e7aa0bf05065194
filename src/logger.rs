//! File logging setup.

use anyhow::{Context, Result};

use crate::config::LoggingConfig;
use crate::constants::LOG_FILE_NAME;

/// Install the global logger according to configuration.
///
/// When logging is disabled this is a no-op and the `log` macros go
/// nowhere. Safe to call once per process; a second call returns an
/// error from the logging facade.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    let path = match &config.file {
        Some(file) => file.clone(),
        None => crate::config::Config::get_xdg_config_dir()?.join(LOG_FILE_NAME),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ));
        })
        .level(log::LevelFilter::Debug)
        .chain(fern::log_file(&path).with_context(|| format!("Failed to open log file: {}", path.display()))?)
        .apply()
        .context("Failed to install logger")?;

    Ok(())
}
