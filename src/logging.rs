use chrono::Local;
use color_eyre::{eyre::eyre, Result};
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the log file for a run started now, e.g. `2024-10-24_16-15-00.log`
pub fn log_file_name() -> String {
  Local::now().format("%Y-%m-%d_%H-%M-%S.log").to_string()
}

fn default_filter(verbose: bool) -> &'static str {
  if verbose {
    "timesync=debug,info"
  } else {
    "info"
  }
}

/// Human-readable output on stderr plus a per-run file under `log_dir`.
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the program.
pub fn init(log_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
  std::fs::create_dir_all(log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let file_appender = tracing_appender::rolling::never(log_dir, log_file_name());
  let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

  let env_filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
    .map_err(|e| eyre!("Failed to create tracing filter: {}", e))?;

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_writer(io::stderr).with_target(false))
    .with(fmt::layer().with_writer(file_writer).with_ansi(false))
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  tracing::debug!(dir = %log_dir.display(), "logging initialized");
  Ok(guard)
}
