mod cache;
mod clockify;
mod commands;
mod config;
mod error;
mod http;
mod jira;
mod logging;
mod matching;
mod sheets;
mod sync;
mod toggl;
mod validate;
mod wrike;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "timesync")]
#[command(about = "Move worklogs between Toggl, Wrike, Jira, Clockify and Google Sheets")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./timesync.yaml or $XDG_CONFIG_HOME/timesync/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Bypass the on-disk memo cache
  #[arg(long, global = true)]
  no_cache: bool,

  /// Debug logging for this crate
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Held until exit so buffered log lines reach the file
  let _log_guard = logging::init(&config.log_dir, args.verbose)?;

  let ctx = commands::Context {
    config,
    no_cache: args.no_cache,
  };
  commands::run(args.command, &ctx).await
}
