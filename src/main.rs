mod app;
mod cache;
mod camara;
mod commands;
mod config;
mod detail;
mod event;
mod filters;
mod pagination;
mod query;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "c9s")]
#[command(about = "A terminal UI for Brazilian parliamentary transparency data, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/c9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Base URL of the transparency API
  #[arg(short, long)]
  api_url: Option<String>,
}

/// Log to a file; the terminal belongs to the TUI.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("c9s");
  std::fs::create_dir_all(&dir)?;

  let appender = tracing_appender::rolling::never(&dir, "c9s.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_env("C9S_LOG").unwrap_or_else(|_| EnvFilter::new("c9s=info")),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_tracing()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override the API base URL if specified on the command line
  let config = if let Some(api_url) = args.api_url {
    config::Config {
      api: config::ApiConfig { base_url: api_url },
      ..config
    }
  } else {
    config
  };

  tracing::info!(base_url = %config.api.base_url, "starting c9s");

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
