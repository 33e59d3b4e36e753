//! jotter server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), creates the
//! SQLite store on first run, and either serves the JSON API over HTTP or
//! runs a one-off bulk import.
//!
//! ```text
//! jotter serve
//! jotter import dir ~/notes
//! jotter import json export.json
//! jotter import bookmarks pinboard.xml
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use jotter_core::{query::require_attribute, schema::NOTE_ID};
use jotter_server::{AppState, ServerConfig};
use jotter_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Jotter notes server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API.
  Serve,
  /// Import notes in bulk.
  Import {
    #[command(subcommand)]
    source: ImportSource,
  },
}

#[derive(Subcommand)]
enum ImportSource {
  /// Every regular file in a directory.
  Dir { path: PathBuf },
  /// A JSON export: an array of `{id, title, content, created}`.
  Json { path: PathBuf },
  /// A Pinboard-style XML bookmark export.
  Bookmarks { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("JOTTER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Create the database on first run, then connect.
  let created = SqliteStore::create_database(&store_path)
    .await
    .with_context(|| format!("failed to create store at {store_path:?}"))?;
  if created {
    tracing::info!(path = ?store_path, "created new store");
  }
  let store = SqliteStore::connect(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  require_attribute(&store, &NOTE_ID)
    .await
    .context("store schema is not installed")?;

  match cli.command {
    Command::Serve => serve(store, server_cfg).await,
    Command::Import { source } => {
      let facts = match &source {
        ImportSource::Dir { path } => jotter_import::import_directory(&store, path).await,
        ImportSource::Json { path } => jotter_import::import_json(&store, path).await,
        ImportSource::Bookmarks { path } => jotter_import::import_bookmarks(&store, path).await,
      }
      .context("import failed")?;
      println!("added {facts} facts");
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let address = server_cfg.address();
  let state = AppState { store: Arc::new(store), config: Arc::new(server_cfg) };
  let app = jotter_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
