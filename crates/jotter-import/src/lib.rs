//! Bulk importers for Jotter.
//!
//! Each source is parsed into [`NewNote`]s by a pure parser, then committed
//! through any [`FactStore`] as a single import batch. A malformed source
//! commits nothing.
//!
//! # Quick start
//!
//! ```no_run
//! # async fn run(store: &jotter_store_sqlite::SqliteStore) -> jotter_import::Result<()> {
//! let facts = jotter_import::import_json(store, "notes.json".as_ref()).await?;
//! println!("{facts} facts written");
//! # Ok(())
//! # }
//! ```

mod bookmarks;
mod directory;
pub mod error;
mod json;

use std::path::Path;

pub use bookmarks::parse_bookmarks;
pub use directory::{note_from_file, read_directory};
pub use error::{Error, Result};
use jotter_core::{
  batch::{BatchBuilder, NewNote, commit},
  query::known_tags,
  store::FactStore,
};
pub use json::parse_json;
use tracing::info;

fn store_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Store(Box::new(e))
}

async fn read_text(path: &Path) -> Result<String> {
  tokio::fs::read_to_string(path).await.map_err(|e| Error::io(path, e))
}

/// Commit `notes` as one import batch. Tags that already exist in the store
/// are reused; new ones are created once each. Returns the number of facts
/// written.
pub async fn import_notes<S: FactStore>(store: &S, notes: Vec<NewNote>) -> Result<usize> {
  if notes.is_empty() {
    return Ok(0);
  }
  let count = notes.len();

  let known = known_tags(store).await.map_err(store_err)?;
  let mut builder = BatchBuilder::for_import().with_known_tags(known);
  for note in notes {
    builder.add_note(note)?;
  }
  let report = commit(store, builder.finish()).await.map_err(store_err)?;

  info!(notes = count, facts = report.fact_count, "import complete");
  Ok(report.fact_count)
}

/// Import every regular file in `dir` as a note.
pub async fn import_directory<S: FactStore>(store: &S, dir: &Path) -> Result<usize> {
  let notes = read_directory(dir).await?;
  info!(path = %dir.display(), notes = notes.len(), "read directory");
  import_notes(store, notes).await
}

/// Import a JSON export.
pub async fn import_json<S: FactStore>(store: &S, path: &Path) -> Result<usize> {
  let notes = parse_json(&read_text(path).await?)?;
  info!(path = %path.display(), notes = notes.len(), "parsed JSON export");
  import_notes(store, notes).await
}

/// Import a bookmark-service XML export.
pub async fn import_bookmarks<S: FactStore>(store: &S, path: &Path) -> Result<usize> {
  let notes = parse_bookmarks(&read_text(path).await?)?;
  info!(path = %path.display(), notes = notes.len(), "parsed bookmark export");
  import_notes(store, notes).await
}
