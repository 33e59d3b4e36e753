//! Directory import: every regular file becomes one note.
//!
//! The title is the file name unless the first line reads `# <heading>`, in
//! which case the heading is the title and that line is dropped from the
//! content. The note is dated by the file's modification time.

use std::path::Path;

use chrono::{DateTime, Utc};
use jotter_core::batch::NewNote;

use crate::{Error, Result};

/// Build a note from one file's name, text and modification time.
pub fn note_from_file(file_name: &str, text: &str, modified: DateTime<Utc>) -> NewNote {
  let (title, content) = match text.split_once('\n') {
    Some((first, rest)) => match first.strip_prefix("# ") {
      Some(heading) if !heading.is_empty() => (heading.to_owned(), rest.to_owned()),
      _ => (file_name.to_owned(), text.to_owned()),
    },
    None => (file_name.to_owned(), text.to_owned()),
  };

  NewNote { title, content, date: modified, url: None, tags: Vec::new() }
}

/// Read every regular file directly inside `dir`, in file-name order.
/// Subdirectories are skipped; a file that is not valid UTF-8 fails the
/// whole read.
pub async fn read_directory(dir: &Path) -> Result<Vec<NewNote>> {
  let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| Error::io(dir, e))?;

  let mut files = Vec::new();
  while let Some(entry) = entries.next_entry().await.map_err(|e| Error::io(dir, e))? {
    let path = entry.path();
    let meta = tokio::fs::metadata(&path).await.map_err(|e| Error::io(&path, e))?;
    if meta.is_dir() {
      continue;
    }
    let modified = meta.modified().map_err(|e| Error::io(&path, e))?;
    files.push((entry.file_name(), path, DateTime::<Utc>::from(modified)));
  }
  files.sort_by(|l, r| l.0.cmp(&r.0));

  let mut notes = Vec::with_capacity(files.len());
  for (name, path, modified) in files {
    let bytes = tokio::fs::read(&path).await.map_err(|e| Error::io(&path, e))?;
    let text = String::from_utf8(bytes).map_err(|_| Error::Encoding { path: path.clone() })?;
    notes.push(note_from_file(&name.to_string_lossy(), &text, modified));
  }
  Ok(notes)
}
