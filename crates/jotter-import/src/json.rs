//! JSON import: a top-level array of exported notes.
//!
//! ```json
//! [{ "id": "17", "title": "…", "content": "…", "created": "2015-04-01T12:00:00Z" }]
//! ```
//!
//! The exported `id` is ignored; every imported note gets a fresh `note/id`.
//! `url` and `tags` are optional. Tags may be an array or one
//! space-separated string.

use chrono::{DateTime, Utc};
use jotter_core::{batch::NewNote, tags::split_tags};
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagField {
  List(Vec<String>),
  Joined(String),
}

impl Default for TagField {
  fn default() -> Self { Self::List(Vec::new()) }
}

impl TagField {
  fn into_names(self) -> Vec<String> {
    match self {
      Self::List(names) => names.iter().flat_map(|n| split_tags(n)).map(str::to_owned).collect(),
      Self::Joined(field) => split_tags(&field).map(str::to_owned).collect(),
    }
  }
}

#[derive(Debug, Deserialize)]
struct ExportedNote {
  title:   String,
  content: String,
  created: DateTime<Utc>,
  #[serde(default)]
  url:     Option<String>,
  #[serde(default)]
  tags:    TagField,
}

/// Parse a JSON export into notes, in file order.
pub fn parse_json(input: &str) -> Result<Vec<NewNote>> {
  let exported: Vec<ExportedNote> = serde_json::from_str(input)?;
  Ok(
    exported
      .into_iter()
      .map(|n| NewNote {
        title:   n.title,
        content: n.content,
        date:    n.created,
        url:     n.url.filter(|u| !u.is_empty()),
        tags:    n.tags.into_names(),
      })
      .collect(),
  )
}
