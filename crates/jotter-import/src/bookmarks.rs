//! Bookmark import from a Pinboard-style XML export.
//!
//! ```xml
//! <posts user="someone">
//!   <post href="https://…" description="Title" extended="Notes"
//!         time="2014-03-02T10:11:12Z" tag="rust tools"/>
//! </posts>
//! ```

use chrono::{DateTime, Utc};
use jotter_core::batch::NewNote;
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct Posts {
  #[serde(rename = "post", default)]
  posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
  #[serde(rename = "@href", default)]
  href:        String,
  #[serde(rename = "@description", default)]
  description: String,
  #[serde(rename = "@extended", default)]
  extended:    String,
  #[serde(rename = "@time")]
  time:        String,
  #[serde(rename = "@tag", default)]
  tag:         String,
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(raw)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::InvalidDate { value: raw.to_owned(), reason: e.to_string() })
}

/// Parse a bookmark export into notes, in file order.
pub fn parse_bookmarks(input: &str) -> Result<Vec<NewNote>> {
  let posts: Posts = quick_xml::de::from_str(input)?;
  posts
    .posts
    .into_iter()
    .map(|p| {
      Ok(NewNote::with_tag_field(
        p.description,
        p.extended,
        parse_time(&p.time)?,
        Some(p.href).filter(|u| !u.is_empty()),
        &p.tag,
      ))
    })
    .collect()
}
