//! The attribute schema for notes and tags.
//!
//! The store installs [`CORE_SCHEMA`] when a database is created. Every
//! query resolves the attributes it needs by name; a missing one means the
//! database was never bootstrapped.

use serde::{Deserialize, Serialize};

use crate::datom::Keyword;

// ─── Attribute names ─────────────────────────────────────────────────────────

/// The external, user-facing note identifier. Independent of entity ids.
pub const NOTE_ID: Keyword = Keyword::from_static("note/id");
pub const NOTE_TITLE: Keyword = Keyword::from_static("note/title");
pub const NOTE_CONTENT: Keyword = Keyword::from_static("note/content");
/// Creation time, or file modification time for directory imports.
pub const NOTE_DATE: Keyword = Keyword::from_static("note/date");
pub const NOTE_URL: Keyword = Keyword::from_static("note/url");
pub const NOTE_TAGS: Keyword = Keyword::from_static("note/tags");
pub const TAG_NAME: Keyword = Keyword::from_static("tag/name");

// ─── Attribute definitions ───────────────────────────────────────────────────

/// The shape of values an attribute accepts.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
  String,
  Instant,
  Ref,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Cardinality {
  /// Asserting a new value replaces the current one.
  One,
  /// Values accumulate as a set.
  Many,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
  pub ident:       Keyword,
  pub value_type:  ValueType,
  pub cardinality: Cardinality,
  /// At most one entity may hold a given value.
  pub unique:      bool,
}

impl AttributeDef {
  const fn one(ident: Keyword, value_type: ValueType) -> Self {
    Self { ident, value_type, cardinality: Cardinality::One, unique: false }
  }
}

pub static CORE_SCHEMA: &[AttributeDef] = &[
  AttributeDef {
    ident:       NOTE_ID,
    value_type:  ValueType::String,
    cardinality: Cardinality::One,
    unique:      true,
  },
  AttributeDef::one(NOTE_TITLE, ValueType::String),
  AttributeDef::one(NOTE_CONTENT, ValueType::String),
  AttributeDef::one(NOTE_DATE, ValueType::Instant),
  AttributeDef::one(NOTE_URL, ValueType::String),
  AttributeDef {
    ident:       NOTE_TAGS,
    value_type:  ValueType::Ref,
    cardinality: Cardinality::Many,
    unique:      false,
  },
  // Tag names are unique by convention only; duplicates resolve to the
  // lowest entity id.
  AttributeDef::one(TAG_NAME, ValueType::String),
];

/// Look up a core attribute definition by name.
pub fn core_attribute(ident: &Keyword) -> Option<&'static AttributeDef> {
  CORE_SCHEMA.iter().find(|def| &def.ident == ident)
}
