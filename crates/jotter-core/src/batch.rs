//! Fact batches: the ordered assertions that make up one transaction.
//!
//! A [`BatchBuilder`] owns the placeholder allocator and tag resolver for a
//! single import run or write request. It turns domain objects ([`NewNote`],
//! [`NoteEdit`]) into [`TxDatum`]s; [`commit`] hands the finished [`Batch`] to
//! the store as one atomic transaction.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore as _};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  Result,
  datom::{EntityId, Keyword},
  schema::{NOTE_CONTENT, NOTE_DATE, NOTE_ID, NOTE_TAGS, NOTE_TITLE, NOTE_URL, TAG_NAME},
  store::{FactStore, TxReport},
  tags::{TagResolver, split_tags},
  tempid::{Partition, TempId, TempIds},
};

/// Number of random bytes behind a `note/id`.
const NOTE_ID_BYTES: usize = 5;

// ─── Batch contents ──────────────────────────────────────────────────────────

/// The entity position of a pending datom: a placeholder for an entity the
/// batch creates, or the id of one that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
  Temp(TempId),
  Id(EntityId),
}

impl From<TempId> for EntityRef {
  fn from(t: TempId) -> Self { Self::Temp(t) }
}

impl From<EntityId> for EntityRef {
  fn from(id: EntityId) -> Self { Self::Id(id) }
}

/// A value awaiting commit. Mirrors [`Value`](crate::datom::Value), except
/// that references may still point at placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TxValue {
  Str(String),
  Instant(DateTime<Utc>),
  Ref(EntityRef),
}

/// One assertion in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxDatum {
  pub e: EntityRef,
  pub a: Keyword,
  pub v: TxValue,
}

/// An ordered list of assertions committed together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
  datoms: Vec<TxDatum>,
}

impl Batch {
  pub fn new() -> Self { Self::default() }

  pub fn push(&mut self, e: impl Into<EntityRef>, a: Keyword, v: TxValue) {
    self.datoms.push(TxDatum { e: e.into(), a, v });
  }

  pub fn len(&self) -> usize { self.datoms.len() }

  pub fn is_empty(&self) -> bool { self.datoms.is_empty() }

  pub fn iter(&self) -> std::slice::Iter<'_, TxDatum> { self.datoms.iter() }
}

impl IntoIterator for Batch {
  type Item = TxDatum;
  type IntoIter = std::vec::IntoIter<TxDatum>;

  fn into_iter(self) -> Self::IntoIter { self.datoms.into_iter() }
}

impl<'a> IntoIterator for &'a Batch {
  type Item = &'a TxDatum;
  type IntoIter = std::slice::Iter<'a, TxDatum>;

  fn into_iter(self) -> Self::IntoIter { self.datoms.iter() }
}

// ─── Domain input ────────────────────────────────────────────────────────────

/// A note to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
  pub title:   String,
  pub content: String,
  pub date:    DateTime<Utc>,
  /// Ignored when empty.
  pub url:     Option<String>,
  /// Tag names. Blank entries are skipped.
  pub tags:    Vec<String>,
}

impl NewNote {
  /// A note with tags given as one whitespace-separated field, the way web
  /// forms and bookmark exports carry them.
  pub fn with_tag_field(
    title: impl Into<String>,
    content: impl Into<String>,
    date: DateTime<Utc>,
    url: Option<String>,
    tag_field: &str,
  ) -> Self {
    Self {
      title: title.into(),
      content: content.into(),
      date,
      url,
      tags: split_tags(tag_field).map(str::to_owned).collect(),
    }
  }
}

/// Changes to an existing note. `None` leaves an attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteEdit {
  pub title:    Option<String>,
  pub content:  Option<String>,
  pub url:      Option<String>,
  /// Tags to add. Existing tags are kept.
  pub add_tags: Vec<String>,
}

impl NoteEdit {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.content.is_none()
      && self.url.as_deref().is_none_or(str::is_empty)
      && self.add_tags.iter().all(|t| t.trim().is_empty())
  }
}

/// Placeholder and external id of a note added to a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedNote {
  pub temp:    TempId,
  pub note_id: String,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Assembles one batch. Create one per import run or write request.
#[derive(Debug)]
pub struct BatchBuilder {
  ids:   TempIds,
  tags:  TagResolver,
  batch: Batch,
}

impl BatchBuilder {
  fn new(tag_partition: Partition) -> Self {
    Self {
      ids:   TempIds::new(),
      tags:  TagResolver::new(tag_partition),
      batch: Batch::new(),
    }
  }

  /// A builder for bulk imports; new tags come from the import partition.
  pub fn for_import() -> Self { Self::new(Partition::ImportTag) }

  /// A builder for single writes from the web form.
  pub fn for_form() -> Self { Self::new(Partition::FormTag) }

  /// Reuse these existing tag entities instead of creating new ones.
  pub fn with_known_tags(
    mut self,
    known: impl IntoIterator<Item = (String, EntityId)>,
  ) -> Self {
    self.tags = self.tags.with_known(known);
    self
  }

  /// Add a new note with a freshly generated `note/id`.
  pub fn add_note(&mut self, note: NewNote) -> Result<CreatedNote> {
    let temp = self.ids.next(Partition::Note)?;
    let note_id = generate_note_id()?;

    self.batch.push(temp, NOTE_ID, TxValue::Str(note_id.clone()));
    self.batch.push(temp, NOTE_TITLE, TxValue::Str(note.title));
    self.batch.push(temp, NOTE_CONTENT, TxValue::Str(note.content));
    self.batch.push(temp, NOTE_DATE, TxValue::Instant(note.date));
    if let Some(url) = note.url.filter(|u| !u.is_empty()) {
      self.batch.push(temp, NOTE_URL, TxValue::Str(url));
    }
    self.push_tags(temp.into(), &note.tags)?;

    Ok(CreatedNote { temp, note_id })
  }

  /// Append assertions for the supplied fields of an existing note.
  pub fn edit_note(&mut self, entity: EntityId, edit: NoteEdit) -> Result<()> {
    if let Some(title) = edit.title {
      self.batch.push(entity, NOTE_TITLE, TxValue::Str(title));
    }
    if let Some(content) = edit.content {
      self.batch.push(entity, NOTE_CONTENT, TxValue::Str(content));
    }
    if let Some(url) = edit.url.filter(|u| !u.is_empty()) {
      self.batch.push(entity, NOTE_URL, TxValue::Str(url));
    }
    self.push_tags(entity.into(), &edit.add_tags)
  }

  fn push_tags(&mut self, note: EntityRef, names: &[String]) -> Result<()> {
    for name in names.iter().flat_map(|n| split_tags(n)) {
      let Some(tag) = self.tags.resolve(&mut self.ids, name)? else {
        continue;
      };
      self.batch.push(note, NOTE_TAGS, TxValue::Ref(tag.entity));
      if tag.assert_name {
        self.batch.push(tag.entity, TAG_NAME, TxValue::Str(name.to_owned()));
      }
    }
    Ok(())
  }

  /// Placeholders handed out so far in `partition`.
  pub fn issued(&self, partition: Partition) -> usize { self.ids.issued(partition) }

  pub fn finish(self) -> Batch { self.batch }
}

/// A new external note identifier: lowercase hex of five random bytes.
pub fn generate_note_id() -> Result<String> {
  let mut bytes = [0u8; NOTE_ID_BYTES];
  OsRng.try_fill_bytes(&mut bytes)?;
  Ok(hex::encode(bytes))
}

/// Submit `batch` to `store` as a single transaction.
pub async fn commit<S: FactStore>(store: &S, batch: Batch) -> Result<TxReport, S::Error> {
  let submitted = batch.len();
  let report = store.transact(batch).await?;
  info!(tx = %report.tx, submitted, written = report.fact_count, "committed batch");
  Ok(report)
}
