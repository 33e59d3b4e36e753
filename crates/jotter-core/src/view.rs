//! Typed read models rebuilt from store entities.
//!
//! A [`NoteView`] is validated once, when it is materialised: mandatory
//! attributes must be present and every value must have the declared shape.
//! After that its accessors cannot fail.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::{
  Error,
  datom::{EntityId, Keyword, Value},
  entity::Entity,
  schema::{NOTE_CONTENT, NOTE_DATE, NOTE_ID, NOTE_TAGS, NOTE_TITLE, NOTE_URL, TAG_NAME, ValueType},
  store::FactStore,
};

/// A tag attached to a note. Serialises as its bare name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TagView {
  pub name:   String,
  pub entity: EntityId,
}

impl Serialize for TagView {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.name)
  }
}

/// The current state of one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteView {
  #[serde(skip)]
  entity:  EntityId,
  id:      String,
  title:   String,
  content: String,
  date:    DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  url:     Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  tags:    Vec<TagView>,
}

impl NoteView {
  /// Build a view of `entity`, resolving its tag references through `store`.
  pub async fn materialize<S: FactStore>(store: &S, entity: &Entity) -> Result<Self, S::Error> {
    let mut tags = Vec::new();
    for value in entity.get(&NOTE_TAGS) {
      let Value::Ref(target) = value else {
        return Err(unexpected(entity.id, &NOTE_TAGS, ValueType::Ref, value).into());
      };
      let Some(tag) = store.entity(*target).await? else {
        return Err(
          Error::DanglingRef { entity: entity.id, attr: NOTE_TAGS, target: *target }.into(),
        );
      };
      tags.push(TagView { name: required_str(&tag, &TAG_NAME)?, entity: tag.id });
    }
    tags.sort();

    Ok(Self {
      entity: entity.id,
      id: required_str(entity, &NOTE_ID)?,
      title: required_str(entity, &NOTE_TITLE)?,
      content: required_str(entity, &NOTE_CONTENT)?,
      date: required_instant(entity, &NOTE_DATE)?,
      url: optional_str(entity, &NOTE_URL)?,
      tags,
    })
  }

  pub fn entity(&self) -> EntityId { self.entity }

  pub fn id(&self) -> &str { &self.id }

  pub fn title(&self) -> &str { &self.title }

  pub fn content(&self) -> &str { &self.content }

  pub fn date(&self) -> DateTime<Utc> { self.date }

  pub fn url(&self) -> Option<&str> { self.url.as_deref() }

  pub fn tags(&self) -> &[TagView] { &self.tags }

  /// Tag names in sorted order.
  pub fn tag_names(&self) -> impl Iterator<Item = &str> { self.tags.iter().map(|t| t.name.as_str()) }
}

// ─── Attribute accessors ─────────────────────────────────────────────────────

pub(crate) fn unexpected(entity: EntityId, attr: &Keyword, expected: ValueType, found: &Value) -> Error {
  Error::UnexpectedValue { entity, attr: attr.clone(), expected, found: found.value_type() }
}

fn optional_str(entity: &Entity, attr: &Keyword) -> Result<Option<String>, Error> {
  match entity.first(attr) {
    None => Ok(None),
    Some(Value::Str(s)) => Ok(Some(s.clone())),
    Some(other @ (Value::Instant(_) | Value::Ref(_))) => {
      Err(unexpected(entity.id, attr, ValueType::String, other))
    }
  }
}

fn required_str(entity: &Entity, attr: &Keyword) -> Result<String, Error> {
  optional_str(entity, attr)?
    .ok_or_else(|| Error::MissingAttribute { entity: entity.id, attr: attr.clone() })
}

fn required_instant(entity: &Entity, attr: &Keyword) -> Result<DateTime<Utc>, Error> {
  match entity.first(attr) {
    None => Err(Error::MissingAttribute { entity: entity.id, attr: attr.clone() }),
    Some(Value::Instant(dt)) => Ok(*dt),
    Some(other @ (Value::Str(_) | Value::Ref(_))) => {
      Err(unexpected(entity.id, attr, ValueType::Instant, other))
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  fn note(url: Option<&str>, tags: &[&str]) -> NoteView {
    NoteView {
      entity:  EntityId(1),
      id:      "0a1b2c3d4e".into(),
      title:   "t".into(),
      content: "c".into(),
      date:    Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
      url:     url.map(str::to_owned),
      tags:    tags
        .iter()
        .enumerate()
        .map(|(i, n)| TagView { name: (*n).to_owned(), entity: EntityId(i as i64 + 10) })
        .collect(),
    }
  }

  #[test]
  fn bare_note_omits_url_and_tags() {
    let json = serde_json::to_value(note(None, &[])).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "id": "0a1b2c3d4e",
        "title": "t",
        "content": "c",
        "date": "2024-05-06T07:08:09Z",
      })
    );
  }

  #[test]
  fn tags_serialize_as_names() {
    let json = serde_json::to_value(note(Some("https://x.test"), &["a", "b"])).unwrap();
    assert_eq!(json["url"], "https://x.test");
    assert_eq!(json["tags"], serde_json::json!(["a", "b"]));
    assert!(json.get("entity").is_none());
  }

  #[test]
  fn wrong_shape_is_reported() {
    let mut e = Entity::new(EntityId(3));
    e.insert(NOTE_TITLE, Value::Ref(EntityId(4)));
    assert!(matches!(
      required_str(&e, &NOTE_TITLE),
      Err(Error::UnexpectedValue { expected: ValueType::String, found: ValueType::Ref, .. })
    ));
    assert!(matches!(
      required_instant(&e, &NOTE_DATE),
      Err(Error::MissingAttribute { entity: EntityId(3), .. })
    ));
    assert_eq!(optional_str(&e, &NOTE_URL).unwrap(), None);
  }
}
