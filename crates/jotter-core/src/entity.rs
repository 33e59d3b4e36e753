//! [`Entity`] — the store's handle onto everything currently asserted about
//! one entity.

use std::collections::BTreeMap;

use crate::datom::{EntityId, Keyword, Value};

/// The current attribute values of one entity, keyed by attribute name.
/// Cardinality-one attributes hold a single value; cardinality-many
/// attributes hold their values in [`Value`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
  pub id:    EntityId,
  pub attrs: BTreeMap<Keyword, Vec<Value>>,
}

impl Entity {
  pub fn new(id: EntityId) -> Self { Self { id, attrs: BTreeMap::new() } }

  /// Record `value` under `attr`, keeping values sorted and distinct.
  pub fn insert(&mut self, attr: Keyword, value: Value) {
    let values = self.attrs.entry(attr).or_default();
    if let Err(pos) = values.binary_search(&value) {
      values.insert(pos, value);
    }
  }

  /// All current values of `attr`; empty when the attribute is absent.
  pub fn get(&self, attr: &Keyword) -> &[Value] {
    self.attrs.get(attr).map(Vec::as_slice).unwrap_or_default()
  }

  /// The single value of a cardinality-one attribute.
  pub fn first(&self, attr: &Keyword) -> Option<&Value> { self.get(attr).first() }

  pub fn is_empty(&self) -> bool { self.attrs.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::{NOTE_TAGS, NOTE_TITLE, NOTE_URL};

  #[test]
  fn insert_keeps_values_sorted_and_distinct() {
    let mut e = Entity::new(EntityId(1));
    e.insert(NOTE_TAGS, Value::Ref(EntityId(9)));
    e.insert(NOTE_TAGS, Value::Ref(EntityId(3)));
    e.insert(NOTE_TAGS, Value::Ref(EntityId(9)));
    assert_eq!(e.get(&NOTE_TAGS), [Value::Ref(EntityId(3)), Value::Ref(EntityId(9))]);
  }

  #[test]
  fn absent_attribute_is_empty() {
    let mut e = Entity::new(EntityId(1));
    e.insert(NOTE_TITLE, "hello".into());
    assert!(e.get(&NOTE_URL).is_empty());
    assert_eq!(e.first(&NOTE_URL), None);
    assert_eq!(e.first(&NOTE_TITLE), Some(&Value::Str("hello".into())));
  }
}
