//! Tag name deduplication within one batch.
//!
//! A note's tags arrive as free text. Within a batch every distinct name maps
//! to exactly one entity reference, and `tag/name` is asserted for it at most
//! once no matter how many notes mention it.

use std::collections::HashMap;

use crate::{
  Result,
  batch::EntityRef,
  datom::EntityId,
  tempid::{Partition, TempIds},
};

/// Split a raw tag field into tag names. Blank input yields nothing.
pub fn split_tags(raw: &str) -> impl Iterator<Item = &str> { raw.split_whitespace() }

/// The outcome of resolving one tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTag {
  pub entity:      EntityRef,
  /// `true` exactly once per new name: the caller must assert `tag/name`.
  pub assert_name: bool,
}

/// Maps tag names to entity references for one batch.
#[derive(Debug)]
pub struct TagResolver {
  partition: Partition,
  /// Tags that already exist in the store.
  known:     HashMap<String, EntityId>,
  /// Placeholders allocated by this batch.
  pending:   HashMap<String, EntityRef>,
}

impl TagResolver {
  /// A resolver that allocates new tag placeholders from `partition`.
  pub fn new(partition: Partition) -> Self {
    Self { partition, known: HashMap::new(), pending: HashMap::new() }
  }

  /// Seed the resolver with tags already committed to the store, in entity
  /// order. When a name occurs more than once the first entity wins.
  pub fn with_known(
    mut self,
    known: impl IntoIterator<Item = (String, EntityId)>,
  ) -> Self {
    for (name, id) in known {
      self.known.entry(name).or_insert(id);
    }
    self
  }

  /// Resolve `name` to an entity reference, allocating a placeholder from
  /// `ids` the first time a new name is seen. Empty names resolve to `None`.
  pub fn resolve(&mut self, ids: &mut TempIds, name: &str) -> Result<Option<ResolvedTag>> {
    if name.is_empty() {
      return Ok(None);
    }
    if let Some(&id) = self.known.get(name) {
      return Ok(Some(ResolvedTag { entity: EntityRef::Id(id), assert_name: false }));
    }
    if let Some(&entity) = self.pending.get(name) {
      return Ok(Some(ResolvedTag { entity, assert_name: false }));
    }

    let entity = EntityRef::Temp(ids.next(self.partition)?);
    self.pending.insert(name.to_owned(), entity);
    Ok(Some(ResolvedTag { entity, assert_name: true }))
  }

  /// Number of new tags this batch introduces.
  pub fn new_tag_count(&self) -> usize { self.pending.len() }
}
