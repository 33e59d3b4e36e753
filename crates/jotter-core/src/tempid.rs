//! Placeholder identifiers for entities that do not exist yet.
//!
//! A batch refers to not-yet-committed entities by negative placeholder ids.
//! The store replaces them with permanent ids at commit and rewrites every
//! reference in the batch to match. Placeholders mean nothing outside the
//! batch that allocated them.
//!
//! The negative id space is split into one fixed window per [`Partition`].
//! Each partition counts down inside its own window, so ids handed out by
//! independent loops (notes, tags) can never collide.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Width of each partition's window.
const WINDOW: i64 = 1_000_000;

/// The classes of object that receive placeholders.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
  strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Partition {
  /// Notes, whether imported or submitted through the form.
  Note,
  /// Tags named in a form submission or edit.
  FormTag,
  /// Tags named by a bulk import.
  ImportTag,
}

impl Partition {
  fn ordinal(self) -> i64 {
    match self {
      Self::Note => 0,
      Self::FormTag => 1,
      Self::ImportTag => 2,
    }
  }

  /// The first placeholder this partition hands out.
  pub fn first(self) -> i64 { -(self.ordinal() * WINDOW) - 1 }

  /// The last placeholder this partition may hand out.
  pub fn last(self) -> i64 { -((self.ordinal() + 1) * WINDOW) }

  pub fn contains(self, raw: i64) -> bool { (self.last()..=self.first()).contains(&raw) }
}

/// A batch-local placeholder for an entity. Always negative.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TempId(i64);

impl TempId {
  pub fn get(self) -> i64 { self.0 }

  /// The partition whose window holds this placeholder.
  pub fn partition(self) -> Option<Partition> {
    use strum::IntoEnumIterator as _;
    Partition::iter().find(|p| p.contains(self.0))
  }
}

impl std::fmt::Display for TempId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Allocates placeholders for one batch. Create a fresh instance per import
/// run or write request; never share one between batches.
#[derive(Debug, Default)]
pub struct TempIds {
  /// How many ids each partition has handed out, indexed by ordinal.
  issued: [i64; 3],
}

impl TempIds {
  pub fn new() -> Self { Self::default() }

  /// Allocate the next placeholder in `partition`.
  pub fn next(&mut self, partition: Partition) -> Result<TempId> {
    let slot = &mut self.issued[partition.ordinal() as usize];
    if *slot >= WINDOW {
      return Err(Error::PlaceholderSpaceExhausted(partition));
    }
    let id = partition.first() - *slot;
    *slot += 1;
    Ok(TempId(id))
  }

  /// How many placeholders `partition` has handed out so far.
  pub fn issued(&self, partition: Partition) -> usize {
    self.issued[partition.ordinal() as usize] as usize
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use strum::IntoEnumIterator as _;

  use super::*;

  #[test]
  fn partitions_start_at_their_bases() {
    let mut ids = TempIds::new();
    assert_eq!(ids.next(Partition::Note).unwrap().get(), -1);
    assert_eq!(ids.next(Partition::Note).unwrap().get(), -2);
    assert_eq!(ids.next(Partition::FormTag).unwrap().get(), -1_000_001);
    assert_eq!(ids.next(Partition::ImportTag).unwrap().get(), -2_000_001);
    assert_eq!(ids.next(Partition::ImportTag).unwrap().get(), -2_000_002);
  }

  #[test]
  fn windows_do_not_overlap() {
    let parts: Vec<_> = Partition::iter().collect();
    for (i, a) in parts.iter().enumerate() {
      assert!(a.first() < 0);
      assert!(a.last() < a.first());
      for b in &parts[i + 1..] {
        assert!(a.last() > b.first(), "{a} overlaps {b}");
      }
    }
  }

  #[test]
  fn interleaved_allocation_never_collides() {
    let mut ids = TempIds::new();
    let mut seen = HashSet::new();
    let order = [
      Partition::Note,
      Partition::ImportTag,
      Partition::Note,
      Partition::FormTag,
      Partition::ImportTag,
      Partition::Note,
    ];
    for round in 0..500 {
      let p = order[round % order.len()];
      let id = ids.next(p).unwrap();
      assert_eq!(id.partition(), Some(p));
      assert!(seen.insert(id), "duplicate placeholder {id}");
    }
    assert_eq!(ids.issued(Partition::Note), 250);
  }

  #[test]
  fn exhausted_window_is_an_error() {
    let mut ids = TempIds::new();
    ids.issued[Partition::FormTag.ordinal() as usize] = WINDOW - 1;
    let last = ids.next(Partition::FormTag).unwrap();
    assert_eq!(last.get(), Partition::FormTag.last());
    assert!(matches!(
      ids.next(Partition::FormTag),
      Err(Error::PlaceholderSpaceExhausted(Partition::FormTag))
    ));
    // Other partitions are unaffected.
    assert_eq!(ids.next(Partition::Note).unwrap().get(), -1);
  }
}
