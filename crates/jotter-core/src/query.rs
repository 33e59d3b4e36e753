//! The query planner.
//!
//! Each access pattern lowers to a [`ScanPlan`]: an index ordering plus an
//! inclusive lower and upper [`DatomBound`]. The [`plan`] module builds the
//! bounds; the executors below run them through a [`FactStore`], materialise
//! the hits as [`NoteView`]s and apply ordering and truncation.

use std::{cmp::Ordering, collections::BTreeSet};

use tracing::debug;

use crate::{
  Error,
  datom::{AttrId, Datom, DatomBound, EntityId, IndexOrdering, Keyword, Value},
  schema::{NOTE_DATE, NOTE_ID, NOTE_TAGS, NOTE_TITLE, TAG_NAME, ValueType},
  store::FactStore,
  view::{NoteView, unexpected},
};

/// Page size used when a caller does not ask for one.
pub const DEFAULT_LIMIT: usize = 100;

// ─── Scan plan ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
  pub index: IndexOrdering,
  pub lower: DatomBound,
  pub upper: DatomBound,
}

impl ScanPlan {
  /// Whether `datom` lies within the plan's bounds under its ordering.
  pub fn contains(&self, datom: &Datom) -> bool {
    let at = DatomBound::at(datom);
    self.index.compare(&self.lower, &at) != Ordering::Greater
      && self.index.compare(&at, &self.upper) != Ordering::Greater
  }

  /// The attribute both bounds pin, if any.
  pub fn pinned_attribute(&self) -> Option<AttrId> {
    match (self.lower.a.value(), self.upper.a.value()) {
      (Some(l), Some(u)) if l == u => Some(*l),
      _ => None,
    }
  }

  /// The value both bounds pin, if any.
  pub fn pinned_value(&self) -> Option<&Value> {
    match (self.lower.v.value(), self.upper.v.value()) {
      (Some(l), Some(u)) if l == u => Some(l),
      _ => None,
    }
  }

  /// Sort `datoms` into this plan's index order.
  pub fn sort(&self, datoms: &mut [Datom]) {
    datoms.sort_by(|l, r| self.index.compare_datoms(l, r));
  }
}

/// Bound builders, one per access pattern.
pub mod plan {
  use super::{AttrId, DatomBound, EntityId, IndexOrdering, ScanPlan, Value};
  use crate::datom::{Edge, TxId};

  fn bound(e: Edge<EntityId>, a: AttrId, v: Edge<Value>, tx: Edge<TxId>) -> DatomBound {
    DatomBound { e, a: Edge::At(a), v, tx }
  }

  /// The note holding `id` as its `note/id`.
  pub fn note_by_id(attr: AttrId, id: &str) -> ScanPlan {
    let v = Edge::At(Value::Str(id.to_owned()));
    ScanPlan {
      index: IndexOrdering::Avet,
      lower: bound(Edge::Min, attr, v.clone(), Edge::Min),
      upper: bound(Edge::Max, attr, v, Edge::Max),
    }
  }

  /// Every `note/date` datom, oldest first.
  ///
  /// The entity components are reversed (`Max` below, `Min` above); the
  /// value components alone already span the whole attribute.
  pub fn notes_by_date(attr: AttrId) -> ScanPlan {
    ScanPlan {
      index: IndexOrdering::Avet,
      lower: bound(Edge::Max, attr, Edge::Min, Edge::Min),
      upper: bound(Edge::Min, attr, Edge::Max, Edge::Max),
    }
  }

  /// Every `note/tags` datom pointing at `tag`.
  pub fn notes_by_tag(attr: AttrId, tag: EntityId) -> ScanPlan {
    let v = Edge::At(Value::Ref(tag));
    ScanPlan {
      index: IndexOrdering::Vaet,
      lower: bound(Edge::Min, attr, v.clone(), Edge::Max),
      upper: bound(Edge::Max, attr, v, Edge::Min),
    }
  }

  /// Every `note/title` datom, by entity.
  pub fn notes_by_title(attr: AttrId) -> ScanPlan {
    ScanPlan {
      index: IndexOrdering::Aevt,
      lower: bound(Edge::Min, attr, Edge::Min, Edge::Min),
      upper: bound(Edge::Max, attr, Edge::Max, Edge::Max),
    }
  }

  /// Every `tag/name` datom, by name.
  pub fn tag_names(attr: AttrId) -> ScanPlan {
    ScanPlan {
      index: IndexOrdering::Avet,
      lower: bound(Edge::Min, attr, Edge::Min, Edge::Min),
      upper: bound(Edge::Max, attr, Edge::Max, Edge::Max),
    }
  }
}

// ─── Executors ───────────────────────────────────────────────────────────────

/// Resolve a core attribute, treating its absence as an uninitialised store.
pub async fn require_attribute<S: FactStore>(
  store: &S,
  ident: &Keyword,
) -> Result<AttrId, S::Error> {
  match store.resolve_attribute(ident).await? {
    Some(id) => Ok(id),
    None => {
      tracing::error!(attr = %ident, "core attribute missing; store not initialised");
      Err(Error::SchemaNotInitialized(ident.clone()).into())
    }
  }
}

async fn run<S: FactStore>(store: &S, plan: &ScanPlan) -> Result<Vec<Datom>, S::Error> {
  debug!(index = %plan.index, attr = ?plan.pinned_attribute(), "scanning");
  store.scan(plan).await
}

async fn materialize_all<S: FactStore>(
  store: &S,
  ids: impl IntoIterator<Item = EntityId>,
) -> Result<Vec<NoteView>, S::Error> {
  let mut notes = Vec::new();
  for id in ids {
    if let Some(entity) = store.entity(id).await? {
      notes.push(NoteView::materialize(store, &entity).await?);
    }
  }
  Ok(notes)
}

/// Newest first, truncated to `n`.
fn newest_first(mut notes: Vec<NoteView>, n: usize) -> Vec<NoteView> {
  notes.sort_by(|l, r| r.date().cmp(&l.date()).then_with(|| r.entity().cmp(&l.entity())));
  notes.truncate(n);
  notes
}

/// Look up a note by its external id.
pub async fn find_note<S: FactStore>(store: &S, id: &str) -> Result<Option<NoteView>, S::Error> {
  let attr = require_attribute(store, &NOTE_ID).await?;
  let hits = run(store, &plan::note_by_id(attr, id)).await?;
  let Some(first) = hits.first() else {
    return Ok(None);
  };
  match store.entity(first.e).await? {
    Some(entity) => Ok(Some(NoteView::materialize(store, &entity).await?)),
    None => Ok(None),
  }
}

/// The `n` most recent notes, newest first.
pub async fn recent_notes<S: FactStore>(store: &S, n: usize) -> Result<Vec<NoteView>, S::Error> {
  let attr = require_attribute(store, &NOTE_DATE).await?;
  let hits = run(store, &plan::notes_by_date(attr)).await?;
  let ids: Vec<_> = hits.iter().rev().map(|d| d.e).take(n).collect();
  materialize_all(store, ids).await
}

/// Notes carrying the tag called `name`, newest first. An unknown tag yields
/// an empty list.
pub async fn notes_tagged<S: FactStore>(
  store: &S,
  name: &str,
  n: usize,
) -> Result<Vec<NoteView>, S::Error> {
  let tags = require_attribute(store, &NOTE_TAGS).await?;
  require_attribute(store, &TAG_NAME).await?;
  let Some(tag) = store.resolve_lookup_ref(&TAG_NAME, Value::Str(name.to_owned())).await? else {
    return Ok(Vec::new());
  };

  let hits = run(store, &plan::notes_by_tag(tags, tag)).await?;
  let ids: BTreeSet<_> = hits.iter().map(|d| d.e).collect();
  Ok(newest_first(materialize_all(store, ids).await?, n))
}

/// Notes whose title contains `query`, ignoring case. Newest first.
pub async fn search_notes<S: FactStore>(
  store: &S,
  query: &str,
  n: usize,
) -> Result<Vec<NoteView>, S::Error> {
  let attr = require_attribute(store, &NOTE_TITLE).await?;
  let needle = query.to_lowercase();
  let hits = run(store, &plan::notes_by_title(attr)).await?;

  let mut ids = Vec::new();
  for d in &hits {
    match &d.v {
      Value::Str(title) => {
        if title.to_lowercase().contains(&needle) {
          ids.push(d.e);
        }
      }
      other => return Err(unexpected(d.e, &NOTE_TITLE, ValueType::String, other).into()),
    }
  }
  Ok(newest_first(materialize_all(store, ids).await?, n))
}

/// Every tag name in the store, sorted and without duplicates.
pub async fn list_tags<S: FactStore>(store: &S) -> Result<Vec<String>, S::Error> {
  Ok(
    known_tags(store)
      .await?
      .into_iter()
      .map(|(name, _)| name)
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect(),
  )
}

/// Every `(name, entity)` pair for tags, ordered by name then entity, so the
/// first entry for a name is the one lookups resolve to.
pub async fn known_tags<S: FactStore>(store: &S) -> Result<Vec<(String, EntityId)>, S::Error> {
  let attr = require_attribute(store, &TAG_NAME).await?;
  let hits = run(store, &plan::tag_names(attr)).await?;
  hits
    .into_iter()
    .map(|d| match d.v {
      Value::Str(name) => Ok((name, d.e)),
      other => Err(S::Error::from(unexpected(d.e, &TAG_NAME, ValueType::String, &other))),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone as _, Utc};

  use super::*;
  use crate::datom::{Edge, TxId};

  const ATTR: AttrId = AttrId(3);

  fn datom(e: i64, a: AttrId, v: Value) -> Datom {
    Datom { e: EntityId(e), a, v, tx: TxId(1), added: true }
  }

  fn instant(day: u32) -> Value { Value::Instant(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()) }

  #[test]
  fn note_by_id_pins_the_value() {
    let p = plan::note_by_id(ATTR, "abc");
    assert_eq!(p.index, IndexOrdering::Avet);
    assert_eq!(p.pinned_attribute(), Some(ATTR));
    assert_eq!(p.pinned_value(), Some(&Value::Str("abc".into())));
    assert!(p.contains(&datom(1, ATTR, "abc".into())));
    assert!(p.contains(&datom(999, ATTR, "abc".into())));
    assert!(!p.contains(&datom(1, ATTR, "abd".into())));
    assert!(!p.contains(&datom(1, AttrId(4), "abc".into())));
  }

  #[test]
  fn date_plan_spans_every_date_despite_reversed_entities() {
    let p = plan::notes_by_date(ATTR);
    assert_eq!(p.lower.e, Edge::Max);
    assert_eq!(p.upper.e, Edge::Min);
    assert_eq!(p.pinned_value(), None);
    for (e, day) in [(1, 1), (50, 15), (2, 28)] {
      assert!(p.contains(&datom(e, ATTR, instant(day))));
    }
    assert!(!p.contains(&datom(1, AttrId(2), instant(1))));
  }

  #[test]
  fn date_plan_sorts_oldest_first() {
    let p = plan::notes_by_date(ATTR);
    let mut ds = vec![datom(1, ATTR, instant(9)), datom(2, ATTR, instant(3)), datom(3, ATTR, instant(5))];
    p.sort(&mut ds);
    let es: Vec<_> = ds.iter().map(|d| d.e.0).collect();
    assert_eq!(es, [2, 3, 1]);
  }

  #[test]
  fn tag_plan_uses_vaet_and_matches_only_that_tag() {
    let p = plan::notes_by_tag(ATTR, EntityId(77));
    assert_eq!(p.index, IndexOrdering::Vaet);
    assert_eq!(p.lower.tx, Edge::Max);
    assert_eq!(p.upper.tx, Edge::Min);
    assert!(p.contains(&datom(5, ATTR, Value::Ref(EntityId(77)))));
    assert!(!p.contains(&datom(5, ATTR, Value::Ref(EntityId(78)))));
  }

  #[test]
  fn title_and_tag_name_plans_span_the_attribute() {
    let title = plan::notes_by_title(ATTR);
    assert_eq!(title.index, IndexOrdering::Aevt);
    assert!(title.contains(&datom(1, ATTR, "".into())));
    assert!(title.contains(&datom(i64::MAX, ATTR, "zzz".into())));

    let names = plan::tag_names(ATTR);
    assert_eq!(names.index, IndexOrdering::Avet);
    assert_eq!(names.pinned_attribute(), Some(ATTR));
    assert!(!names.contains(&datom(1, AttrId(9), "x".into())));
  }
}
