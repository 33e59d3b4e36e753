//! Integration tests for `SqliteStore` and the query layer against an
//! in-memory database.

use chrono::{DateTime, Duration, TimeZone as _, Utc};
use jotter_core::{
  batch::{BatchBuilder, EntityRef, NewNote, NoteEdit, TxValue, commit},
  datom::{EntityId, Value},
  entity::Entity,
  query::{self, find_note, list_tags, notes_tagged, recent_notes, search_notes},
  schema::{NOTE_DATE, NOTE_ID, NOTE_TITLE, TAG_NAME},
  store::FactStore,
  view::NoteView,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn day(d: i64) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap() + Duration::days(d)
}

fn note(title: &str, date: DateTime<Utc>, tags: &[&str]) -> NewNote {
  NewNote {
    title:   title.into(),
    content: format!("{title} content"),
    date,
    url:     None,
    tags:    tags.iter().map(|t| (*t).to_owned()).collect(),
  }
}

/// Commit `notes` as one import batch and return their external ids.
async fn import(s: &SqliteStore, notes: Vec<NewNote>) -> Vec<String> {
  let mut b = BatchBuilder::for_import();
  let ids = notes
    .into_iter()
    .map(|n| b.add_note(n).unwrap().note_id)
    .collect();
  commit(s, b.finish()).await.unwrap();
  ids
}

fn titles(notes: &[NoteView]) -> Vec<&str> { notes.iter().map(NoteView::title).collect() }

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn core_attributes_resolve() {
  let s = store().await;
  for attr in [&NOTE_ID, &NOTE_TITLE, &NOTE_DATE, &TAG_NAME] {
    assert!(s.resolve_attribute(attr).await.unwrap().is_some(), "{attr} missing");
  }
  let unknown = jotter_core::datom::Keyword::parse("note/colour").unwrap();
  assert_eq!(s.resolve_attribute(&unknown).await.unwrap(), None);
}

#[tokio::test]
async fn install_schema_is_idempotent() {
  let s = store().await;
  assert!(!s.install_schema().await.unwrap());
}

#[tokio::test]
async fn uninitialised_store_reports_missing_schema() {
  let s = SqliteStore::connect_in_memory().await.unwrap();
  let err = recent_notes(&s, 10).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(jotter_core::Error::SchemaNotInitialized(ref k)) if *k == NOTE_DATE
  ));
}

#[tokio::test]
async fn create_database_then_connect() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("notes.db");

  assert!(SqliteStore::connect(&path).await.is_err());
  assert!(SqliteStore::create_database(&path).await.unwrap());
  assert!(!SqliteStore::create_database(&path).await.unwrap());

  let s = SqliteStore::connect(&path).await.unwrap();
  import(&s, vec![note("persisted", day(0), &[])]).await;

  let again = SqliteStore::connect(&path).await.unwrap();
  assert_eq!(titles(&recent_notes(&again, 10).await.unwrap()), ["persisted"]);
}

// ─── Writes ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn round_trip_by_id() {
  let s = store().await;
  let mut n = note("Hello", day(3), &["rust", "notes"]);
  n.url = Some("https://example.com/a".into());
  let ids = import(&s, vec![n]).await;

  let found = find_note(&s, &ids[0]).await.unwrap().unwrap();
  assert_eq!(found.id(), ids[0]);
  assert_eq!(found.title(), "Hello");
  assert_eq!(found.content(), "Hello content");
  assert_eq!(found.date(), day(3));
  assert_eq!(found.url(), Some("https://example.com/a"));
  assert_eq!(found.tag_names().collect::<Vec<_>>(), ["notes", "rust"]);
}

#[tokio::test]
async fn missing_note_is_none() {
  let s = store().await;
  import(&s, vec![note("a", day(0), &[])]).await;
  assert!(find_note(&s, "ffffffffff").await.unwrap().is_none());
}

#[tokio::test]
async fn tempids_resolve_to_distinct_entities() {
  let s = store().await;
  let mut b = BatchBuilder::for_import();
  let a = b.add_note(note("a", day(0), &["t"])).unwrap();
  let c = b.add_note(note("c", day(1), &["t"])).unwrap();
  let report = commit(&s, b.finish()).await.unwrap();

  let ea = report.resolve(a.temp).unwrap();
  let ec = report.resolve(c.temp).unwrap();
  assert_ne!(ea, ec);
  assert!(ea.0 > 0 && ec.0 > 0);
  // Two notes plus one shared tag.
  assert_eq!(report.tempids.len(), 3);
}

#[tokio::test]
async fn repeated_tag_creates_one_entity() {
  let s = store().await;
  import(&s, vec![
    note("one", day(0), &["shared"]),
    note("two", day(1), &["shared", "other"]),
    note("three", day(2), &["shared"]),
  ])
  .await;

  let attr = query::require_attribute(&s, &TAG_NAME).await.unwrap();
  let named = s.scan(&query::plan::tag_names(attr)).await.unwrap();
  let shared: Vec<_> = named.iter().filter(|d| d.v == Value::Str("shared".into())).collect();
  assert_eq!(shared.len(), 1);

  let tagged = notes_tagged(&s, "shared", 10).await.unwrap();
  assert_eq!(titles(&tagged), ["three", "two", "one"]);
}

#[tokio::test]
async fn blank_tags_create_no_tag_entities() {
  let s = store().await;
  let mut b = BatchBuilder::for_form();
  b.add_note(NewNote::with_tag_field("t", "c", day(0), None, "   ")).unwrap();
  let report = commit(&s, b.finish()).await.unwrap();

  assert_eq!(report.fact_count, 4);
  assert_eq!(report.tempids.len(), 1);
  assert!(list_tags(&s).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_batch_commits_nothing() {
  let s = store().await;
  let mut b = BatchBuilder::for_import();
  b.add_note(note("doomed", day(0), &["x"])).unwrap();
  let mut batch = b.finish();
  batch.push(EntityId(9999), NOTE_TITLE, TxValue::Str("nope".into()));

  let err = commit(&s, batch).await.unwrap_err();
  assert!(matches!(err, Error::EntityNotFound(EntityId(9999))));
  assert!(recent_notes(&s, 10).await.unwrap().is_empty());
  assert!(list_tags(&s).await.unwrap().is_empty());
}

#[tokio::test]
async fn wrong_value_type_is_rejected() {
  let s = store().await;
  let mut b = BatchBuilder::for_import();
  let created = b.add_note(note("n", day(0), &[])).unwrap();
  let mut batch = b.finish();
  batch.push(created.temp, NOTE_DATE, TxValue::Str("yesterday".into()));

  let err = commit(&s, batch).await.unwrap_err();
  assert!(matches!(err, Error::Core(jotter_core::Error::UnexpectedValue { .. })));
}

#[tokio::test]
async fn duplicate_note_id_is_rejected() {
  let s = store().await;
  let ids = import(&s, vec![note("first", day(0), &[])]).await;

  let mut b = BatchBuilder::for_import();
  let created = b.add_note(note("second", day(1), &[])).unwrap();
  let mut batch = b.finish();
  batch.push(created.temp, NOTE_ID, TxValue::Str(ids[0].clone()));

  let err = commit(&s, batch).await.unwrap_err();
  assert!(matches!(err, Error::UniqueConflict { .. }));
}

// ─── Edits ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn edit_replaces_title_and_adds_tags() {
  let s = store().await;
  let ids = import(&s, vec![note("Draft", day(0), &["old"])]).await;
  let before = find_note(&s, &ids[0]).await.unwrap().unwrap();

  let known = query::known_tags(&s).await.unwrap();
  let mut b = BatchBuilder::for_form().with_known_tags(known);
  b.edit_note(before.entity(), NoteEdit {
    title: Some("Final".into()),
    add_tags: vec!["old fresh".into()],
    ..NoteEdit::default()
  })
  .unwrap();
  let report = commit(&s, b.finish()).await.unwrap();
  // Retract + assert for the title, one membership, one new tag name. The
  // existing membership is redundant and skipped.
  assert_eq!(report.fact_count, 4);

  let after = find_note(&s, &ids[0]).await.unwrap().unwrap();
  assert_eq!(after.title(), "Final");
  assert_eq!(after.content(), before.content());
  assert_eq!(after.tag_names().collect::<Vec<_>>(), ["fresh", "old"]);
  assert_eq!(list_tags(&s).await.unwrap(), ["fresh", "old"]);

  assert!(search_notes(&s, "draft", 10).await.unwrap().is_empty());
  assert_eq!(titles(&search_notes(&s, "fin", 10).await.unwrap()), ["Final"]);
}

#[tokio::test]
async fn reasserting_the_same_value_writes_nothing() {
  let s = store().await;
  let ids = import(&s, vec![note("Same", day(0), &[])]).await;
  let view = find_note(&s, &ids[0]).await.unwrap().unwrap();

  let mut b = BatchBuilder::for_form();
  b.edit_note(view.entity(), NoteEdit { title: Some("Same".into()), ..NoteEdit::default() })
    .unwrap();
  let report = commit(&s, b.finish()).await.unwrap();
  assert_eq!(report.fact_count, 0);
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn recent_notes_are_newest_first_and_truncated() {
  let s = store().await;
  import(&s, vec![
    note("mid", day(5), &[]),
    note("old", day(1), &[]),
    note("new", day(9), &[]),
    note("older", day(0), &[]),
  ])
  .await;

  assert_eq!(titles(&recent_notes(&s, 2).await.unwrap()), ["new", "mid"]);
  assert!(recent_notes(&s, 0).await.unwrap().is_empty());
  assert_eq!(titles(&recent_notes(&s, 100).await.unwrap()), ["new", "mid", "old", "older"]);
}

#[tokio::test]
async fn recent_notes_spans_batches() {
  let s = store().await;
  import(&s, vec![note("a", day(2), &[])]).await;
  import(&s, vec![note("b", day(1), &[]), note("c", day(3), &[])]).await;
  assert_eq!(titles(&recent_notes(&s, 10).await.unwrap()), ["c", "a", "b"]);
}

#[tokio::test]
async fn unknown_tag_is_empty() {
  let s = store().await;
  import(&s, vec![note("a", day(0), &["real"])]).await;
  assert!(notes_tagged(&s, "imaginary", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn notes_tagged_truncates() {
  let s = store().await;
  import(&s, (0..5).map(|i| note(&format!("n{i}"), day(i), &["t"])).collect()).await;
  assert_eq!(titles(&notes_tagged(&s, "t", 2).await.unwrap()), ["n4", "n3"]);
  assert!(notes_tagged(&s, "t", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_ignores_case() {
  let s = store().await;
  import(&s, vec![
    note("Rust Ownership", day(1), &[]),
    note("Go channels", day(2), &[]),
    note("TRUSTED sources", day(3), &[]),
  ])
  .await;

  assert_eq!(titles(&search_notes(&s, "rust", 10).await.unwrap()), [
    "TRUSTED sources",
    "Rust Ownership"
  ]);
  assert_eq!(titles(&search_notes(&s, "CHANNEL", 10).await.unwrap()), ["Go channels"]);
  assert!(search_notes(&s, "python", 10).await.unwrap().is_empty());
  assert_eq!(search_notes(&s, "", 10).await.unwrap().len(), 3);
}

#[tokio::test]
async fn list_tags_is_sorted_and_distinct() {
  let s = store().await;
  import(&s, vec![note("a", day(0), &["zeta", "alpha"])]).await;
  import(&s, vec![note("b", day(1), &["alpha", "mid"])]).await;
  // The second import knew nothing of the first, so "alpha" exists twice.
  assert_eq!(list_tags(&s).await.unwrap(), ["alpha", "mid", "zeta"]);

  let known = query::known_tags(&s).await.unwrap();
  let alphas: Vec<_> = known.iter().filter(|(n, _)| n == "alpha").map(|(_, e)| *e).collect();
  assert_eq!(alphas.len(), 2);
  assert!(alphas[0] < alphas[1]);

  // Lookups resolve to the older entity.
  let first = s.resolve_lookup_ref(&TAG_NAME, Value::Str("alpha".into())).await.unwrap();
  assert_eq!(first, Some(alphas[0]));
}

// ─── Entities and views ──────────────────────────────────────────────────────

#[tokio::test]
async fn entity_reflects_current_values() {
  let s = store().await;
  let mut b = BatchBuilder::for_import();
  let created = b.add_note(note("x", day(0), &[])).unwrap();
  let report = commit(&s, b.finish()).await.unwrap();
  let id = report.resolve(created.temp).unwrap();

  let entity = s.entity(id).await.unwrap().unwrap();
  assert_eq!(entity.first(&NOTE_TITLE), Some(&Value::Str("x".into())));
  assert!(s.entity(EntityId(12345)).await.unwrap().is_none());
}

#[tokio::test]
async fn view_rejects_incomplete_entities() {
  let s = store().await;
  let mut partial = Entity::new(EntityId(1));
  partial.insert(NOTE_ID, "abc".into());
  partial.insert(NOTE_TITLE, "t".into());

  let err = NoteView::materialize(&s, &partial).await.unwrap_err();
  assert!(matches!(err, Error::Core(jotter_core::Error::MissingAttribute { .. })));
}

#[tokio::test]
async fn view_rejects_dangling_tag_refs() {
  let s = store().await;
  let mut e = Entity::new(EntityId(1));
  e.insert(NOTE_ID, "abc".into());
  e.insert(NOTE_TITLE, "t".into());
  e.insert(jotter_core::schema::NOTE_CONTENT, "c".into());
  e.insert(NOTE_DATE, day(0).into());
  e.insert(jotter_core::schema::NOTE_TAGS, Value::Ref(EntityId(404)));

  let err = NoteView::materialize(&s, &e).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(jotter_core::Error::DanglingRef { target: EntityId(404), .. })
  ));
}

#[tokio::test]
async fn batch_refs_to_placeholders_are_rewritten() {
  let s = store().await;
  let mut b = BatchBuilder::for_import();
  b.add_note(note("tagged", day(0), &["t"])).unwrap();
  let batch = b.finish();
  let tag_temp = batch
    .iter()
    .find(|d| d.a == TAG_NAME)
    .map(|d| d.e)
    .unwrap();
  let EntityRef::Temp(tag_temp) = tag_temp else { panic!("tag should be a placeholder") };

  let report = commit(&s, batch).await.unwrap();
  let tag_id = report.resolve(tag_temp).unwrap();
  let view = &notes_tagged(&s, "t", 1).await.unwrap()[0];
  assert_eq!(view.tags()[0].entity, tag_id);
}
