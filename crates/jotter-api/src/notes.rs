//! Handlers for `/notes` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/notes` | Newest first; `?n=` limits (default 100) |
//! | `POST` | `/notes` | Form: `title`, `content`, optional `url`, `tags` |
//! | `GET`  | `/notes/{id}` | 404 if not found |
//! | `POST` | `/notes/{id}` | Form: any of `title`, `content`, `url`, `tags` |

use std::sync::Arc;

use axum::{
  Form, Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{SubsecRound as _, Utc};
use jotter_core::{
  batch::{BatchBuilder, NewNote, NoteEdit, commit},
  query::{DEFAULT_LIMIT, find_note, known_tags, recent_notes},
  store::FactStore,
  view::NoteView,
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct LimitParams {
  pub n: Option<String>,
}

impl LimitParams {
  pub fn limit(&self) -> usize { parse_limit(self.n.as_deref()) }
}

/// Parse an `n` query value; anything that is not a non-negative integer
/// falls back to [`DEFAULT_LIMIT`].
pub(crate) fn parse_limit(raw: Option<&str>) -> usize {
  raw.and_then(|n| n.trim().parse().ok()).unwrap_or(DEFAULT_LIMIT)
}

fn note_id(raw: &str) -> Result<&str, ApiError> {
  let id = raw.trim();
  if id.is_empty() {
    return Err(ApiError::BadRequest("note id must not be empty".into()));
  }
  Ok(id)
}

async fn fetch<S: FactStore>(store: &S, id: &str) -> Result<NoteView, ApiError> {
  find_note(store, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("note {id} not found")))
}

async fn form_builder<S: FactStore>(store: &S) -> Result<BatchBuilder, ApiError> {
  let known = known_tags(store).await.map_err(ApiError::store)?;
  Ok(BatchBuilder::for_form().with_known_tags(known))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /notes[?n=<limit>]`
pub async fn list<S: FactStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<NoteView>>, ApiError> {
  let notes = recent_notes(store.as_ref(), params.limit())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(notes))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /notes/{id}`
pub async fn get_one<S: FactStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<NoteView>, ApiError> {
  Ok(Json(fetch(store.as_ref(), note_id(&id)?).await?))
}

/// `GET /notes/` — a note path with no id.
pub async fn missing_id() -> ApiError { ApiError::BadRequest("note id must not be empty".into()) }

// ─── Create ───────────────────────────────────────────────────────────────────

/// Missing `title` or `content` read as empty, like a blank form field.
#[derive(Debug, Deserialize)]
pub struct CreateForm {
  #[serde(default)]
  pub title:   String,
  #[serde(default)]
  pub content: String,
  pub url:     Option<String>,
  /// Space-separated tag names.
  pub tags:    Option<String>,
}

/// `POST /notes` — url-encoded form body.
pub async fn create<S: FactStore>(
  State(store): State<Arc<S>>,
  Form(form): Form<CreateForm>,
) -> Result<impl IntoResponse, ApiError> {
  let note = NewNote::with_tag_field(
    form.title,
    form.content,
    Utc::now().round_subsecs(0),
    form.url,
    form.tags.as_deref().unwrap_or_default(),
  );

  let mut builder = form_builder(store.as_ref()).await?;
  let created = builder.add_note(note)?;
  commit(store.as_ref(), builder.finish()).await.map_err(ApiError::store)?;

  let view = fetch(store.as_ref(), &created.note_id).await?;
  Ok((StatusCode::CREATED, Json(view)))
}

// ─── Edit ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct EditForm {
  pub title:   Option<String>,
  pub content: Option<String>,
  pub url:     Option<String>,
  /// Space-separated tag names to add.
  pub tags:    Option<String>,
}

/// `POST /notes/{id}` — url-encoded form body; omitted fields are unchanged.
pub async fn edit<S: FactStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Form(form): Form<EditForm>,
) -> Result<Json<NoteView>, ApiError> {
  let id = note_id(&id)?;
  let current = fetch(store.as_ref(), id).await?;
  let edit = NoteEdit {
    title:    form.title,
    content:  form.content,
    url:      form.url,
    add_tags: form.tags.into_iter().collect(),
  };
  if edit.is_empty() {
    return Ok(Json(current));
  }

  let mut builder = form_builder(store.as_ref()).await?;
  builder.edit_note(current.entity(), edit)?;
  commit(store.as_ref(), builder.finish()).await.map_err(ApiError::store)?;

  Ok(Json(fetch(store.as_ref(), id).await?))
}
