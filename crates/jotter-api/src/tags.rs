//! Handlers for `/tags` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tags` | Every tag name, sorted |
//! | `GET`  | `/tags/{name}` | Notes with that tag, newest first; `?n=` limits |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use jotter_core::{
  query::{list_tags, notes_tagged},
  store::FactStore,
  view::NoteView,
};

use crate::{error::ApiError, notes::LimitParams};

/// `GET /tags`
pub async fn list<S: FactStore>(State(store): State<Arc<S>>) -> Result<Json<Vec<String>>, ApiError> {
  let tags = list_tags(store.as_ref()).await.map_err(ApiError::store)?;
  Ok(Json(tags))
}

/// `GET /tags/{name}[?n=<limit>]` — an unknown tag yields an empty list.
pub async fn notes<S: FactStore>(
  State(store): State<Arc<S>>,
  Path(name): Path<String>,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<NoteView>>, ApiError> {
  let notes = notes_tagged(store.as_ref(), &name, params.limit())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(notes))
}
