//! Handler for `GET /search`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use jotter_core::{
  query::search_notes,
  store::FactStore,
  view::NoteView,
};
use serde::Deserialize;

use crate::{error::ApiError, notes::parse_limit};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Case-insensitive substring to look for in note titles.
  pub q: Option<String>,
  pub n: Option<String>,
}

/// `GET /search?q=<text>[&n=<limit>]`
pub async fn handler<S: FactStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<NoteView>>, ApiError> {
  let q = params
    .q
    .ok_or_else(|| ApiError::BadRequest("missing query parameter q".into()))?;
  let notes = search_notes(store.as_ref(), &q, parse_limit(params.n.as_deref()))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(notes))
}
