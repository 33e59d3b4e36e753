//! JSON API for Jotter.
//!
//! Exposes an axum [`Router`] backed by any [`jotter_core::store::FactStore`].
//! Reads answer with JSON; writes accept url-encoded web forms. TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(jotter_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod notes;
pub mod search;
pub mod tags;

use std::sync::Arc;

use axum::{Router, routing::get};
use jotter_core::store::FactStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: FactStore + 'static,
{
  Router::new()
    // Notes
    .route("/notes", get(notes::list::<S>).post(notes::create::<S>))
    .route("/notes/", get(notes::missing_id))
    .route("/notes/{id}", get(notes::get_one::<S>).post(notes::edit::<S>))
    // Tags
    .route("/tags", get(tags::list::<S>))
    .route("/tags/{name}", get(tags::notes::<S>))
    // Search
    .route("/search", get(search::handler::<S>))
    .with_state(store)
}
