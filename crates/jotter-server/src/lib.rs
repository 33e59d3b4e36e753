//! HTTP server wiring for Jotter.
//!
//! Combines the JSON API from [`jotter_api`] with configuration, a service
//! status endpoint and request tracing.

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, extract::State, routing::get};
use jotter_core::store::FactStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `JOTTER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "localhost".into() }

fn default_port() -> u16 { 9999 }

fn default_store_path() -> PathBuf { PathBuf::from("jotter.db") }

impl Default for ServerConfig {
  fn default() -> Self {
    Self { host: default_host(), port: default_port(), store_path: default_store_path() }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state built once at startup.
pub struct AppState<S: FactStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

impl<S: FactStore> Clone for AppState<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone(), config: self.config.clone() } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: FactStore + 'static,
{
  let status = Router::new().route("/", get(status::<S>)).with_state(state.clone());

  status.merge(jotter_api::api_router(state.store)).layer(TraceLayer::new_for_http())
}

/// `GET /` — service name, version and the address it was configured for.
async fn status<S: FactStore>(State(state): State<AppState<S>>) -> Json<Value> {
  Json(json!({
    "service": env!("CARGO_PKG_NAME"),
    "version": env!("CARGO_PKG_VERSION"),
    "address": state.config.address(),
  }))
}
