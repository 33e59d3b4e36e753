//! Error types for the jotter importers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot read {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("{path} is not valid UTF-8")]
  Encoding { path: PathBuf },

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("XML error: {0}")]
  Xml(#[from] quick_xml::DeError),

  #[error("invalid date {value:?}: {reason}")]
  InvalidDate { value: String, reason: String },

  #[error("core error: {0}")]
  Core(#[from] jotter_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io { path: path.into(), source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
