//! Error type for `jotter-store-sqlite`.

use jotter_core::datom::{EntityId, Keyword};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] jotter_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// Raised inside a write transaction; the transaction is rolled back.
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("malformed stored value: {0}")]
  Decode(String),

  /// A batch referenced a permanent entity id the store never issued.
  #[error("entity not found: {0}")]
  EntityNotFound(EntityId),

  /// A unique attribute value is already held by another entity.
  #[error("{attr} value {value:?} already belongs to entity {holder}")]
  UniqueConflict {
    attr:   Keyword,
    value:  String,
    holder: EntityId,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
