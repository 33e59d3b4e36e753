//! Error types for `jotter-core`.

use thiserror::Error;

use crate::{
  datom::{EntityId, Keyword},
  schema::ValueType,
  tempid::Partition,
};

#[derive(Debug, Error)]
pub enum Error {
  /// A core attribute is missing from the store's schema. The database was
  /// never bootstrapped; callers treat this as fatal.
  #[error("schema not initialized: attribute {0} is not installed")]
  SchemaNotInitialized(Keyword),

  #[error("unknown attribute: {0}")]
  UnknownAttribute(Keyword),

  #[error("entity {entity} has no value for mandatory attribute {attr}")]
  MissingAttribute { entity: EntityId, attr: Keyword },

  #[error("entity {entity}: {attr} holds a {found} value, expected {expected}")]
  UnexpectedValue {
    entity:   EntityId,
    attr:     Keyword,
    expected: ValueType,
    found:    ValueType,
  },

  #[error("entity {entity}: {attr} references missing entity {target}")]
  DanglingRef {
    entity: EntityId,
    attr:   Keyword,
    target: EntityId,
  },

  #[error("placeholder space for partition {0} is exhausted")]
  PlaceholderSpaceExhausted(Partition),

  #[error("invalid keyword: {0:?}")]
  InvalidKeyword(String),

  #[error("could not gather entropy for a note id: {0}")]
  Entropy(#[from] rand_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
