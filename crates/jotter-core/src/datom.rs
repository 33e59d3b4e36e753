//! Datoms — the atomic unit the fact store persists — and the index orderings
//! used to range-scan them.
//!
//! A datom is an immutable `(entity, attribute, value, transaction, added)`
//! tuple. The store keeps several sorted orderings over the same datoms; a
//! scan names one ordering plus a lower and an upper [`DatomBound`].

use std::{borrow::Cow, cmp::Ordering, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, schema::ValueType};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// A permanent entity identifier, assigned by the store at commit.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub i64);

/// A resolved attribute identifier. Only meaningful to the store that issued
/// it; look it up by name with
/// [`FactStore::resolve_attribute`](crate::store::FactStore::resolve_attribute).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AttrId(pub i64);

/// A transaction identifier. Transactions are totally ordered by id.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TxId(pub i64);

impl fmt::Display for EntityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl fmt::Display for AttrId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl fmt::Display for TxId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

// ─── Keyword ─────────────────────────────────────────────────────────────────

/// A namespaced attribute name such as `:note/title`.
///
/// Stored without the leading colon; [`fmt::Display`] adds it back.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Keyword(Cow<'static, str>);

impl Keyword {
  /// Build a keyword from a `namespace/name` literal. The literal is not
  /// validated; use [`Keyword::parse`] for untrusted input.
  pub const fn from_static(ident: &'static str) -> Self { Self(Cow::Borrowed(ident)) }

  /// Parse `:namespace/name` or `namespace/name`.
  pub fn parse(raw: &str) -> Result<Self> {
    let ident = raw.strip_prefix(':').unwrap_or(raw);
    match ident.split_once('/') {
      Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
        Ok(Self(Cow::Owned(ident.to_owned())))
      }
      _ => Err(Error::InvalidKeyword(raw.to_owned())),
    }
  }

  /// The `namespace/name` form, without a leading colon.
  pub fn as_str(&self) -> &str { &self.0 }

  pub fn namespace(&self) -> &str {
    self.0.split_once('/').map_or(&*self.0, |(ns, _)| ns)
  }

  pub fn name(&self) -> &str {
    self.0.split_once('/').map_or(&*self.0, |(_, name)| name)
  }
}

impl fmt::Display for Keyword {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, ":{}", self.0) }
}

impl TryFrom<String> for Keyword {
  type Error = Error;

  fn try_from(raw: String) -> Result<Self> { Self::parse(&raw) }
}

impl From<Keyword> for String {
  fn from(k: Keyword) -> Self { k.to_string() }
}

// ─── Value ───────────────────────────────────────────────────────────────────

/// The typed value position of a datom.
///
/// Values are totally ordered: first by variant (in declaration order), then
/// by payload. Index scans rely on this ordering.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
  Str(String),
  Instant(DateTime<Utc>),
  Ref(EntityId),
}

impl Value {
  pub fn value_type(&self) -> ValueType {
    match self {
      Self::Str(_) => ValueType::String,
      Self::Instant(_) => ValueType::Instant,
      Self::Ref(_) => ValueType::Ref,
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Self::Str(s.to_owned()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Self::Str(s) }
}

impl From<DateTime<Utc>> for Value {
  fn from(dt: DateTime<Utc>) -> Self { Self::Instant(dt) }
}

impl From<EntityId> for Value {
  fn from(id: EntityId) -> Self { Self::Ref(id) }
}

// ─── Datom ───────────────────────────────────────────────────────────────────

/// One committed fact. Never edited in place; an update is a new datom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datom {
  pub e:     EntityId,
  pub a:     AttrId,
  pub v:     Value,
  pub tx:    TxId,
  /// `true` for an assertion, `false` for a retraction.
  pub added: bool,
}

// ─── Bounds ──────────────────────────────────────────────────────────────────

/// One component of a scan bound: either a concrete value or one of the two
/// extremes of that component's domain. `Min < At(_) < Max`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Edge<T> {
  Min,
  At(T),
  Max,
}

impl<T> Edge<T> {
  pub fn value(&self) -> Option<&T> {
    match self {
      Self::At(v) => Some(v),
      Self::Min | Self::Max => None,
    }
  }
}

/// A lower or upper bound for an index scan. Every component may be pinned
/// or left at an extreme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatomBound {
  pub e:  Edge<EntityId>,
  pub a:  Edge<AttrId>,
  pub v:  Edge<Value>,
  pub tx: Edge<TxId>,
}

impl DatomBound {
  /// The bound that sits exactly on `datom`.
  pub fn at(datom: &Datom) -> Self {
    Self {
      e:  Edge::At(datom.e),
      a:  Edge::At(datom.a),
      v:  Edge::At(datom.v.clone()),
      tx: Edge::At(datom.tx),
    }
  }
}

// ─── Index orderings ─────────────────────────────────────────────────────────

/// The sort orders the store maintains over its datoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum IndexOrdering {
  /// Entity, attribute, value, transaction — "everything about an entity".
  Eavt,
  /// Attribute, entity, value, transaction — "every entity with attribute".
  Aevt,
  /// Attribute, value, entity, transaction — lookups and range scans by value.
  Avet,
  /// Value, attribute, entity, transaction — reverse references.
  Vaet,
}

impl IndexOrdering {
  /// Compare two bounds under this ordering.
  pub fn compare(self, l: &DatomBound, r: &DatomBound) -> Ordering {
    match self {
      Self::Eavt => l
        .e
        .cmp(&r.e)
        .then_with(|| l.a.cmp(&r.a))
        .then_with(|| l.v.cmp(&r.v))
        .then_with(|| l.tx.cmp(&r.tx)),
      Self::Aevt => l
        .a
        .cmp(&r.a)
        .then_with(|| l.e.cmp(&r.e))
        .then_with(|| l.v.cmp(&r.v))
        .then_with(|| l.tx.cmp(&r.tx)),
      Self::Avet => l
        .a
        .cmp(&r.a)
        .then_with(|| l.v.cmp(&r.v))
        .then_with(|| l.e.cmp(&r.e))
        .then_with(|| l.tx.cmp(&r.tx)),
      Self::Vaet => l
        .v
        .cmp(&r.v)
        .then_with(|| l.a.cmp(&r.a))
        .then_with(|| l.e.cmp(&r.e))
        .then_with(|| l.tx.cmp(&r.tx)),
    }
  }

  pub fn compare_datoms(self, l: &Datom, r: &Datom) -> Ordering {
    self.compare(&DatomBound::at(l), &DatomBound::at(r))
  }
}
