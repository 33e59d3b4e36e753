//! The `FactStore` trait: the seam between the domain layer and the datom
//! store that persists it.
//!
//! The trait is implemented by storage backends (e.g. `jotter-store-sqlite`).
//! The query planner, importers and HTTP layer depend on this abstraction,
//! not on any concrete backend.

use std::{collections::HashMap, future::Future};

use serde::Serialize;

use crate::{
  batch::Batch,
  datom::{AttrId, Datom, EntityId, Keyword, TxId, Value},
  entity::Entity,
  query::ScanPlan,
  tempid::TempId,
};

/// The outcome of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReport {
  pub tx:         TxId,
  /// Datoms the store actually wrote, including retractions of replaced
  /// values. Redundant assertions are not counted.
  pub fact_count: usize,
  /// The permanent id each placeholder in the batch resolved to.
  pub tempids:    HashMap<TempId, EntityId>,
}

impl TxReport {
  pub fn resolve(&self, temp: TempId) -> Option<EntityId> { self.tempids.get(&temp).copied() }
}

/// Abstraction over an append-only datom store.
///
/// Committed datoms are never modified. Every method returns a `Send` future
/// so the trait can be used from multi-threaded runtimes (e.g. tokio with
/// `axum`).
pub trait FactStore: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  /// Resolve an attribute name. `None` when the attribute is not installed.
  fn resolve_attribute<'a>(
    &'a self,
    ident: &'a Keyword,
  ) -> impl Future<Output = Result<Option<AttrId>, Self::Error>> + Send + 'a;

  /// The entity currently holding `value` for `attr`. When more than one
  /// does, the lowest entity id wins.
  fn resolve_lookup_ref<'a>(
    &'a self,
    attr: &'a Keyword,
    value: Value,
  ) -> impl Future<Output = Result<Option<EntityId>, Self::Error>> + Send + 'a;

  /// Every current datom inside the plan's bounds, in the plan's index
  /// order. Each call is an independent, finite read.
  fn scan<'a>(
    &'a self,
    plan: &'a ScanPlan,
  ) -> impl Future<Output = Result<Vec<Datom>, Self::Error>> + Send + 'a;

  /// Everything currently asserted about `id`. `None` if the entity has no
  /// current datoms.
  fn entity(
    &self,
    id: EntityId,
  ) -> impl Future<Output = Result<Option<Entity>, Self::Error>> + Send + '_;

  /// Commit `batch` atomically, replacing placeholders with permanent ids.
  fn transact(
    &self,
    batch: Batch,
  ) -> impl Future<Output = Result<TxReport, Self::Error>> + Send + '_;
}
