//! SQLite backend for the Jotter fact store.
//!
//! Datoms live in a single append-only table; the four index orderings are
//! realised as SQLite indexes plus an in-memory sort of each scan. All
//! database access runs on [`tokio_rusqlite`]'s dedicated thread so the async
//! runtime is never blocked.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
