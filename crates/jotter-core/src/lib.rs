//! Core types and the domain query/transaction layer for the Jotter notes
//! store.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! turns domain requests into index scans and domain objects into fact
//! batches; the fact store itself sits behind [`store::FactStore`].

pub mod batch;
pub mod datom;
pub mod entity;
pub mod error;
pub mod query;
pub mod schema;
pub mod store;
pub mod tags;
pub mod tempid;
pub mod view;

pub use error::{Error, Result};
