//! MySQL relational store for chat-seed.
//!
//! Implements [`seed_core::RelationalStore`] over a single long-lived
//! connection with autocommit disabled, so `commit()` is the only point at
//! which writes become visible to other sessions.
//!
//! # Modules
//!
//! - [`convert`] - `FieldValue` ↔ `mysql_async::Value`
//! - [`ddl`] - CREATE/DROP statements for the three seeded tables
//! - [`error`] - driver error classification
//! - [`store`] - the `RelationalStore` implementation

pub mod convert;
pub mod ddl;
pub mod error;
pub mod store;

pub use store::MySqlRelationalStore;
