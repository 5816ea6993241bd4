//! MongoDB document store for chat-seed.
//!
//! Implements [`seed_core::DocumentStore`] over one long-lived
//! `mongodb::Database` handle. Sequence counters live in the `counters`
//! collection as `{ _id: <kind>, sequence_value: <i64> }` and are advanced
//! with `findOneAndUpdate` + `$inc`, which MongoDB applies atomically.

pub mod convert;
pub mod error;
pub mod store;

pub use store::MongoDocumentStore;
