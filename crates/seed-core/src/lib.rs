//! Core seeding logic for chat-seed.
//!
//! This crate owns everything that keeps the document store and the
//! relational store in lockstep while they are filled with synthetic chat
//! data:
//!
//! - [`SequenceAllocator`] - per-kind IDs from a shared atomic counter
//! - [`UniquenessGuard`] - disambiguates colliding user names and emails
//! - [`DualWriter`] - builds one [`CanonicalRecord`] and writes it to both stores
//! - [`Populator`] - bulk generation in referential order
//! - [`harness`] - reset and benchmark runs
//! - [`verify`] - reads both stores back and checks them against each other
//!
//! # Architecture
//!
//! ```text
//!                  Populator ── FakeData
//!                      │
//!                      ▼
//!                 ┌──────────┐
//!                 │DualWriter│── SequenceAllocator ──┐
//!                 │          │── UniquenessGuard ─┐  │
//!                 └────┬─────┘                    │  │
//!        to_document() │ to_insert_statement()    │  │
//!              ┌───────┴────────┐                 │  │
//!              ▼                ▼                 │  │
//!       DocumentStore     RelationalStore ◄───────┘  │
//!              ▲                                     │
//!              └─────────── counters ────────────────┘
//! ```
//!
//! The store traits are implemented by `seed-mongodb` and `seed-mysql`, and
//! by the in-memory stores in [`testing`].

pub mod allocator;
pub mod coordinator;
pub mod error;
pub mod fake;
pub mod guard;
pub mod harness;
pub mod populator;
pub mod projection;
pub mod record;
pub mod schema;
pub mod store;
pub mod testing;
pub mod value;
pub mod verify;

pub use allocator::SequenceAllocator;
pub use coordinator::{DualWriter, StoreTimings};
pub use error::{Result, SeedError};
pub use fake::{FakeData, WordListFaker};
pub use guard::UniquenessGuard;
pub use harness::{benchmark, reset_all_stores, BenchmarkReport, RunTiming, StoreKind};
pub use populator::{PopulateSummary, Populator};
pub use projection::{from_document, from_row, to_document, to_insert_statement};
pub use record::{CanonicalRecord, Chat, ChatMember, UserProfile};
pub use schema::{Column, ColumnType, EntityKind};
pub use store::{
    CountQuery, DocumentFilter, DocumentRecord, DocumentStore, RelationalRow, RelationalStore,
    Statement,
};
pub use value::FieldValue;
pub use verify::{verify, ConsistencyReport};
