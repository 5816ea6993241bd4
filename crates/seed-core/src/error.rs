//! Error types for seeding operations.

use thiserror::Error;

/// Errors that can occur while seeding or verifying the stores.
///
/// None of these are retried. Any error raised during a dual write aborts the
/// whole population run.
#[derive(Error, Debug)]
pub enum SeedError {
    /// Connection, setup or driver failure in either store.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A duplicate key or dangling reference reached a store.
    #[error("Constraint violation on '{target}': {message}")]
    ConstraintViolation { target: String, message: String },

    /// Malformed input, e.g. an email address without a domain separator.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A stored record could not be decoded back into a canonical record.
    #[error("Cannot decode {kind} record: {message}")]
    Decode { kind: String, message: String },
}

impl SeedError {
    pub fn constraint(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn decode(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = SeedError> = std::result::Result<T, E>;
