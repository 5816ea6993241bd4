//! Classification of MongoDB driver errors.

use mongodb::error::{Error, ErrorKind, WriteFailure};
use seed_core::SeedError;

/// Server code for a unique index violation (E11000).
pub const DUPLICATE_KEY: i32 = 11000;

/// Map a driver error onto the seeding error kinds.
///
/// Duplicate-key write errors are constraint violations; everything else is
/// treated as the store being unavailable.
pub fn classify(target: &str, err: Error) -> SeedError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
        if write_error.code == DUPLICATE_KEY {
            return SeedError::constraint(target, write_error.message.clone());
        }
    }
    SeedError::StorageUnavailable(format!("MongoDB error on '{target}': {err}"))
}
