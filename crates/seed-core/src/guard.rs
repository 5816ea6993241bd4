//! Write-time uniqueness checks for natural keys.

use crate::error::{Result, SeedError};
use crate::schema::EntityKind;
use crate::store::{CountQuery, RelationalStore};
use std::sync::Arc;
use tracing::debug;

/// Checks user names and emails against the relational store and suffixes
/// colliding candidates with a disambiguator (the newly allocated user ID).
#[derive(Clone)]
pub struct UniquenessGuard {
    store: Arc<dyn RelationalStore>,
}

impl UniquenessGuard {
    pub fn new(store: Arc<dyn RelationalStore>) -> Self {
        Self { store }
    }

    /// Returns `candidate` if unused, otherwise `candidate_<disambiguator>`.
    pub async fn ensure_unique_username(
        &self,
        candidate: &str,
        disambiguator: i64,
    ) -> Result<String> {
        if self.is_taken("user_name", candidate).await? {
            let unique = format!("{candidate}_{disambiguator}");
            debug!("User name '{}' taken, using '{}'", candidate, unique);
            return Ok(unique);
        }
        Ok(candidate.to_string())
    }

    /// Returns `candidate` if unused, otherwise `local_<disambiguator>@domain`.
    ///
    /// The address is split on its first `@`. Addresses without a non-empty
    /// local part and domain are rejected before the store is queried.
    pub async fn ensure_unique_email(
        &self,
        candidate: &str,
        disambiguator: i64,
    ) -> Result<String> {
        let (local, domain) = split_email(candidate)?;
        if self.is_taken("email", candidate).await? {
            let unique = format!("{local}_{disambiguator}@{domain}");
            debug!("Email '{}' taken, using '{}'", candidate, unique);
            return Ok(unique);
        }
        Ok(candidate.to_string())
    }

    async fn is_taken(&self, column: &'static str, value: &str) -> Result<bool> {
        let query = CountQuery::new(EntityKind::UserProfiles, column, value);
        Ok(self.store.fetch_count(&query).await? > 0)
    }
}

fn split_email(email: &str) -> Result<(&str, &str)> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok((local, domain)),
        _ => Err(SeedError::Validation(format!(
            "email '{email}' has no local part and domain separated by '@'"
        ))),
    }
}
