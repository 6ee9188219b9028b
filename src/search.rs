//! Substring search across all stored claims.

use crate::error::{Result, VeridexError};
use crate::models::Claim;
use crate::store::Store;

pub fn search(store: &Store, query: &str, limit: usize) -> Result<Vec<Claim>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(VeridexError::Validation {
            message: "Search query cannot be empty.".to_string(),
        });
    }
    store.search_claims(query, limit)
}
