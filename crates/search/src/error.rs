//! Error type for search operations.

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the record builder and the query gateway.
///
/// Permission denial is not an error; see [`crate::SearchOutcome::Denied`].
#[derive(Debug, Error)]
pub enum SearchError {
    /// The backing store failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The search term could not be compiled into a matcher.
    #[error("invalid search term: {0}")]
    InvalidTerm(String),
}
