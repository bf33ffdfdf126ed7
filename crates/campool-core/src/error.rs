//! Service error taxonomy.
//!
//! Every failure is terminal for the triggering operation: a failed
//! precondition leaves the ride and chat records unchanged (writes only
//! happen after all checks pass, through a conditional update). Callers get
//! enough to distinguish the kind; raw backend errors never leak through.

use campool_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Ride or thread absent.
    #[error("not found")]
    NotFound,

    /// Actor lacks the required relationship: not the creator, not a
    /// participant, or from another institution.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Operation illegal for the ride's current status, including acting on
    /// a closed ride and accepting with no seats left.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Duplicate request, or no pending request to act on.
    #[error("conflict: {0}")]
    Conflict(&'static str),

    /// Request-side validation failure (seat count, destination length).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Persistence timeout or failure; the operation may be retried.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound,
            StoreError::AlreadyExists => ServiceError::Conflict("already exists"),
            // A conditional-update conflict that escapes the retry loop means
            // the record is too contended to make progress right now.
            StoreError::Conflict => {
                ServiceError::StoreUnavailable("conditional update contention".to_string())
            }
            StoreError::Unavailable(msg) => ServiceError::StoreUnavailable(msg),
        }
    }
}
