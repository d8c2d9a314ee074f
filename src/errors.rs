//! Unified error types and result handling for `ReturnBuddy`.
//!
//! Validation and limit errors block the surrounding write and are surfaced
//! immediately. Image-pipeline errors clear the draft's image slot but never
//! block record submission. OCR extraction failures are not represented here
//! at all - they degrade to soft warnings (see [`crate::core::ocr`]).

use crate::core::{image::ImageError, validation::ValidationError};
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A draft failed validation; the write was not attempted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The per-user record ceiling was hit, either by the advisory pre-check
    /// or by the authoritative guard inside the create transaction.
    #[error("return limit reached: {count} of {max} records already exist")]
    LimitExceeded {
        /// Records currently owned by the user
        count: u64,
        /// The configured ceiling
        max: u64,
    },

    /// Lookup by id found nothing, or found a record owned by another user.
    #[error("return record {id} not found")]
    RecordNotFound {
        /// The id that failed to resolve
        id: i64,
    },

    /// Receipt photo processing failed; the draft's image slot stays empty.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// A submit was attempted while compression or extraction was in flight.
    #[error("draft is busy ({state}); wait for the attachment to finish")]
    DraftBusy {
        /// The attachment state that blocked the submit
        state: String,
    },

    /// Configuration error (config.toml or environment)
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Persistence call failed. Surfaced as-is so the user may retry the
    /// action; nothing is auto-retried and no optimistic state is kept.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
