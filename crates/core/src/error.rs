//! Error types for the Rapport domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each boundary (completion service, persistence) has its own error enum;
//! [`Error`] is the umbrella returned by pipeline operations.

use thiserror::Error;

/// The top-level error type for all Rapport operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion errors ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Boundary errors ---

/// Failure of a single round trip to the language-model service.
///
/// The pipeline never lets these escape; they are folded into placeholder
/// text shown in the chat thread.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by completion service")]
    RateLimited,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Completion client not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failure of a persistence read or write.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Turn already stored: {0}")]
    DuplicateTurn(String),
}
