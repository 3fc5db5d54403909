// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Usher booking assistant.

use thiserror::Error;

/// The primary error type used across all Usher crates.
#[derive(Debug, Error)]
pub enum UsherError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Catalog errors (file unreadable, no parseable records).
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Store errors (ledger or context persistence failure).
    #[error("store error: {message}")]
    Store {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generation backend errors (HTTP failure, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding or index errors (tokenization, inference, dimension mismatch).
    #[error("search error: {0}")]
    Search(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
