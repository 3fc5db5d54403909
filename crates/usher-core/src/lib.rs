// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Usher event-booking assistant.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Usher workspace. Backends and stores
//! implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::UsherError;
pub use traits::{Embedder, GenerationProvider, ReplySink, TextStream, TtlCache};
pub use types::{BookingId, ChatMessage, ChatRole, EventId, PhoneNumber};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_has_all_variants() {
        let _config = UsherError::Config("test".into());
        let _catalog = UsherError::Catalog("test".into());
        let _store = UsherError::Store {
            message: "test".into(),
            source: None,
        };
        let _provider = UsherError::Provider {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _search = UsherError::Search("test".into());
        let _timeout = UsherError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = UsherError::Internal("test".into());
    }

    #[test]
    fn all_traits_are_object_safe() {
        // Compile-time check: the conversation loop holds these as trait objects.
        fn _provider(_: &dyn GenerationProvider) {}
        fn _embedder(_: &dyn Embedder) {}
        fn _cache(_: &dyn TtlCache) {}
        fn _sink(_: &dyn ReplySink) {}
    }
}
