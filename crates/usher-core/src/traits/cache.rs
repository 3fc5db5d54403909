// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value cache trait with per-entry TTL.

use std::time::Duration;

use async_trait::async_trait;

/// A TTL-bounded key-value cache.
///
/// Backs the reply cache, the search-result cache, and session-context
/// persistence. Implementations must be safe under concurrent access from
/// independent sessions. Callers treat the cache as optional: every read
/// path degrades to recompute and every write path is best-effort.
#[async_trait]
pub trait TtlCache: Send + Sync {
    /// Looks up a value; returns `None` on miss or expiry.
    async fn get(&self, key: &str) -> Option<String>;

    /// Stores a value that expires after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration);

    /// Liveness probe.
    async fn ping(&self) -> bool;
}
