// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound reply channel.

use async_trait::async_trait;

use crate::error::UsherError;

/// Where the assistant's replies go.
///
/// A streamed reply is zero or more `send_chunk` calls followed by exactly
/// one `send_complete` carrying the full accumulated text. A non-streamed
/// reply is a single `send_complete`. Every conversation turn ends in a
/// `send_complete`, whatever went wrong on the way.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Forwards one incremental text fragment.
    async fn send_chunk(&self, text: &str) -> Result<(), UsherError>;

    /// Marks the turn complete with the full reply text.
    async fn send_complete(&self, content: &str) -> Result<(), UsherError>;
}
