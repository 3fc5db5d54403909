// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding trait for converting text into fixed-dimension vectors.

use crate::error::UsherError;

/// Converts text into fixed-dimension vectors for semantic search.
///
/// Embedding is CPU-bound and synchronous; callers that need it off the
/// async executor wrap calls in `spawn_blocking`.
pub trait Embedder: Send + Sync {
    /// The dimensionality of produced vectors.
    fn dimension(&self) -> usize;

    /// Embeds a batch of texts, one vector per input, in input order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UsherError>;
}
