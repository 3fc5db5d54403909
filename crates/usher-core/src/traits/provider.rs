// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation provider trait for language-model backends (Ollama, Gemini).

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::UsherError;
use crate::types::ChatMessage;

/// A lazy sequence of reply-text fragments from a streaming backend.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, UsherError>> + Send>>;

/// Abstraction over a chat-completion backend.
///
/// Both methods take the fully assembled prompt. Streaming is the preferred
/// mode for the conversation loop; `complete` is the buffered fallback for
/// callers that want the whole reply at once.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Returns the backend's name for logging ("ollama", "gemini").
    fn name(&self) -> &str;

    /// Generates a full reply and returns it as one string.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, UsherError>;

    /// Generates a reply as a stream of text fragments.
    async fn stream(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<TextStream, UsherError>;
}
