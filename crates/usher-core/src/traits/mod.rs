// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the conversation core and its collaborators.
//!
//! All async traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod cache;
pub mod embedding;
pub mod provider;
pub mod sink;

pub use cache::TtlCache;
pub use embedding::Embedder;
pub use provider::{GenerationProvider, TextStream};
pub use sink::ReplySink;
