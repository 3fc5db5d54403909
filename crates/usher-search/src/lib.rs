// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic search over the event catalog.
//!
//! Local ONNX embeddings (all-MiniLM-L6-v2), an exact nearest-neighbor
//! index built at startup, and a TTL cache over result sets.

mod embedder;
mod engine;
mod index;

pub use embedder::{OnnxEmbedder, EMBEDDING_DIM};
pub use engine::{SearchEngine, SearchHit};
pub use index::VectorIndex;
