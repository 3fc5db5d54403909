// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared stubs for tests: a deterministic embedder, scripted and failing
//! generation providers, and a reply sink that records what it was sent.
//!
//! Everything here is deterministic; nothing touches the network or disk.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use usher_core::{
    ChatMessage, Embedder, GenerationProvider, ReplySink, TextStream, UsherError,
};

/// Bag-of-words embedder with a fixed hash, so identical inputs always map
/// to identical vectors. Texts sharing words land close together, which is
/// all the search tests need.
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    /// 256 buckets keeps unrelated words from colliding in small fixtures.
    pub fn keyword_based() -> Self {
        Self { dimension: 256 }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut counts = vec![0.0f32; self.dimension];
        for word in text.to_lowercase().split_whitespace() {
            let bucket = fnv1a(word.as_bytes()) as usize % self.dimension;
            counts[bucket] += 1.0;
        }
        let norm: f32 = counts.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut counts {
                *v /= norm;
            }
        }
        counts
    }
}

impl Embedder for StubEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UsherError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

// FNV-1a: stable across runs, unlike the std hasher.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Provider that always answers with a fixed reply, streamed word by word.
pub struct ScriptedProvider {
    reply: String,
}

impl ScriptedProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _max_tokens: u32,
    ) -> Result<String, UsherError> {
        Ok(self.reply.clone())
    }

    async fn stream(
        &self,
        _messages: &[ChatMessage],
        _max_tokens: u32,
    ) -> Result<TextStream, UsherError> {
        let chunks: Vec<Result<String, UsherError>> = self
            .reply
            .split_inclusive(' ')
            .map(|w| Ok(w.to_string()))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

/// Provider whose every call fails, for exercising fallback paths.
pub struct FailingProvider;

#[async_trait]
impl GenerationProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _max_tokens: u32,
    ) -> Result<String, UsherError> {
        Err(UsherError::Provider {
            message: "scripted failure".to_string(),
            source: None,
        })
    }

    async fn stream(
        &self,
        _messages: &[ChatMessage],
        _max_tokens: u32,
    ) -> Result<TextStream, UsherError> {
        Err(UsherError::Provider {
            message: "scripted failure".to_string(),
            source: None,
        })
    }
}

/// Sink that records everything sent through it.
#[derive(Default)]
pub struct RecordingSink {
    chunks: Mutex<Vec<String>>,
    completes: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks(&self) -> Vec<String> {
        self.chunks.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn completes(&self) -> Vec<String> {
        self.completes.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// The text of the most recent completed turn.
    pub fn last_complete(&self) -> Option<String> {
        self.completes().last().cloned()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send_chunk(&self, text: &str) -> Result<(), UsherError> {
        if let Ok(mut chunks) = self.chunks.lock() {
            chunks.push(text.to_string());
        }
        Ok(())
    }

    async fn send_complete(&self, content: &str) -> Result<(), UsherError> {
        if let Ok(mut completes) = self.completes.lock() {
            completes.push(content.to_string());
        }
        Ok(())
    }
}

/// A small catalog in the flat-file format, for parser and engine fixtures.
pub const SAMPLE_CATALOG: &str = "\
EVENT CATALOG
--------------------------------------------------------------------------------
Name: Jazz Evening
Type: Concert
Location: Mumbai
Date/Days: Saturday
Time: 8:00 PM
Price: \u{20b9}1,500
Description: An intimate evening of live jazz standards.
--------------------------------------------------------------------------------
Name: Sunrise Trek
Type: Trek
Location: Lonavala
Date/Days: Sunday
Time: 5:00 AM
Price: \u{20b9}800
Description: Guided sunrise trek with breakfast included.
--------------------------------------------------------------------------------
Name: Pottery Workshop
Type: Workshop
Location: Pune
Date/Days: Weekends
Time: 11:00 AM
Price: \u{20b9}1,200
Description: Hands-on wheel-throwing for beginners.
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_embedder_is_deterministic() {
        let embedder = StubEmbedder::keyword_based();
        let a = embedder.embed(&["jazz concert".to_string()]).unwrap();
        let b = embedder.embed(&["jazz concert".to_string()]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn shared_words_bring_texts_closer() {
        let embedder = StubEmbedder::keyword_based();
        let vecs = embedder
            .embed(&[
                "jazz music concert".to_string(),
                "live jazz music tonight".to_string(),
                "pottery clay workshop".to_string(),
            ])
            .unwrap();
        let d = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
        };
        assert!(d(&vecs[0], &vecs[1]) < d(&vecs[0], &vecs[2]));
    }

    #[tokio::test]
    async fn recording_sink_captures_sends() {
        let sink = RecordingSink::new();
        sink.send_chunk("hel").await.unwrap();
        sink.send_chunk("lo").await.unwrap();
        sink.send_complete("hello").await.unwrap();
        assert_eq!(sink.chunks(), vec!["hel", "lo"]);
        assert_eq!(sink.last_complete().as_deref(), Some("hello"));
    }
}
