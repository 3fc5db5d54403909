// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The search engine: embeds the catalog at startup, answers similarity
//! queries, and caches result sets through the TTL cache.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use usher_catalog::{Event, EventStore};
use usher_core::{Embedder, EventId, TtlCache, UsherError};

use crate::index::VectorIndex;

/// One search result: the event plus its relevance in `(0, 1]`.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub event: Event,
    pub relevance: f32,
}

/// Cached form of a result set. Events are looked up again on read so a
/// cache entry never carries stale record copies.
#[derive(Serialize, Deserialize)]
struct CachedHit {
    event_id: EventId,
    relevance: f32,
}

/// Semantic search over the event catalog.
///
/// Built once at startup; read-only afterwards and shared across sessions.
pub struct SearchEngine {
    store: Arc<EventStore>,
    embedder: Arc<dyn Embedder>,
    index: VectorIndex,
    cache: Arc<dyn TtlCache>,
    cache_ttl: Duration,
    relevance_threshold: f32,
}

impl SearchEngine {
    /// Embeds every event's searchable text and builds the index.
    ///
    /// Index position i corresponds to `store.events()[i]`.
    pub fn build(
        store: Arc<EventStore>,
        embedder: Arc<dyn Embedder>,
        cache: Arc<dyn TtlCache>,
        relevance_threshold: f32,
        cache_ttl: Duration,
    ) -> Result<Self, UsherError> {
        let texts: Vec<String> = store
            .events()
            .iter()
            .map(Event::searchable_text)
            .collect();
        let embeddings = embedder.embed(&texts)?;

        let mut index = VectorIndex::new(embedder.dimension());
        for embedding in embeddings {
            index.add(embedding)?;
        }
        info!(events = index.len(), "search index built");

        Ok(Self {
            store,
            embedder,
            index,
            cache,
            cache_ttl,
            relevance_threshold,
        })
    }

    /// The `top_k` most relevant events for a free-text query.
    ///
    /// Results are read through the cache; only non-empty result sets are
    /// written back, so a transiently empty answer never sticks.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, UsherError> {
        let key = Self::cache_key(query, top_k);
        if let Some(hits) = self.cached_hits(&key).await {
            debug!(query, "search served from cache");
            return Ok(hits);
        }

        let embeddings = self.embedder.embed(&[query.to_string()])?;
        let query_embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| UsherError::Search("embedder returned no vectors".to_string()))?;

        let hits = self.rank(&query_embedding, top_k, None);
        if !hits.is_empty() {
            self.store_hits(&key, &hits).await;
        }
        Ok(hits)
    }

    /// Events similar to `id`, excluding `id` itself.
    ///
    /// Queries with the source event's own indexed vector at `top_k + 1`
    /// so the inevitable self-match can be dropped.
    pub async fn find_similar(
        &self,
        id: &EventId,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, UsherError> {
        let position = self
            .store
            .events()
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| UsherError::Search(format!("event {id} is not in the index")))?;
        let vector = self
            .index
            .vector(position)
            .ok_or_else(|| UsherError::Search(format!("no vector at position {position}")))?
            .to_vec();

        let mut hits = self.rank(&vector, top_k + 1, Some(position));
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Looks up an event by id.
    pub fn event_by_id(&self, id: &EventId) -> Option<&Event> {
        self.store.get(id)
    }

    /// Ranks index entries against a query vector: relevance `1/(1+d)`,
    /// threshold filter, nearest first.
    fn rank(&self, query: &[f32], k: usize, exclude: Option<usize>) -> Vec<SearchHit> {
        self.index
            .nearest(query, k)
            .into_iter()
            .filter(|(pos, _)| Some(*pos) != exclude)
            .filter_map(|(pos, distance)| {
                let relevance = 1.0 / (1.0 + distance);
                if relevance <= self.relevance_threshold {
                    return None;
                }
                let event = self.store.events().get(pos)?.clone();
                Some(SearchHit { event, relevance })
            })
            .collect()
    }

    fn cache_key(query: &str, top_k: usize) -> String {
        let normalized = query.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
        let mut hasher = Sha256::new();
        hasher.update(format!("search:{normalized}:{top_k}"));
        format!("{:x}", hasher.finalize())
    }

    async fn cached_hits(&self, key: &str) -> Option<Vec<SearchHit>> {
        let raw = self.cache.get(key).await?;
        let cached: Vec<CachedHit> = match serde_json::from_str(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "cached search result unreadable, recomputing");
                return None;
            }
        };
        let hits: Vec<SearchHit> = cached
            .into_iter()
            .filter_map(|c| {
                let event = self.store.get(&c.event_id)?.clone();
                Some(SearchHit {
                    event,
                    relevance: c.relevance,
                })
            })
            .collect();
        Some(hits)
    }

    async fn store_hits(&self, key: &str, hits: &[SearchHit]) {
        let cached: Vec<CachedHit> = hits
            .iter()
            .map(|h| CachedHit {
                event_id: h.event.id.clone(),
                relevance: h.relevance,
            })
            .collect();
        match serde_json::to_string(&cached) {
            Ok(raw) => self.cache.set(key, raw, self.cache_ttl).await,
            Err(e) => warn!(error = %e, "search result not cached"),
        }
    }
}
