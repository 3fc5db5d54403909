// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context persistence over the TTL cache.
//!
//! Persistence is best-effort in both directions: a read failure hands the
//! session a fresh context, a write failure is logged and swallowed. The
//! conversation must survive a cache outage.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use usher_core::{PhoneNumber, TtlCache};

use crate::session::SessionContext;

/// Loads and saves [`SessionContext`] keyed by phone number.
pub struct ContextStore {
    cache: Arc<dyn TtlCache>,
    history_turns: usize,
    mentioned_events: usize,
    ttl: Duration,
}

impl ContextStore {
    pub fn new(
        cache: Arc<dyn TtlCache>,
        history_turns: usize,
        mentioned_events: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            history_turns,
            mentioned_events,
            ttl,
        }
    }

    fn key(phone: &PhoneNumber) -> String {
        format!("context:{phone}")
    }

    /// Returns the caller's stored context, or a fresh one on miss or any
    /// read failure.
    pub async fn load(&self, phone: &PhoneNumber) -> SessionContext {
        match self.cache.get(&Self::key(phone)).await {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(ctx) => ctx,
                Err(e) => {
                    warn!(%phone, error = %e, "stored context unreadable, starting fresh");
                    SessionContext::default()
                }
            },
            None => SessionContext::default(),
        }
    }

    /// Trims the context to its bounds and persists it, refreshing the TTL.
    pub async fn save(&self, phone: &PhoneNumber, ctx: &mut SessionContext) {
        ctx.trim(self.history_turns, self.mentioned_events);
        match serde_json::to_string(ctx) {
            Ok(raw) => self.cache.set(&Self::key(phone), raw, self.ttl).await,
            Err(e) => warn!(%phone, error = %e, "context not persisted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usher_cache::MemoryCache;
    use usher_core::{ChatRole, EventId};

    fn phone() -> PhoneNumber {
        PhoneNumber::parse("9876543210").unwrap()
    }

    fn store() -> ContextStore {
        ContextStore::new(
            Arc::new(MemoryCache::new(16)),
            6,
            3,
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn load_miss_returns_fresh_context() {
        let store = store();
        let ctx = store.load(&phone()).await;
        assert!(ctx.conversation_history.is_empty());
        assert!(ctx.pending_booking.is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = store();
        let mut ctx = SessionContext::default();
        ctx.add_turn(ChatRole::User, "any rock concerts?");
        ctx.note_event(EventId("evt001".into()));
        store.save(&phone(), &mut ctx).await;

        let loaded = store.load(&phone()).await;
        assert_eq!(loaded.conversation_history.len(), 1);
        assert_eq!(loaded.last_mentioned_events, vec![EventId("evt001".into())]);
    }

    #[tokio::test]
    async fn save_enforces_bounds() {
        let store = store();
        let mut ctx = SessionContext::default();
        for i in 0..10 {
            ctx.add_turn(ChatRole::User, format!("turn {i}"));
            ctx.note_event(EventId(format!("evt{i:03}")));
        }
        store.save(&phone(), &mut ctx).await;

        let loaded = store.load(&phone()).await;
        assert_eq!(loaded.conversation_history.len(), 6);
        assert_eq!(loaded.last_mentioned_events.len(), 3);
        assert_eq!(loaded.last_mentioned_events[0], EventId("evt009".into()));
    }

    #[tokio::test]
    async fn corrupt_stored_context_starts_fresh() {
        let cache = Arc::new(MemoryCache::new(16));
        cache
            .set("context:9876543210", "{not json".into(), Duration::from_secs(60))
            .await;
        let store = ContextStore::new(cache, 6, 3, Duration::from_secs(3600));
        let ctx = store.load(&phone()).await;
        assert!(ctx.conversation_history.is_empty());
    }
}
