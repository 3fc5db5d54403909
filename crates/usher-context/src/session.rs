// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-caller conversation state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use usher_core::{ChatRole, EventId};

/// One utterance in the conversation, with the wall-clock time it arrived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A booking the caller has started talking about but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingBooking {
    pub event_id: EventId,
    pub quantity: u32,
}

/// Everything the assistant remembers about one caller between turns.
///
/// History and mentioned events are bounded; the store trims both before
/// persisting, so a context read back from the cache is already within
/// bounds. Mentioned events are most-recent-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    pub conversation_history: Vec<Turn>,
    #[serde(default)]
    pub last_mentioned_events: Vec<EventId>,
    #[serde(default)]
    pub pending_booking: Option<PendingBooking>,
    #[serde(default)]
    pub last_search_query: Option<String>,
}

impl SessionContext {
    /// Appends an utterance to the history.
    pub fn add_turn(&mut self, role: ChatRole, content: impl Into<String>) {
        self.conversation_history.push(Turn {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    /// Records that an event came up in conversation. Most recent first,
    /// no duplicates.
    pub fn note_event(&mut self, id: EventId) {
        self.last_mentioned_events.retain(|e| e != &id);
        self.last_mentioned_events.insert(0, id);
    }

    /// Maps an anaphoric phrase in the (lowercased) message to a recently
    /// mentioned event. Returns `None` when nothing was mentioned or the
    /// phrase does not pick out a definite entry.
    pub fn resolve_reference(&self, message: &str) -> Option<EventId> {
        let mentioned = &self.last_mentioned_events;
        if mentioned.is_empty() {
            return None;
        }
        let has = |word: &str| message.split_whitespace().any(|w| w == word);
        if has("this") || has("that") || has("it") {
            return mentioned.first().cloned();
        }
        if has("first") {
            return mentioned.first().cloned();
        }
        if has("second") {
            if mentioned.len() >= 2 {
                return Some(mentioned[1].clone());
            }
            return None;
        }
        if has("last") {
            return mentioned.last().cloned();
        }
        None
    }

    /// A compact digest for the model: up to two recent event ids and the
    /// pending booking, joined with `" | "`. Empty when there is nothing
    /// worth saying.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.last_mentioned_events.is_empty() {
            let ids: Vec<&str> = self
                .last_mentioned_events
                .iter()
                .take(2)
                .map(|id| id.as_str())
                .collect();
            parts.push(format!("Recent events: {}", ids.join(", ")));
        }
        if let Some(pending) = &self.pending_booking {
            parts.push(format!(
                "Pending booking: {} x{}",
                pending.event_id, pending.quantity
            ));
        }
        parts.join(" | ")
    }

    /// Drops oldest history turns and least-recent mentioned events until
    /// both lists fit their bounds.
    pub fn trim(&mut self, history_turns: usize, mentioned_events: usize) {
        if self.conversation_history.len() > history_turns {
            let excess = self.conversation_history.len() - history_turns;
            self.conversation_history.drain(..excess);
        }
        self.last_mentioned_events.truncate(mentioned_events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with(ids: &[&str]) -> SessionContext {
        let mut ctx = SessionContext::default();
        for id in ids.iter().rev() {
            ctx.note_event(EventId((*id).into()));
        }
        ctx
    }

    #[test]
    fn resolve_with_empty_mentions_is_none() {
        let ctx = SessionContext::default();
        assert_eq!(ctx.resolve_reference("book that one"), None);
    }

    #[test]
    fn demonstratives_pick_most_recent() {
        let ctx = ctx_with(&["evt002", "evt001"]);
        assert_eq!(
            ctx.resolve_reference("book this"),
            Some(EventId("evt002".into()))
        );
        assert_eq!(
            ctx.resolve_reference("tell me about it"),
            Some(EventId("evt002".into()))
        );
    }

    #[test]
    fn ordinals_index_into_mentions() {
        let ctx = ctx_with(&["evt003", "evt002", "evt001"]);
        assert_eq!(
            ctx.resolve_reference("the first one"),
            Some(EventId("evt003".into()))
        );
        assert_eq!(
            ctx.resolve_reference("the second one"),
            Some(EventId("evt002".into()))
        );
        assert_eq!(
            ctx.resolve_reference("the last one"),
            Some(EventId("evt001".into()))
        );
    }

    #[test]
    fn second_needs_two_mentions() {
        let ctx = ctx_with(&["evt001"]);
        assert_eq!(ctx.resolve_reference("the second one"), None);
    }

    #[test]
    fn unrecognized_phrase_is_none() {
        let ctx = ctx_with(&["evt001"]);
        assert_eq!(ctx.resolve_reference("something about jazz"), None);
    }

    #[test]
    fn note_event_dedups_and_fronts() {
        let mut ctx = ctx_with(&["evt001", "evt002"]);
        ctx.note_event(EventId("evt002".into()));
        assert_eq!(
            ctx.last_mentioned_events,
            vec![EventId("evt002".into()), EventId("evt001".into())]
        );
    }

    #[test]
    fn trim_drops_oldest_history() {
        let mut ctx = SessionContext::default();
        for i in 0..8 {
            ctx.add_turn(ChatRole::User, format!("turn {i}"));
        }
        ctx.trim(6, 3);
        assert_eq!(ctx.conversation_history.len(), 6);
        assert_eq!(ctx.conversation_history[0].content, "turn 2");
    }

    #[test]
    fn summary_is_compact() {
        let mut ctx = ctx_with(&["evt002", "evt001", "evt003"]);
        ctx.pending_booking = Some(PendingBooking {
            event_id: EventId("evt002".into()),
            quantity: 2,
        });
        assert_eq!(
            ctx.summary(),
            "Recent events: evt002, evt001 | Pending booking: evt002 x2"
        );
    }

    #[test]
    fn empty_summary_for_fresh_context() {
        assert_eq!(SessionContext::default().summary(), "");
    }
}
