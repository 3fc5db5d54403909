// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pattern-driven intent extraction.
//!
//! Extraction is a total function evaluated in fixed priority order; the
//! first matching pattern wins and a message matching nothing becomes a
//! search. An unresolvable "book that" degrades to a search on the literal
//! message rather than a clarifying question.

use std::sync::LazyLock;

use regex::Regex;
use usher_context::SessionContext;
use usher_core::{BookingId, EventId};

static CANCEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:cancel|delete|remove)\b.*?(tic_\w+)").unwrap()
});
static BOOK_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:book|buy|purchase|reserve|get)\b.*?(evt\d+)").unwrap()
});
static BOOK_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:book|buy|purchase|reserve|get)\s+(?:that|it|this)\b")
        .unwrap()
});
static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+)\s*(?:ticket|seat|spot)").unwrap()
});
static MY_TICKETS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:my|show|view|list|get)\b.*?(?:ticket|booking)")
        .unwrap()
});
static SIMILAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:similar|like|related)\b").unwrap()
});
static DETAILS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:price|cost|how much|details|info|tell me about)\b")
        .unwrap()
});
/// Anaphoric cues that warrant reference resolution and context injection.
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:that|it|this|first|second|last)\b").unwrap()
});

/// The classified purpose of one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Cancel { booking_id: BookingId },
    Book { event_id: EventId, quantity: u32 },
    MyTickets,
    Similar { event_id: EventId },
    Details { event_id: EventId },
    Search { query: String },
}

impl Intent {
    /// Short name used in logs and cache keys.
    pub fn tag(&self) -> &'static str {
        match self {
            Intent::Cancel { .. } => "cancel",
            Intent::Book { .. } => "book",
            Intent::MyTickets => "my_tickets",
            Intent::Similar { .. } => "similar",
            Intent::Details { .. } => "details",
            Intent::Search { .. } => "search",
        }
    }
}

/// True when the message leans on recent conversation ("that", "first", ...).
pub fn has_anaphoric_cue(message: &str) -> bool {
    REFERENCE_RE.is_match(&message.to_lowercase())
}

fn quantity(lower: &str) -> u32 {
    QUANTITY_RE
        .captures(lower)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|&q| q >= 1)
        .unwrap_or(1)
}

/// Maps a cleaned message (plus context for reference resolution) to an
/// intent. First match in priority order wins.
pub fn extract(message: &str, context: &SessionContext) -> Intent {
    let lower = message.to_lowercase();

    if let Some(captures) = CANCEL_RE.captures(&lower) {
        if let Some(id) = captures.get(1) {
            return Intent::Cancel {
                booking_id: BookingId(id.as_str().to_string()),
            };
        }
    }

    if let Some(captures) = BOOK_ID_RE.captures(&lower) {
        if let Some(id) = captures.get(1) {
            return Intent::Book {
                event_id: EventId(id.as_str().to_string()),
                quantity: quantity(&lower),
            };
        }
    }

    if BOOK_REF_RE.is_match(&lower) {
        if let Some(event_id) = context.resolve_reference(&lower) {
            return Intent::Book {
                event_id,
                quantity: quantity(&lower),
            };
        }
        // Unresolvable reference: fall through.
    }

    if MY_TICKETS_RE.is_match(&lower) {
        return Intent::MyTickets;
    }

    if SIMILAR_RE.is_match(&lower) {
        if let Some(event_id) = context.resolve_reference(&lower) {
            return Intent::Similar { event_id };
        }
    }

    if DETAILS_RE.is_match(&lower) {
        if let Some(event_id) = context.resolve_reference(&lower) {
            return Intent::Details { event_id };
        }
    }

    Intent::Search {
        query: message.to_string(),
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
    fn cancel_with_booking_id() {
        let intent = extract("please cancel tic_1699999999", &SessionContext::default());
        assert_eq!(
            intent,
            Intent::Cancel {
                booking_id: BookingId("tic_1699999999".into())
            }
        );
    }

    #[test]
    fn cancel_wins_over_book() {
        // "get" also matches the book verb set; cancel is checked first.
        let intent = extract("remove tic_123 and get evt001", &SessionContext::default());
        assert!(matches!(intent, Intent::Cancel { .. }));
    }

    #[test]
    fn book_with_explicit_event_id_and_quantity() {
        let intent = extract("book 3 tickets for evt007", &SessionContext::default());
        assert_eq!(
            intent,
            Intent::Book {
                event_id: EventId("evt007".into()),
                quantity: 3
            }
        );
    }

    #[test]
    fn book_quantity_defaults_to_one() {
        let intent = extract("Book evt007", &SessionContext::default());
        assert_eq!(
            intent,
            Intent::Book {
                event_id: EventId("evt007".into()),
                quantity: 1
            }
        );
    }

    #[test]
    fn book_that_resolves_through_context() {
        let ctx = ctx_with(&["evt007"]);
        let intent = extract("book that", &ctx);
        assert_eq!(
            intent,
            Intent::Book {
                event_id: EventId("evt007".into()),
                quantity: 1
            }
        );
    }

    #[test]
    fn book_that_without_context_degrades_to_search() {
        let intent = extract("book that", &SessionContext::default());
        assert_eq!(
            intent,
            Intent::Search {
                query: "book that".into()
            }
        );
    }

    #[test]
    fn my_tickets_phrases() {
        for msg in ["show my tickets", "list my bookings", "view tickets please"] {
            assert_eq!(extract(msg, &SessionContext::default()), Intent::MyTickets);
        }
    }

    #[test]
    fn similar_with_resolvable_reference() {
        let ctx = ctx_with(&["evt002"]);
        let intent = extract("anything similar to that?", &ctx);
        assert_eq!(
            intent,
            Intent::Similar {
                event_id: EventId("evt002".into())
            }
        );
    }

    #[test]
    fn similar_without_reference_is_a_search() {
        let intent = extract("anything similar to jazz?", &SessionContext::default());
        assert!(matches!(intent, Intent::Search { .. }));
    }

    #[test]
    fn details_with_ordinal_reference() {
        let ctx = ctx_with(&["evt001", "evt002"]);
        let intent = extract("how much is the second one?", &ctx);
        assert_eq!(
            intent,
            Intent::Details {
                event_id: EventId("evt002".into())
            }
        );
    }

    #[test]
    fn plain_message_falls_back_to_search() {
        let intent = extract("find me concerts in Mumbai", &SessionContext::default());
        assert_eq!(
            intent,
            Intent::Search {
                query: "find me concerts in Mumbai".into()
            }
        );
    }

    #[test]
    fn anaphoric_cue_detection() {
        assert!(has_anaphoric_cue("tell me about that one"));
        assert!(has_anaphoric_cue("the FIRST one"));
        assert!(!has_anaphoric_cue("concerts in mumbai"));
    }
}
