// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end conversation scenarios against in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use usher_agent::{ConversationSession, SessionDeps, SessionOptions};
use usher_cache::MemoryCache;
use usher_catalog::{parse_catalog, EventStore};
use usher_context::ContextStore;
use usher_core::{GenerationProvider, TtlCache};
use usher_ledger::BookingLedger;
use usher_search::SearchEngine;
use usher_test_utils::{FailingProvider, RecordingSink, ScriptedProvider, StubEmbedder, SAMPLE_CATALOG};

struct Harness {
    session: ConversationSession,
    sink: Arc<RecordingSink>,
    _dir: tempfile::TempDir,
}

fn harness(provider: Arc<dyn GenerationProvider>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(EventStore::new(parse_catalog(SAMPLE_CATALOG)));
    let cache: Arc<dyn TtlCache> = Arc::new(MemoryCache::new(256));
    let engine = Arc::new(
        SearchEngine::build(
            store.clone(),
            Arc::new(StubEmbedder::keyword_based()),
            cache.clone(),
            0.3,
            Duration::from_secs(300),
        )
        .unwrap(),
    );
    let ledger = Arc::new(BookingLedger::new(dir.path().join("bookings.json"), store));
    let contexts = Arc::new(ContextStore::new(
        cache.clone(),
        6,
        3,
        Duration::from_secs(3600),
    ));
    let sink = Arc::new(RecordingSink::new());
    let session = ConversationSession::new(
        SessionDeps {
            engine,
            ledger,
            contexts,
            provider,
            cache,
        },
        SessionOptions {
            system_prompt: "You are a concise event assistant.".to_string(),
            max_reply_tokens: 120,
            top_k: 5,
            similar_top_k: 3,
            reply_ttl: Duration::from_secs(300),
            generation_timeout: Duration::from_secs(5),
        },
        sink.clone(),
    );
    Harness {
        session,
        sink,
        _dir: dir,
    }
}

#[tokio::test]
async fn greeting_then_phone_gate() {
    let mut h = harness(Arc::new(ScriptedProvider::new("ok")));
    h.session.open().await.unwrap();
    assert!(h.sink.last_complete().unwrap().contains("10-digit"));

    h.session.handle_message("hello there").await.unwrap();
    assert_eq!(
        h.sink.last_complete().unwrap(),
        "I need a 10-digit number. Can you try again?"
    );

    h.session.handle_message("12345").await.unwrap();
    assert!(h.sink.last_complete().unwrap().contains("10-digit number"));

    h.session.handle_message("1234567890").await.unwrap();
    assert_eq!(
        h.sink.last_complete().unwrap(),
        "Thank you! How may I assist you with events today?"
    );
}

#[tokio::test]
async fn search_streams_a_generated_reply() {
    let mut h = harness(Arc::new(ScriptedProvider::new(
        "Jazz Evening is on this Saturday in Mumbai.",
    )));
    h.session.handle_message("1234567890").await.unwrap();
    h.session
        .handle_message("find me concerts in Mumbai")
        .await
        .unwrap();

    // Streamed fragments, then a final complete with the accumulated text.
    assert!(!h.sink.chunks().is_empty());
    let reply = h.sink.last_complete().unwrap();
    assert_eq!(reply, "Jazz Evening is on this Saturday in Mumbai.");
    assert_eq!(h.sink.chunks().concat(), reply);
}

#[tokio::test]
async fn book_that_resolves_the_top_search_result() {
    let mut h = harness(Arc::new(ScriptedProvider::new("Found some events for you.")));
    h.session.handle_message("1234567890").await.unwrap();
    h.session
        .handle_message("find me jazz concerts in Mumbai")
        .await
        .unwrap();

    h.session.handle_message("book that").await.unwrap();
    let reply = h.sink.last_complete().unwrap();
    assert!(reply.starts_with("Booked! Jazz Evening"), "got: {reply}");
    assert!(reply.contains("for 1 ticket(s)"));
    assert!(reply.contains("ID: tic_"));

    h.session.handle_message("show my tickets").await.unwrap();
    let tickets = h.sink.last_complete().unwrap();
    assert!(tickets.starts_with("Your bookings:"));
    assert!(tickets.contains("Jazz Evening"));
}

#[tokio::test]
async fn cancel_of_unknown_booking_mutates_nothing() {
    let mut h = harness(Arc::new(ScriptedProvider::new("ok")));
    h.session.handle_message("1234567890").await.unwrap();

    h.session
        .handle_message("cancel tic_1699999999")
        .await
        .unwrap();
    assert_eq!(
        h.sink.last_complete().unwrap(),
        "Hmm, Booking ID 'tic_1699999999' not found."
    );

    h.session.handle_message("show my tickets").await.unwrap();
    assert!(h.sink.last_complete().unwrap().contains("don't have any bookings"));
}

#[tokio::test]
async fn booking_round_trip_restores_availability() {
    let mut h = harness(Arc::new(ScriptedProvider::new("Here are some events.")));
    h.session.handle_message("1234567890").await.unwrap();
    h.session.handle_message("book 2 tickets for evt001").await.unwrap();

    let reply = h.sink.last_complete().unwrap();
    assert!(reply.contains("Total: \u{20b9}3000 for 2 ticket(s)"), "got: {reply}");
    let booking_id = reply.rsplit("ID: ").next().unwrap().trim().to_string();

    h.session
        .handle_message(&format!("cancel {booking_id}"))
        .await
        .unwrap();
    assert!(h.sink.last_complete().unwrap().starts_with("Done!"));

    h.session.handle_message("show my tickets").await.unwrap();
    assert!(h.sink.last_complete().unwrap().contains("don't have any bookings"));
}

#[tokio::test]
async fn identical_searches_hit_the_reply_cache() {
    let mut h = harness(Arc::new(ScriptedProvider::new("Two good options this week.")));
    h.session.handle_message("1234567890").await.unwrap();

    h.session.handle_message("weekend treks").await.unwrap();
    let first = h.sink.last_complete().unwrap();
    assert_eq!(h.session.cache_stats(), (0, 1));

    h.session.handle_message("weekend treks").await.unwrap();
    let second = h.sink.last_complete().unwrap();
    assert_eq!(first, second);
    assert_eq!(h.session.cache_stats(), (1, 1));
}

#[tokio::test]
async fn provider_failure_falls_back_to_the_tool_result() {
    let mut h = harness(Arc::new(FailingProvider));
    h.session.handle_message("1234567890").await.unwrap();
    h.session
        .handle_message("find me jazz concerts in Mumbai")
        .await
        .unwrap();

    let reply = h.sink.last_complete().unwrap();
    assert!(reply.starts_with("Found: "), "got: {reply}");
    assert!(reply.contains("Jazz Evening"));

    // Failed generations must not be cached as replies.
    h.session
        .handle_message("find me jazz concerts in Mumbai")
        .await
        .unwrap();
    assert_eq!(h.session.cache_stats(), (0, 2));
}

#[tokio::test]
async fn booking_clears_a_pending_booking() {
    let mut h = harness(Arc::new(ScriptedProvider::new("ok")));
    h.session.handle_message("1234567890").await.unwrap();
    h.session.handle_message("book evt002").await.unwrap();
    let reply = h.sink.last_complete().unwrap();
    assert!(reply.starts_with("Booked! Sunrise Trek"), "got: {reply}");
}
