// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-connection conversation state machine.
//!
//! One session per transport connection; turns within a session are
//! strictly sequential. The session starts by collecting a phone number
//! and never leaves the conversing state once it has one. Every turn,
//! whatever goes wrong inside it, ends with a send to the sink.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use usher_context::{ContextStore, SessionContext};
use usher_core::{
    ChatMessage, ChatRole, EventId, GenerationProvider, PhoneNumber, ReplySink, TtlCache,
    UsherError,
};
use usher_ledger::{BookOutcome, BookingLedger, TicketsOutcome};
use usher_search::{SearchEngine, SearchHit};

use crate::intent::{self, Intent};
use crate::templates;

/// Everything a session borrows from the application. Built once at
/// startup and shared read-only across connections.
#[derive(Clone)]
pub struct SessionDeps {
    pub engine: Arc<SearchEngine>,
    pub ledger: Arc<BookingLedger>,
    pub contexts: Arc<ContextStore>,
    pub provider: Arc<dyn GenerationProvider>,
    pub cache: Arc<dyn TtlCache>,
}

/// Per-session tunables, lifted from config at startup.
#[derive(Clone)]
pub struct SessionOptions {
    pub system_prompt: String,
    pub max_reply_tokens: u32,
    pub top_k: usize,
    pub similar_top_k: usize,
    pub reply_ttl: Duration,
    pub generation_timeout: Duration,
}

enum State {
    AwaitingPhone,
    Conversing {
        phone: PhoneNumber,
        context: SessionContext,
    },
}

/// The conversation orchestrator for one connection.
pub struct ConversationSession {
    deps: SessionDeps,
    opts: SessionOptions,
    sink: Arc<dyn ReplySink>,
    state: State,
    cache_hits: u64,
    cache_misses: u64,
}

impl ConversationSession {
    pub fn new(deps: SessionDeps, opts: SessionOptions, sink: Arc<dyn ReplySink>) -> Self {
        Self {
            deps,
            opts,
            sink,
            state: State::AwaitingPhone,
            cache_hits: 0,
            cache_misses: 0,
        }
    }

    /// Greets the caller when the transport opens.
    pub async fn open(&self) -> Result<(), UsherError> {
        self.sink.send_complete(templates::OPEN_GREETING).await
    }

    /// Logs cache effectiveness when the transport closes.
    pub fn close(&self) {
        let total = self.cache_hits + self.cache_misses;
        if total > 0 {
            info!(
                hits = self.cache_hits,
                misses = self.cache_misses,
                "session closed"
            );
        }
    }

    /// (hits, misses) of the reply cache, for observability and tests.
    pub fn cache_stats(&self) -> (u64, u64) {
        (self.cache_hits, self.cache_misses)
    }

    /// Processes one inbound message. Errors indicate a broken transport;
    /// everything else is handled inside and answered through the sink.
    pub async fn handle_message(&mut self, raw: &str) -> Result<(), UsherError> {
        let message = normalize_whitespace(raw);

        match &mut self.state {
            State::AwaitingPhone => match PhoneNumber::parse(&message) {
                Some(phone) => {
                    let context = self.deps.contexts.load(&phone).await;
                    info!(%phone, "caller identified");
                    self.state = State::Conversing { phone, context };
                    self.sink.send_complete(templates::PHONE_ACCEPTED).await
                }
                None => self.sink.send_complete(templates::INVALID_PHONE).await,
            },
            State::Conversing { phone, context } => {
                // Borrow the pieces apart so the turn logic can hold them
                // alongside &mut self fields.
                let phone = phone.clone();
                let mut context = std::mem::take(context);
                let result = self.converse(&phone, &mut context, &message).await;
                if let State::Conversing { context: slot, .. } = &mut self.state {
                    *slot = context;
                }
                result
            }
        }
    }

    async fn converse(
        &mut self,
        phone: &PhoneNumber,
        context: &mut SessionContext,
        message: &str,
    ) -> Result<(), UsherError> {
        context.add_turn(ChatRole::User, message);
        self.deps.contexts.save(phone, context).await;

        let intent = intent::extract(message, context);
        debug!(intent = intent.tag(), "intent extracted");

        match intent {
            Intent::Cancel { booking_id } => {
                let reply = match self.deps.ledger.cancel(phone, &booking_id).await {
                    Ok(outcome) => templates::cancel_reply(&outcome),
                    Err(e) => {
                        warn!(error = %e, "cancellation failed");
                        templates::APOLOGY.to_string()
                    }
                };
                self.sink.send_complete(&reply).await
            }
            Intent::Book { event_id, quantity } => {
                let reply = match self.deps.ledger.book(phone, &event_id, quantity).await {
                    Ok(outcome) => {
                        if matches!(outcome, BookOutcome::Confirmed(_)) {
                            context.pending_booking = None;
                            self.deps.contexts.save(phone, context).await;
                        }
                        templates::book_reply(&outcome)
                    }
                    Err(e) => {
                        warn!(error = %e, "booking failed");
                        templates::APOLOGY.to_string()
                    }
                };
                self.sink.send_complete(&reply).await
            }
            Intent::MyTickets => {
                let reply = match self.deps.ledger.my_tickets(phone).await {
                    Ok(TicketsOutcome::Found(bookings)) => templates::tickets_reply(&bookings),
                    Ok(TicketsOutcome::Empty) => templates::NO_BOOKINGS.to_string(),
                    Err(e) => {
                        warn!(error = %e, "ticket lookup failed");
                        templates::APOLOGY.to_string()
                    }
                };
                self.sink.send_complete(&reply).await
            }
            Intent::Similar { event_id } => {
                let tool_result = match self
                    .deps
                    .engine
                    .find_similar(&event_id, self.opts.similar_top_k)
                    .await
                {
                    Ok(hits) if !hits.is_empty() => {
                        set_mentioned(context, &hits);
                        templates::search_results(&hits)
                    }
                    Ok(_) => "Couldn't find similar events.".to_string(),
                    Err(e) => {
                        warn!(error = %e, "similarity lookup failed");
                        "Couldn't find similar events.".to_string()
                    }
                };
                self.generate(phone, context, message, "similar", Some(tool_result))
                    .await
            }
            Intent::Details { event_id } => {
                let tool_result = match self.deps.engine.event_by_id(&event_id) {
                    Some(event) => {
                        let line = templates::event_details(event);
                        context.last_mentioned_events = vec![event.id.clone()];
                        line
                    }
                    None => "Event not found.".to_string(),
                };
                self.generate(phone, context, message, "details", Some(tool_result))
                    .await
            }
            Intent::Search { query } => {
                context.last_search_query = Some(query.clone());
                let tool_result = match self.deps.engine.search(&query, self.opts.top_k).await {
                    Ok(hits) if !hits.is_empty() => {
                        set_mentioned(context, &hits);
                        templates::search_results(&hits)
                    }
                    Ok(_) => templates::NO_RESULTS.to_string(),
                    Err(e) => {
                        warn!(error = %e, "search failed");
                        templates::NO_RESULTS.to_string()
                    }
                };
                self.generate(phone, context, message, "search", Some(tool_result))
                    .await
            }
        }
    }

    /// Generates the reply for a language intent: reply cache first, then a
    /// streamed provider call bounded by the generation timeout, with the
    /// tool result as the fallback of last resort.
    async fn generate(
        &mut self,
        phone: &PhoneNumber,
        context: &mut SessionContext,
        message: &str,
        intent_tag: &str,
        tool_result: Option<String>,
    ) -> Result<(), UsherError> {
        let cache_key = reply_cache_key(
            intent_tag,
            message,
            tool_result.as_deref(),
            &context.last_mentioned_events,
        );

        if let Some(cached) = self.deps.cache.get(&cache_key).await {
            self.cache_hits += 1;
            debug!("reply served from cache");
            self.sink.send_complete(&cached).await?;
            context.add_turn(ChatRole::Assistant, cached);
            self.deps.contexts.save(phone, context).await;
            return Ok(());
        }
        self.cache_misses += 1;

        let mut messages = vec![ChatMessage::system(self.opts.system_prompt.as_str())];
        if intent::has_anaphoric_cue(message) {
            let summary = context.summary();
            if !summary.is_empty() {
                messages.push(ChatMessage::system(format!("Context: {summary}")));
            }
        }
        if let Some(result) = &tool_result {
            messages.push(ChatMessage::system(format!("Results: {result}")));
        }
        messages.push(ChatMessage::user(message));

        let streamed = tokio::time::timeout(self.opts.generation_timeout, async {
            let mut stream = self
                .deps
                .provider
                .stream(&messages, self.opts.max_reply_tokens)
                .await?;
            let mut full = String::new();
            while let Some(fragment) = stream.next().await {
                let fragment = fragment?;
                self.sink.send_chunk(&fragment).await?;
                full.push_str(&fragment);
            }
            Ok::<String, UsherError>(full)
        })
        .await;

        match streamed {
            Ok(Ok(full)) if !full.trim().is_empty() => {
                self.sink.send_complete(&full).await?;
                self.deps
                    .cache
                    .set(&cache_key, full.clone(), self.opts.reply_ttl)
                    .await;
                context.add_turn(ChatRole::Assistant, full);
                self.deps.contexts.save(phone, context).await;
                Ok(())
            }
            other => {
                match other {
                    Err(_) => warn!(
                        timeout = ?self.opts.generation_timeout,
                        "generation timed out"
                    ),
                    Ok(Err(e)) => warn!(error = %e, "generation failed"),
                    Ok(Ok(_)) => warn!("generation produced no text"),
                }
                // Failed or empty generations are never cached.
                let fallback = tool_result.unwrap_or_else(|| templates::APOLOGY.to_string());
                self.sink.send_complete(&fallback).await?;
                self.deps.contexts.save(phone, context).await;
                Ok(())
            }
        }
    }
}

fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replaces the mentioned-events list with the result ids, best first, so
/// "the first one" keeps pointing at the top result.
fn set_mentioned(context: &mut SessionContext, hits: &[SearchHit]) {
    context.last_mentioned_events = hits.iter().map(|h| h.event.id.clone()).collect();
}

fn reply_cache_key(
    intent_tag: &str,
    message: &str,
    tool_result: Option<&str>,
    mentioned: &[EventId],
) -> String {
    let digest = mentioned
        .iter()
        .map(EventId::as_str)
        .collect::<Vec<_>>()
        .join(",");
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "reply:{intent_tag}:{message}:{}:{digest}",
        tool_result.unwrap_or("")
    ));
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(
            normalize_whitespace("  book   that \n one "),
            "book that one"
        );
    }

    #[test]
    fn reply_cache_key_varies_with_every_input() {
        let base = reply_cache_key("search", "jazz", Some("Found: X"), &[]);
        assert_ne!(base, reply_cache_key("details", "jazz", Some("Found: X"), &[]));
        assert_ne!(base, reply_cache_key("search", "rock", Some("Found: X"), &[]));
        assert_ne!(base, reply_cache_key("search", "jazz", None, &[]));
        assert_ne!(
            base,
            reply_cache_key("search", "jazz", Some("Found: X"), &[EventId("evt001".into())])
        );
        assert_eq!(base, reply_cache_key("search", "jazz", Some("Found: X"), &[]));
    }
}
