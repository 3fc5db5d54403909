// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned replies and deterministic formatting.
//!
//! Deterministic intents never touch the model; their outcomes render
//! through these templates. Search results are capped at two events per
//! reply to stay comfortable for voice delivery.

use usher_catalog::Event;
use usher_ledger::{BookOutcome, Booking, CancelOutcome};
use usher_search::SearchHit;

/// Default system prompt when none is configured.
///
/// Kept under ~100 tokens so it leaves room for context and tool results
/// inside small generation windows.
pub const SYSTEM_PROMPT: &str = "\
You're an event booking assistant. Be conversational, concise (1-2 sentences), and natural.

Guidelines:
- Use context and search results to answer accurately
- Never invent details
- For \"that event\" or \"it\", refer to recently mentioned events
- Keep it brief for voice delivery

You'll get context, search results, and the user's message.";

/// Sent once when the transport opens.
pub const OPEN_GREETING: &str =
    "Hello! I'm your event assistant. Could you share your 10-digit phone number?";
/// Sent after a valid phone number is accepted.
pub const PHONE_ACCEPTED: &str = "Thank you! How may I assist you with events today?";
/// Re-prompt for anything that is not ten digits.
pub const INVALID_PHONE: &str = "I need a 10-digit number. Can you try again?";
/// My-tickets with an empty ledger.
pub const NO_BOOKINGS: &str = "You don't have any bookings yet. Want to explore some events?";
/// Search with nothing above the relevance threshold.
pub const NO_RESULTS: &str = "No events found. Try 'concerts', 'food trails', or 'adventure'.";
/// Last-resort reply when generation fails and there is no tool result.
pub const APOLOGY: &str = "Sorry, I'm having trouble. Can you rephrase?";

pub fn book_reply(outcome: &BookOutcome) -> String {
    match outcome {
        BookOutcome::Confirmed(booking) => format!(
            "Booked! {} on {}. Total: \u{20b9}{} for {} ticket(s). ID: {}",
            booking.event_name,
            booking.event_date,
            booking.total_price,
            booking.quantity,
            booking.booking_id
        ),
        BookOutcome::UnknownEvent { event_id } => {
            format!("Event ID '{event_id}' not found.")
        }
        BookOutcome::Insufficient { event_name, left } => {
            format!("Only {left} tickets left for {event_name}.")
        }
    }
}

pub fn cancel_reply(outcome: &CancelOutcome) -> String {
    match outcome {
        CancelOutcome::Canceled {
            booking_id,
            event_name,
        } => format!(
            "Done! Booking for '{event_name}' (ID: {booking_id}) has been canceled."
        ),
        CancelOutcome::NotFound { booking_id } => {
            format!("Hmm, Booking ID '{booking_id}' not found.")
        }
    }
}

pub fn tickets_reply(bookings: &[Booking]) -> String {
    let lines: Vec<String> = bookings
        .iter()
        .map(|b| format!("\u{2022} {} - {} ({})", b.event_name, b.event_date, b.booking_id))
        .collect();
    format!("Your bookings:\n{}", lines.join("\n"))
}

/// "Found: X on <date> at <location>. Also, Y on <date> at <location>. "
pub fn search_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    let mut formatted = String::from("Found: ");
    for (i, hit) in hits.iter().take(2).enumerate() {
        if i > 0 {
            formatted.push_str(" Also, ");
        }
        formatted.push_str(&format!(
            "{} on {} at {}. ",
            hit.event.name, hit.event.date, hit.event.location
        ));
    }
    formatted.trim_end().to_string()
}

/// Single-event details line for the model's tool result.
pub fn event_details(event: &Event) -> String {
    format!(
        "{} on {} at {} in {}. Price: {}.",
        event.name, event.date, event.time, event.location, event.price
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use usher_catalog::parse_catalog;
    use usher_core::BookingId;

    fn hits() -> Vec<SearchHit> {
        parse_catalog(
            "Name: Jazz Evening\nDate: Saturday\nLocation: Mumbai\n----------\n\
             Name: Rock Night\nDate: Friday\nLocation: Pune\n----------\n\
             Name: Pottery Workshop\nDate: Weekends\nLocation: Pune\n",
        )
        .into_iter()
        .map(|event| SearchHit {
            event,
            relevance: 0.9,
        })
        .collect()
    }

    #[test]
    fn search_results_cap_at_two_events() {
        let text = search_results(&hits());
        assert_eq!(
            text,
            "Found: Jazz Evening on Saturday at Mumbai.  Also, Rock Night on Friday at Pune."
        );
        assert!(!text.contains("Pottery"));
    }

    #[test]
    fn empty_search_results_use_the_no_results_template() {
        assert_eq!(search_results(&[]), NO_RESULTS);
    }

    #[test]
    fn details_line_includes_price() {
        let events = parse_catalog(
            "Name: Jazz Evening\nDate: Saturday\nTime: 8 PM\nLocation: Mumbai\nPrice: \u{20b9}1,500\n",
        );
        assert_eq!(
            event_details(&events[0]),
            "Jazz Evening on Saturday at 8 PM in Mumbai. Price: \u{20b9}1,500."
        );
    }

    #[test]
    fn cancel_replies_carry_done_and_hmm_prefixes() {
        let ok = cancel_reply(&CancelOutcome::Canceled {
            booking_id: BookingId("tic_1".into()),
            event_name: "Jazz Evening".into(),
        });
        assert!(ok.starts_with("Done! "));
        let missing = cancel_reply(&CancelOutcome::NotFound {
            booking_id: BookingId("tic_2".into()),
        });
        assert!(missing.starts_with("Hmm, "));
    }
}
