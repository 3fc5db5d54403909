// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking records and the closed outcomes of ledger operations.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use usher_core::{BookingId, EventId};
use usher_catalog::Event;

/// Per-process booking sequence. Timestamps alone are not unique: two
/// bookings in the same instant would collide, and `cancel` matches by id.
static BOOKING_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_booking_id(now: &chrono::DateTime<Utc>) -> BookingId {
    let seq = BOOKING_SEQ.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("tic_{}_{seq}", now.timestamp_millis()))
}

/// One confirmed booking as stored in the ledger file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: BookingId,
    pub event_id: EventId,
    pub event_name: String,
    pub event_date: String,
    pub event_time: String,
    pub location: String,
    pub quantity: u32,
    pub price_per_ticket: u64,
    pub total_price: u64,
    pub booked_at: String,
    pub status: String,
}

impl Booking {
    /// Builds a confirmed booking for `quantity` tickets of `event`,
    /// stamped with the current time.
    pub fn confirm(event: &Event, quantity: u32) -> Self {
        let now = Utc::now();
        let price = event.price_in_rupees();
        Self {
            booking_id: next_booking_id(&now),
            event_id: event.id.clone(),
            event_name: event.name.clone(),
            event_date: event.date.clone(),
            event_time: event.time.clone(),
            location: event.location.clone(),
            quantity,
            price_per_ticket: price,
            total_price: price * u64::from(quantity),
            booked_at: now.to_rfc3339(),
            status: "confirmed".to_string(),
        }
    }
}

/// Result of a booking attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookOutcome {
    Confirmed(Booking),
    UnknownEvent { event_id: EventId },
    Insufficient { event_name: String, left: u32 },
}

/// Result of a cancellation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Canceled {
        booking_id: BookingId,
        event_name: String,
    },
    NotFound {
        booking_id: BookingId,
    },
}

/// Result of a my-tickets lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketsOutcome {
    Found(Vec<Booking>),
    Empty,
}
