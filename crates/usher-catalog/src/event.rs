// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event record produced by the catalog parser.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use usher_core::EventId;

/// Placeholder for catalog fields the source file left blank.
pub const FIELD_TBA: &str = "TBA";

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("amount regex is valid"));

/// A single event from the catalog. Immutable once loaded; ticket
/// availability lives in the [`EventStore`](crate::EventStore), not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Stable catalog identifier, assigned sequentially at parse time.
    pub id: EventId,
    pub name: String,
    /// Event category ("Concert", "Food Trail", ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    /// Date or recurring days, as printed in the catalog.
    pub date: String,
    pub time: String,
    /// Display price string, possibly with currency symbol and grouping.
    pub price: String,
    pub description: String,
}

impl Event {
    /// The text that gets embedded for semantic search.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name, self.kind, self.location, self.description
        )
    }

    /// Parses the rupee amount out of the display price string.
    ///
    /// `"₹1,500 per person"` parses as `1500`. Unparseable prices are
    /// treated as free rather than failing a booking.
    pub fn price_in_rupees(&self) -> u64 {
        AMOUNT_RE
            .find(&self.price)
            .and_then(|m| m.as_str().replace(',', "").parse().ok())
            .unwrap_or(0)
    }

    /// One-line digest used in tool results: name | date | location | price.
    pub fn brief(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            self.name, self.date, self.location, self.price
        )
    }
}
