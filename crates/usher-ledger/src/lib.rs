// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking ledger: confirmed bookings persisted to a JSON file keyed by
//! phone number, with per-phone serialization of mutations.

mod booking;
mod ledger;

pub use booking::{BookOutcome, Booking, CancelOutcome, TicketsOutcome};
pub use ledger::BookingLedger;
