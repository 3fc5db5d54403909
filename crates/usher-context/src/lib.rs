// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-caller session context: bounded conversation history, recently
//! mentioned events, anaphoric reference resolution, and best-effort
//! persistence through the TTL cache.

mod session;
mod store;

pub use session::{PendingBooking, SessionContext, Turn};
pub use store::ContextStore;
