// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event catalog: plain-text record parsing and the shared event store.
//!
//! The catalog is a human-edited text file of `Key: Value` records separated
//! by dashed lines. [`parse_catalog`] turns it into [`Event`] records and
//! [`EventStore`] holds them alongside ticket availability counters.

mod event;
mod parser;
mod store;

pub use event::{Event, FIELD_TBA};
pub use parser::parse_catalog;
pub use store::{EventStore, ReserveError, DEFAULT_AVAILABILITY};
