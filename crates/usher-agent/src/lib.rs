// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation orchestration for the Usher booking assistant.
//!
//! Maps user messages to intents, runs deterministic intents against the
//! booking ledger directly, and drives the generation provider (with reply
//! caching and streaming) for everything that needs language.

pub mod intent;
pub mod templates;
mod session;

pub use intent::{extract, has_anaphoric_cue, Intent};
pub use session::{ConversationSession, SessionDeps, SessionOptions};
