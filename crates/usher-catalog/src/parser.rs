// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flat-file catalog parser.
//!
//! The catalog is a plain-text file of records separated by dashed lines,
//! each record a sequence of `Key: Value` lines:
//!
//! ```text
//! Name: Sufi Night
//! Type: Concert
//! Location: Mumbai
//! Date/Days: 2026-09-12
//! Time: 7 PM
//! Price: ₹1,500 per person
//! Description: Live qawwali under the stars
//! --------------------------------------------------------------------------------
//! ```
//!
//! Records without a `Name` line (headers, banners) are skipped. Ids are
//! assigned sequentially in file order as `evt001`, `evt002`, ...

use usher_core::EventId;

use crate::event::{Event, FIELD_TBA};

/// Parses catalog text into event records.
///
/// Never fails on malformed records -- they are skipped -- but an input that
/// yields zero events is reported by the caller ([`crate::EventStore::load`]).
pub fn parse_catalog(content: &str) -> Vec<Event> {
    let mut events = Vec::new();
    let mut next_id = 1usize;

    for record in split_records(content) {
        let mut name = None;
        let mut kind = None;
        let mut location = None;
        let mut date = None;
        let mut time = None;
        let mut price = None;
        let mut description = None;

        for line in record.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match normalize_key(key).as_str() {
                "name" => name = Some(value.to_string()),
                "type" | "kind" | "category" => kind = Some(value.to_string()),
                "location" | "venue" => location = Some(value.to_string()),
                "date/days" | "date" | "days" => date = Some(value.to_string()),
                "time" => time = Some(value.to_string()),
                "price" => price = Some(value.to_string()),
                "description" => description = Some(value.to_string()),
                _ => {}
            }
        }

        let Some(name) = name else {
            continue;
        };

        events.push(Event {
            id: EventId(format!("evt{next_id:03}")),
            name,
            kind: kind.unwrap_or_else(|| "Event".to_string()),
            location: location.unwrap_or_else(|| FIELD_TBA.to_string()),
            date: date.unwrap_or_else(|| FIELD_TBA.to_string()),
            time: time.unwrap_or_else(|| FIELD_TBA.to_string()),
            price: price.unwrap_or_else(|| FIELD_TBA.to_string()),
            description: description.unwrap_or_default(),
        });
        next_id += 1;
    }

    events
}

/// Splits the file into records on dashed separator lines.
fn split_records(content: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if is_separator(line) {
            if !current.trim().is_empty() {
                records.push(std::mem::take(&mut current));
            }
            current.clear();
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.trim().is_empty() {
        records.push(current);
    }
    records
}

/// A separator is a line of nothing but dashes, at least five of them.
fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 5 && trimmed.bytes().all(|b| b == b'-')
}

/// Lowercases a key and collapses interior whitespace to underscores.
fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(' ', "_")
}
