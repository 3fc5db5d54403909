// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory event store with checked ticket availability.
//!
//! The descriptive records are read-only after load and safe to share across
//! sessions. Availability counters are the one mutable piece of event state;
//! they live in a concurrent map so independent sessions can reserve and
//! release without a store-wide lock.

use std::path::Path;

use dashmap::DashMap;
use tracing::info;
use usher_core::{EventId, UsherError};

use crate::event::Event;
use crate::parser::parse_catalog;

/// Tickets offered per event when the catalog does not say otherwise.
pub const DEFAULT_AVAILABILITY: u32 = 50;

/// Why a reservation could not be made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveError {
    /// No event with the given id exists.
    UnknownEvent,
    /// Fewer tickets remain than were requested.
    Insufficient { left: u32 },
}

/// Read-only event records plus per-event availability counters.
pub struct EventStore {
    events: Vec<Event>,
    availability: DashMap<EventId, u32>,
}

impl EventStore {
    /// Builds a store from already-parsed events.
    pub fn new(events: Vec<Event>) -> Self {
        let availability = events
            .iter()
            .map(|e| (e.id.clone(), DEFAULT_AVAILABILITY))
            .collect();
        Self {
            events,
            availability,
        }
    }

    /// Reads and parses the catalog file.
    ///
    /// An unreadable file or a file with zero parseable records is a startup
    /// error -- the assistant has nothing to talk about without a catalog.
    pub async fn load(path: &Path) -> Result<Self, UsherError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            UsherError::Catalog(format!("cannot read catalog {}: {e}", path.display()))
        })?;
        let events = parse_catalog(&content);
        if events.is_empty() {
            return Err(UsherError::Catalog(format!(
                "no event records found in {}",
                path.display()
            )));
        }
        info!(count = events.len(), path = %path.display(), "event catalog loaded");
        Ok(Self::new(events))
    }

    /// Looks up an event by id. Linear scan; catalogs are small.
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// All events, in catalog order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remaining tickets for an event.
    pub fn availability(&self, id: &EventId) -> Option<u32> {
        self.availability.get(id).map(|v| *v)
    }

    /// Atomically decrements availability by `quantity` if enough remain.
    pub fn try_reserve(&self, id: &EventId, quantity: u32) -> Result<(), ReserveError> {
        let Some(mut left) = self.availability.get_mut(id) else {
            return Err(ReserveError::UnknownEvent);
        };
        if *left < quantity {
            return Err(ReserveError::Insufficient { left: *left });
        }
        *left -= quantity;
        Ok(())
    }

    /// Returns `quantity` tickets to the pool (cancellations, failed writes).
    pub fn release(&self, id: &EventId, quantity: u32) {
        if let Some(mut left) = self.availability.get_mut(id) {
            *left = left.saturating_add(quantity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> EventStore {
        EventStore::new(parse_catalog(
            "Name: A\nType: Concert\n----------\nName: B\nType: Trek\n",
        ))
    }

    #[test]
    fn new_store_starts_at_default_availability() {
        let store = store();
        let id = store.events()[0].id.clone();
        assert_eq!(store.availability(&id), Some(DEFAULT_AVAILABILITY));
    }

    #[test]
    fn reserve_and_release_round_trip() {
        let store = store();
        let id = store.events()[0].id.clone();
        store.try_reserve(&id, 2).unwrap();
        assert_eq!(store.availability(&id), Some(DEFAULT_AVAILABILITY - 2));
        store.release(&id, 2);
        assert_eq!(store.availability(&id), Some(DEFAULT_AVAILABILITY));
    }

    #[test]
    fn reserve_rejects_overdraw_without_mutating() {
        let store = store();
        let id = store.events()[0].id.clone();
        let err = store.try_reserve(&id, DEFAULT_AVAILABILITY + 1).unwrap_err();
        assert_eq!(
            err,
            ReserveError::Insufficient {
                left: DEFAULT_AVAILABILITY
            }
        );
        assert_eq!(store.availability(&id), Some(DEFAULT_AVAILABILITY));
    }

    #[test]
    fn reserve_unknown_event_fails() {
        let store = store();
        let err = store
            .try_reserve(&EventId("evt999".into()), 1)
            .unwrap_err();
        assert_eq!(err, ReserveError::UnknownEvent);
    }

    #[test]
    fn get_finds_by_id() {
        let store = store();
        let id = store.events()[1].id.clone();
        assert_eq!(store.get(&id).unwrap().name, "B");
        assert!(store.get(&EventId("evt999".into())).is_none());
    }

    #[tokio::test]
    async fn load_rejects_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.txt");
        std::fs::write(&path, "just a banner\n").unwrap();
        let result = EventStore::load(&path).await;
        assert!(matches!(result, Err(UsherError::Catalog(_))));
    }

    #[tokio::test]
    async fn load_reads_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.txt");
        std::fs::write(&path, "Name: Jazz Evening\nLocation: Pune\n").unwrap();
        let store = EventStore::load(&path).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.events()[0].location, "Pune");
    }
}
