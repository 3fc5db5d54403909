// SPDX-FileCopyrightText: 2026 Usher Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-modify-write JSON-file ledger.
//!
//! The on-disk format is a map from phone number to the caller's bookings in
//! insertion order. Every mutation for a given phone runs under that phone's
//! async lock, so two bookings for the same caller cannot interleave and
//! lose an update. Different callers proceed independently.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use usher_catalog::{EventStore, ReserveError};
use usher_core::{BookingId, EventId, PhoneNumber, UsherError};

use crate::booking::{BookOutcome, Booking, CancelOutcome, TicketsOutcome};

type LedgerFile = BTreeMap<String, Vec<Booking>>;

/// Booking ledger backed by a single JSON file.
pub struct BookingLedger {
    path: PathBuf,
    store: Arc<EventStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BookingLedger {
    pub fn new(path: PathBuf, store: Arc<EventStore>) -> Self {
        Self {
            path,
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, phone: &PhoneNumber) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(phone.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// A missing file is an empty ledger; a corrupt one is an error.
    async fn read_file(&self) -> Result<LedgerFile, UsherError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| UsherError::Store {
                message: format!("ledger file {} is corrupt", self.path.display()),
                source: Some(Box::new(e)),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LedgerFile::new()),
            Err(e) => Err(UsherError::Store {
                message: format!("cannot read ledger {}", self.path.display()),
                source: Some(Box::new(e)),
            }),
        }
    }

    async fn write_file(&self, ledger: &LedgerFile) -> Result<(), UsherError> {
        let raw = serde_json::to_string_pretty(ledger).map_err(|e| UsherError::Store {
            message: "cannot serialize ledger".to_string(),
            source: Some(Box::new(e)),
        })?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| UsherError::Store {
                message: format!("cannot write ledger {}", self.path.display()),
                source: Some(Box::new(e)),
            })
    }

    /// Books `quantity` tickets of `event_id` for the caller.
    ///
    /// Availability is reserved before the file write; a failed write
    /// returns the tickets to the pool.
    pub async fn book(
        &self,
        phone: &PhoneNumber,
        event_id: &EventId,
        quantity: u32,
    ) -> Result<BookOutcome, UsherError> {
        let lock = self.lock_for(phone).await;
        let _guard = lock.lock().await;

        let Some(event) = self.store.get(event_id) else {
            return Ok(BookOutcome::UnknownEvent {
                event_id: event_id.clone(),
            });
        };
        match self.store.try_reserve(event_id, quantity) {
            Ok(()) => {}
            Err(ReserveError::UnknownEvent) => {
                return Ok(BookOutcome::UnknownEvent {
                    event_id: event_id.clone(),
                });
            }
            Err(ReserveError::Insufficient { left }) => {
                return Ok(BookOutcome::Insufficient {
                    event_name: event.name.clone(),
                    left,
                });
            }
        }

        let booking = Booking::confirm(event, quantity);
        let mut ledger = match self.read_file().await {
            Ok(ledger) => ledger,
            Err(e) => {
                self.store.release(event_id, quantity);
                return Err(e);
            }
        };
        ledger
            .entry(phone.to_string())
            .or_default()
            .push(booking.clone());
        if let Err(e) = self.write_file(&ledger).await {
            self.store.release(event_id, quantity);
            return Err(e);
        }

        info!(%phone, event = %event_id, quantity, booking = %booking.booking_id, "booking confirmed");
        Ok(BookOutcome::Confirmed(booking))
    }

    /// Cancels a booking, returning its tickets to the pool.
    pub async fn cancel(
        &self,
        phone: &PhoneNumber,
        booking_id: &BookingId,
    ) -> Result<CancelOutcome, UsherError> {
        let lock = self.lock_for(phone).await;
        let _guard = lock.lock().await;

        let mut ledger = self.read_file().await?;
        let key = phone.to_string();
        let Some(bookings) = ledger.get_mut(&key) else {
            return Ok(CancelOutcome::NotFound {
                booking_id: booking_id.clone(),
            });
        };
        let Some(pos) = bookings.iter().position(|b| &b.booking_id == booking_id) else {
            return Ok(CancelOutcome::NotFound {
                booking_id: booking_id.clone(),
            });
        };
        let removed = bookings.remove(pos);
        if bookings.is_empty() {
            ledger.remove(&key);
        }
        self.write_file(&ledger).await?;
        self.store.release(&removed.event_id, removed.quantity);

        info!(%phone, booking = %booking_id, "booking canceled");
        Ok(CancelOutcome::Canceled {
            booking_id: booking_id.clone(),
            event_name: removed.event_name,
        })
    }

    /// All bookings for the caller, in insertion order.
    pub async fn my_tickets(&self, phone: &PhoneNumber) -> Result<TicketsOutcome, UsherError> {
        let ledger = self.read_file().await?;
        match ledger.get(&phone.to_string()) {
            Some(bookings) if !bookings.is_empty() => {
                Ok(TicketsOutcome::Found(bookings.clone()))
            }
            _ => Ok(TicketsOutcome::Empty),
        }
    }
}
