//! Guard against duplicate movement submissions.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::errors::{CajaError, Result};

/// Identifies one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTicket {
    id: u64,
}

impl SubmissionTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Allows one submission at a time. Each `begin` gets a fresh, increasing
/// request id; only the outcome for the latest id is accepted.
#[derive(Debug, Default)]
pub struct MovementSubmitter {
    next_id: AtomicU64,
    latest: AtomicU64,
    in_flight: AtomicBool,
}

impl MovementSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn begin(&self) -> Result<SubmissionTicket> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("submission rejected, another one is in flight");
            return Err(CajaError::SubmissionInFlight);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.store(id, Ordering::SeqCst);
        Ok(SubmissionTicket { id })
    }

    /// Resolves `ticket`. A stale ticket yields `Ok(None)` and its outcome is
    /// dropped; otherwise the in-flight flag is cleared and the outcome
    /// returned.
    pub fn finish<T>(&self, ticket: SubmissionTicket, outcome: Result<T>) -> Result<Option<T>> {
        if ticket.id != self.latest.load(Ordering::SeqCst) {
            tracing::debug!(request = ticket.id, "stale submission outcome discarded");
            return Ok(None);
        }
        self.in_flight.store(false, Ordering::SeqCst);
        outcome.map(Some)
    }

    /// Invalidates the outstanding ticket, if any, and allows a new `begin`.
    pub fn supersede(&self) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.store(id, Ordering::SeqCst);
        self.in_flight.store(false, Ordering::SeqCst);
    }
}
