//! Session events broadcast to status consumers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Bus operation that faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusOperation {
    Send,
    Recv,
}

/// Faults and milestones raised by the session loops.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A send or receive failed; the loop carried on.
    BusFault {
        session_id: Uuid,
        operation: BusOperation,
        error: String,
        at: DateTime<Utc>,
    },

    /// Burst parameters could not be parsed; retried after backoff.
    BurstRejected {
        session_id: Uuid,
        error: String,
        at: DateTime<Utc>,
    },

    /// Every frame of a burst was attempted.
    BurstCompleted {
        session_id: Uuid,
        frames_sent: u32,
        at: DateTime<Utc>,
    },

    /// Building a control cycle took longer than the protocol period.
    CycleOverrun {
        session_id: Uuid,
        elapsed_ms: u64,
        period_ms: u64,
        at: DateTime<Utc>,
    },

    /// All loops joined and the bus is closed.
    SessionStopped { session_id: Uuid, at: DateTime<Utc> },
}

/// Publishing half of the session event channel.
#[derive(Debug, Clone)]
pub struct EventSink {
    session_id: Uuid,
    tx: broadcast::Sender<SessionEvent>,
}

impl EventSink {
    pub fn new(session_id: Uuid, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { session_id, tx }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.tx.send(event);
    }

    pub fn bus_fault(&self, operation: BusOperation, error: &dyn std::fmt::Display) {
        self.publish(SessionEvent::BusFault {
            session_id: self.session_id,
            operation,
            error: error.to_string(),
            at: Utc::now(),
        });
    }

    pub fn burst_rejected(&self, error: &dyn std::fmt::Display) {
        self.publish(SessionEvent::BurstRejected {
            session_id: self.session_id,
            error: error.to_string(),
            at: Utc::now(),
        });
    }

    pub fn burst_completed(&self, frames_sent: u32) {
        self.publish(SessionEvent::BurstCompleted {
            session_id: self.session_id,
            frames_sent,
            at: Utc::now(),
        });
    }

    pub fn cycle_overrun(&self, elapsed: Duration, period: Duration) {
        self.publish(SessionEvent::CycleOverrun {
            session_id: self.session_id,
            elapsed_ms: elapsed.as_millis() as u64,
            period_ms: period.as_millis() as u64,
            at: Utc::now(),
        });
    }

    pub fn session_stopped(&self) {
        self.publish(SessionEvent::SessionStopped {
            session_id: self.session_id,
            at: Utc::now(),
        });
    }
}
