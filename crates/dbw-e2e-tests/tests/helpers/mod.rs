//! Shared test harness for E2E session tests.
//!
//! Runs a real `Session` (all three loops) against a `MockCanInterface`,
//! exercising the codec, dispatcher, builder and scheduler together.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use dbw_agent::control::SendMode;
use dbw_agent::events::SessionEvent;
use dbw_agent::intent::{SharedBurstParams, SharedIntent};
use dbw_agent::session::{Session, SessionSettings};
use dbw_canbus::{BurstParams, CanFrame, CanInterface, MockCanInterface};
use dbw_protocol::{CommandIntent, Protocol};

/// End-to-end harness: one session on a mock bus.
pub struct TestHarness {
    /// Mock bus shared with the session.
    pub bus: Arc<MockCanInterface>,
    /// Operator intent the generate loop samples.
    pub intents: Arc<SharedIntent>,
    /// Operator burst parameters.
    pub bursts: Arc<SharedBurstParams>,
    pub session: Session,
    /// Event receiver subscribed before any loop ran.
    pub events: broadcast::Receiver<SessionEvent>,
}

impl TestHarness {
    pub fn start(settings: SessionSettings, intent: CommandIntent, responses: Vec<CanFrame>) -> Self {
        Self::start_with_bursts(settings, intent, BurstParams::default(), responses)
    }

    pub fn start_with_bursts(
        settings: SessionSettings,
        intent: CommandIntent,
        bursts: BurstParams,
        responses: Vec<CanFrame>,
    ) -> Self {
        let bus = Arc::new(MockCanInterface::with_responses(responses));
        let intents = Arc::new(SharedIntent::new(intent));
        let bursts = Arc::new(SharedBurstParams::new(bursts));
        let handle: Arc<dyn CanInterface> = bus.clone();
        let session = Session::start(handle, settings, intents.clone(), bursts.clone());
        let events = session.subscribe();

        Self {
            bus,
            intents,
            bursts,
            session,
            events,
        }
    }

    /// Receiving only, nothing transmitted.
    pub fn listening(protocol: Protocol, responses: Vec<CanFrame>) -> Self {
        Self::start(SessionSettings::new(protocol), CommandIntent::idle(protocol), responses)
    }

    /// Continuous control from the start with `intent`.
    pub fn driving(intent: CommandIntent) -> Self {
        let settings = SessionSettings {
            send_mode: SendMode::Continuous,
            ..SessionSettings::new(intent.protocol())
        };
        Self::start(settings, intent, Vec::new())
    }

    /// Frames sent on `id`, in order.
    pub fn sent_on(&self, id: u32) -> Vec<CanFrame> {
        self.bus
            .sent_frames()
            .into_iter()
            .filter(|f| f.id == id)
            .collect()
    }

    /// Drain every event published so far.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

/// Advance the (paused) clock.
pub async fn run_for(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
