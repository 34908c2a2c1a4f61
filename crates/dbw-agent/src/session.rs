//! A connected bus session: owns the bus handle and the spawned loops.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use dbw_canbus::{
    CanInterface, CanResult, CommandBuilder, MockCanInterface, ProtocolBinding, ReportDispatcher,
    SharedVehicleStatus,
};
use dbw_protocol::{Protocol, VehicleStatus};

use crate::config::BusConfig;
use crate::control::{LoopControl, SendMode};
use crate::events::{EventSink, SessionEvent};
use crate::intent::{BurstSource, IntentSource};
use crate::scheduler::{self, LoopTiming};
use crate::slot::OutboundSlot;

/// Channel name that selects the in-memory bus instead of SocketCAN.
pub const MOCK_CHANNEL: &str = "mock";

const EVENT_CAPACITY: usize = 64;

/// Open the configured bus. Failures are returned to the caller; there is
/// no retry.
pub fn open_bus(config: &BusConfig) -> CanResult<Arc<dyn CanInterface>> {
    if config.channel == MOCK_CHANNEL {
        tracing::info!("using in-memory mock bus (dry run)");
        return Ok(Arc::new(MockCanInterface::new()));
    }
    open_socketcan(config)
}

#[cfg(target_os = "linux")]
fn open_socketcan(config: &BusConfig) -> CanResult<Arc<dyn CanInterface>> {
    let bus = dbw_canbus::SocketCanInterface::open(&config.channel, config.bitrate)?;
    Ok(Arc::new(bus))
}

#[cfg(not(target_os = "linux"))]
fn open_socketcan(config: &BusConfig) -> CanResult<Arc<dyn CanInterface>> {
    Err(dbw_canbus::CanError::Open {
        channel: config.channel.clone(),
        reason: "SocketCAN is only available on Linux".into(),
    })
}

/// Startup state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub protocol: Protocol,
    pub receive_on_start: bool,
    pub send_mode: SendMode,
    pub timing: LoopTiming,
}

impl SessionSettings {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            receive_on_start: true,
            send_mode: SendMode::Off,
            timing: LoopTiming::default(),
        }
    }
}

pub struct Session {
    id: Uuid,
    protocol: Protocol,
    bus: Arc<dyn CanInterface>,
    control: Arc<LoopControl>,
    status: SharedVehicleStatus,
    slot: Arc<OutboundSlot>,
    events: EventSink,
    timing: LoopTiming,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    /// Spawn the receive, send and generate loops on `bus`. Must be called
    /// from within a tokio runtime.
    pub fn start(
        bus: Arc<dyn CanInterface>,
        settings: SessionSettings,
        intents: Arc<dyn IntentSource>,
        bursts: Arc<dyn BurstSource>,
    ) -> Self {
        let id = Uuid::now_v7();
        let protocol = settings.protocol;
        let timing = settings.timing;
        let control = Arc::new(LoopControl::new(settings.receive_on_start, settings.send_mode));
        let status: SharedVehicleStatus = Arc::new(RwLock::new(VehicleStatus::default()));
        let slot = Arc::new(OutboundSlot::new());
        let events = EventSink::new(id, EVENT_CAPACITY);

        let span = tracing::info_span!("session", session_id = %id, protocol = %protocol);
        let dispatcher = ReportDispatcher::new(ProtocolBinding::for_protocol(protocol), Arc::clone(&status));

        let tasks = vec![
            tokio::spawn(
                scheduler::receive_loop(
                    Arc::clone(&bus),
                    dispatcher,
                    Arc::clone(&control),
                    timing,
                    events.clone(),
                )
                .instrument(span.clone()),
            ),
            tokio::spawn(
                scheduler::send_loop(
                    Arc::clone(&bus),
                    protocol,
                    Arc::clone(&slot),
                    bursts,
                    Arc::clone(&control),
                    timing,
                    events.clone(),
                )
                .instrument(span.clone()),
            ),
            tokio::spawn(
                scheduler::generate_loop(
                    protocol,
                    intents,
                    Arc::clone(&slot),
                    Arc::clone(&control),
                    timing,
                    events.clone(),
                )
                .instrument(span.clone()),
            ),
        ];

        span.in_scope(|| {
            tracing::info!(
                receiving = settings.receive_on_start,
                send_mode = ?settings.send_mode,
                "session started"
            );
        });

        Self {
            id,
            protocol,
            bus,
            control,
            status,
            slot,
            events,
            timing,
            tasks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn status(&self) -> SharedVehicleStatus {
        Arc::clone(&self.status)
    }

    pub fn control(&self) -> &LoopControl {
        &self.control
    }

    pub fn set_receiving(&self, on: bool) {
        self.control.set_receiving(on);
    }

    pub fn set_send_mode(&self, mode: SendMode) {
        self.control.set_send_mode(mode);
    }

    /// Control frames the transmit loop is currently repeating.
    pub fn outbound(&self) -> Vec<dbw_canbus::CanFrame> {
        self.slot.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Stop every loop, send one safe-reset set if continuous control was
    /// active, then close the bus. Close failures are logged, not returned.
    pub async fn shutdown(mut self) {
        let was_continuous = self.control.send_mode() == SendMode::Continuous;
        self.control.cancel();

        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::error!(session_id = %self.id, error = %e, "session task failed");
            }
        }

        if was_continuous {
            for frame in CommandBuilder::safe_frames(self.protocol) {
                if let Err(e) = self.bus.send_frame(&frame, self.timing.send_timeout).await {
                    tracing::warn!(session_id = %self.id, id = frame.id, error = %e, "safe-reset frame send failed");
                }
            }
            tracing::info!(session_id = %self.id, "safe-reset frames sent");
        }

        if let Err(e) = self.bus.shutdown().await {
            tracing::warn!(session_id = %self.id, error = %e, "bus close failed");
        }
        self.events.session_stopped();
        tracing::info!(session_id = %self.id, "session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Loops exit on their own once cancelled.
        self.control.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use dbw_canbus::CanFrame;
    use dbw_protocol::CommandIntent;

    use crate::intent::{SharedBurstParams, SharedIntent};

    fn start(mock: &Arc<MockCanInterface>, settings: SessionSettings) -> Session {
        let bus: Arc<dyn CanInterface> = mock.clone();
        Session::start(
            bus,
            settings,
            Arc::new(SharedIntent::new(CommandIntent::idle(settings.protocol))),
            Arc::new(SharedBurstParams::default()),
        )
    }

    #[tokio::test]
    async fn open_mock_bus() {
        let bus = open_bus(&BusConfig {
            channel: MOCK_CHANNEL.into(),
            bitrate: 500_000,
        })
        .unwrap();
        assert!(matches!(
            bus.recv_frame(Duration::from_millis(1)).await,
            Err(dbw_canbus::CanError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn open_missing_channel_fails() {
        let result = open_bus(&BusConfig {
            channel: "dbw-does-not-exist0".into(),
            bitrate: 500_000,
        });
        assert!(matches!(result, Err(dbw_canbus::CanError::Open { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_closes_bus_once() {
        let mock = Arc::new(MockCanInterface::new());
        let session = start(&mock, SessionSettings::new(Protocol::Hooke2));
        let mut events = session.subscribe();

        tokio::time::sleep(Duration::from_millis(50)).await;
        session.shutdown().await;

        assert!(mock.is_closed());
        assert_eq!(mock.shutdown_calls(), 1);
        // Send mode was off: nothing transmitted.
        assert!(mock.sent_frames().is_empty());
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::SessionStopped { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_after_continuous_sends_safe_frames_last() {
        let mock = Arc::new(MockCanInterface::new());
        let settings = SessionSettings {
            send_mode: SendMode::Continuous,
            ..SessionSettings::new(Protocol::Lmt)
        };
        let session = start(&mock, settings);

        tokio::time::sleep(Duration::from_millis(55)).await;
        session.shutdown().await;

        let sent = mock.sent_frames();
        let tail: Vec<CanFrame> = sent[sent.len() - 2..].to_vec();
        assert_eq!(tail, CommandBuilder::safe_frames(Protocol::Lmt));
        assert_eq!(mock.shutdown_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn received_reports_reach_status() {
        let mock = Arc::new(MockCanInterface::with_responses(vec![CanFrame::new(
            0x512,
            vec![0x12, 0xC0, 0x7D, 0x00, 42, 0, 0, 0],
        )]));
        let session = start(&mock, SessionSettings::new(Protocol::Hooke2));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(session.status().read().await.battery, 42);
        session.shutdown().await;
    }
}
