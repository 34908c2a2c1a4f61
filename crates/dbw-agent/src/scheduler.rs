//! The session's periodic loops: receive, transmit (burst or continuous)
//! and continuous-mode frame generation.
//!
//! Every loop checks [`LoopControl`] at its iteration boundary and only
//! suspends on a bounded bus call or a sleep, so cancellation is observed
//! within one wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};

use dbw_canbus::{BurstRequest, CanError, CanInterface, CommandBuilder, ReportDispatcher};
use dbw_protocol::Protocol;

use crate::control::{LoopControl, SendMode};
use crate::events::{BusOperation, EventSink};
use crate::intent::{BurstSource, IntentSource};
use crate::slot::OutboundSlot;

/// Bounded waits used by the loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    /// Longest a single receive may block.
    pub recv_timeout: Duration,
    /// Poll interval while a loop has nothing to do.
    pub idle_poll: Duration,
    /// Backoff after rejected burst parameters.
    pub burst_retry: Duration,
    pub send_timeout: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            recv_timeout: Duration::from_millis(100),
            idle_poll: Duration::from_millis(100),
            burst_retry: Duration::from_millis(100),
            send_timeout: Duration::from_millis(10),
        }
    }
}

/// Time left in a cycle. An overrun yields zero: the next cycle starts at
/// once and missed cycles are not caught up.
pub fn cycle_sleep(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

// ── Receive ─────────────────────────────────────────────────────

/// Feed received frames to the dispatcher while receiving is on.
pub async fn receive_loop(
    bus: Arc<dyn CanInterface>,
    dispatcher: ReportDispatcher,
    control: Arc<LoopControl>,
    timing: LoopTiming,
    events: EventSink,
) {
    let binding = dispatcher.binding();
    tracing::info!(protocol = ?binding.protocol(), reports = binding.len(), "receive loop started");

    while !control.is_cancelled() {
        if !control.is_receiving() {
            time::sleep(timing.idle_poll).await;
            continue;
        }

        match bus.recv_frame(timing.recv_timeout).await {
            Ok(frame) => {
                dispatcher.dispatch(&frame).await;
            }
            Err(CanError::Timeout { .. }) => {}
            Err(CanError::Closed) => {
                tracing::warn!("bus closed under the receive loop");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "CAN receive failed");
                events.bus_fault(BusOperation::Recv, &e);
                time::sleep(timing.idle_poll).await;
            }
        }
    }
    tracing::debug!("receive loop stopped");
}

// ── Transmit ────────────────────────────────────────────────────

/// Transmit according to the current send mode: operator bursts, or the
/// latest published control frame set once per protocol period.
pub async fn send_loop(
    bus: Arc<dyn CanInterface>,
    protocol: Protocol,
    slot: Arc<OutboundSlot>,
    bursts: Arc<dyn BurstSource>,
    control: Arc<LoopControl>,
    timing: LoopTiming,
    events: EventSink,
) {
    let period = protocol.send_period();
    while !control.is_cancelled() {
        match control.send_mode() {
            SendMode::Off => time::sleep(timing.idle_poll).await,
            SendMode::Burst => run_burst(bus.as_ref(), bursts.as_ref(), &control, timing, &events).await,
            SendMode::Continuous => {
                let started = Instant::now();
                transmit_cycle(bus.as_ref(), &slot, timing.send_timeout, &events).await;
                time::sleep(cycle_sleep(period, started.elapsed())).await;
            }
        }
    }
    tracing::debug!("send loop stopped");
}

async fn transmit_cycle(
    bus: &dyn CanInterface,
    slot: &OutboundSlot,
    send_timeout: Duration,
    events: &EventSink,
) {
    for frame in slot.snapshot() {
        match bus.send_frame(&frame, send_timeout).await {
            Ok(()) => tracing::trace!(frame = %frame, "control frame sent"),
            Err(e) => {
                tracing::warn!(id = frame.id, error = %e, "control frame send failed");
                events.bus_fault(BusOperation::Send, &e);
            }
        }
    }
}

/// One burst attempt. Returns early when the operator leaves burst mode or
/// the session is cancelled.
async fn run_burst(
    bus: &dyn CanInterface,
    bursts: &dyn BurstSource,
    control: &LoopControl,
    timing: LoopTiming,
    events: &EventSink,
) {
    let request = match BurstRequest::parse(&bursts.params()) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, "burst parameters rejected");
            events.burst_rejected(&e);
            time::sleep(timing.burst_retry).await;
            return;
        }
    };
    tracing::info!(
        id = request.id,
        count = request.count,
        interval_ms = request.interval.as_millis() as u64,
        "burst started"
    );

    let mut sent = 0u32;
    for index in 0..request.count {
        if control.is_cancelled() || control.send_mode() != SendMode::Burst {
            tracing::info!(sent, "burst aborted");
            return;
        }
        let frame = request.frame(index);
        match bus.send_frame(&frame, timing.send_timeout).await {
            Ok(()) => {
                tracing::trace!(frame = %frame, "burst frame sent");
                sent += 1;
            }
            Err(e) => {
                tracing::warn!(id = frame.id, error = %e, "burst frame send failed");
                events.bus_fault(BusOperation::Send, &e);
            }
        }
        time::sleep(request.interval).await;
    }

    control.finish_burst();
    tracing::info!(sent, "burst completed");
    events.burst_completed(sent);
}

// ── Generate ────────────────────────────────────────────────────

/// Build the control frame set from the live intent once per protocol
/// period and publish it to `slot`.
pub async fn generate_loop(
    protocol: Protocol,
    intents: Arc<dyn IntentSource>,
    slot: Arc<OutboundSlot>,
    control: Arc<LoopControl>,
    timing: LoopTiming,
    events: EventSink,
) {
    let period = protocol.send_period();
    let mut builder = CommandBuilder::new();
    let mut active = false;

    while !control.is_cancelled() {
        if control.send_mode() != SendMode::Continuous {
            if active {
                slot.clear();
                active = false;
            }
            time::sleep(timing.idle_poll).await;
            continue;
        }
        if !active {
            builder.reset_rolling();
            active = true;
        }

        let started = Instant::now();
        let intent = intents.current();
        let frames = if intent.protocol() == protocol {
            builder.build(&intent, intent.requires_safe_reset())
        } else {
            tracing::warn!(
                session = %protocol,
                intent = %intent.protocol(),
                "intent does not match session protocol, sending safe frames"
            );
            CommandBuilder::safe_frames(protocol)
        };
        slot.publish(frames);

        let elapsed = started.elapsed();
        if elapsed > period {
            tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                period_ms = period.as_millis() as u64,
                "control cycle overran"
            );
            events.cycle_overrun(elapsed, period);
        }
        time::sleep(cycle_sleep(period, elapsed)).await;
    }
    tracing::debug!("generate loop stopped");
}
