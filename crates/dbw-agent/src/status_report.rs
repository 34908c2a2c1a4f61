//! Periodic vehicle status reporter and session event logger.
//!
//! Logs the decoded vehicle status as JSON at a configurable interval so an
//! operator tailing the log sees the live state, and flags it when no report
//! has arrived recently.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time;

use dbw_canbus::SharedVehicleStatus;
use dbw_protocol::VehicleStatus;

use crate::events::SessionEvent;

/// One rendered status line.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub json: String,
    pub stale: bool,
}

/// Render `status` as of `now`.
pub fn render(
    status: &VehicleStatus,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> serde_json::Result<StatusLine> {
    Ok(StatusLine {
        json: serde_json::to_string(status)?,
        stale: status.is_stale(now, stale_after),
    })
}

/// Run the status loop, logging at `interval`.
///
/// This function runs forever until the task is cancelled. Intended to be
/// raced against the shutdown signal.
pub async fn run(status: SharedVehicleStatus, interval: Duration, stale_after: Duration) {
    let mut ticker = time::interval(interval);
    // Skip the first tick (fires immediately).
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let snapshot = status.read().await.clone();
        match render(&snapshot, Utc::now(), stale_after) {
            Ok(line) if line.stale => {
                tracing::warn!(
                    status = %line.json,
                    last_update = ?snapshot.updated_at,
                    "vehicle status stale"
                );
            }
            Ok(line) => tracing::info!(status = %line.json, "vehicle status"),
            Err(e) => tracing::error!(error = %e, "failed to serialize vehicle status"),
        }
    }
}

/// Log every session event until the session's sender is gone.
pub async fn log_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => tracing::info!(event = %json, "session event"),
                Err(e) => tracing::error!(error = %e, "failed to serialize session event"),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "session event log fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use uuid::Uuid;

    use crate::events::EventSink;

    #[test]
    fn fresh_status_is_not_stale() {
        let now = Utc::now();
        let mut status = VehicleStatus::default();
        status.battery = 77;
        status.touch(now);

        let line = render(&status, now, Duration::from_millis(500)).unwrap();
        assert!(!line.stale);
        assert!(line.json.contains(r#""battery":77"#));
    }

    #[test]
    fn never_updated_status_is_stale() {
        let line = render(&VehicleStatus::default(), Utc::now(), Duration::from_secs(60)).unwrap();
        assert!(line.stale);
    }

    #[tokio::test(start_paused = true)]
    async fn reporter_runs_until_dropped() {
        let status = Arc::new(RwLock::new(VehicleStatus::default()));
        let result = time::timeout(
            Duration::from_secs(3),
            run(status, Duration::from_secs(1), Duration::from_millis(500)),
        )
        .await;
        assert!(result.is_err(), "reporter loop should never return");
    }

    #[tokio::test]
    async fn event_logger_stops_when_sender_dropped() {
        let sink = EventSink::new(Uuid::nil(), 4);
        let rx = sink.subscribe();
        sink.burst_completed(1);
        drop(sink);
        // Drains the queued event, then sees the channel closed.
        log_events(rx).await;
    }
}
