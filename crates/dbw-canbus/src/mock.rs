//! Mock CAN interface for testing.
//!
//! Supports scripted response queues and frame recording. All tests use this
//! instead of real CAN hardware so the suite runs in CI on any platform.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{CanError, CanResult};
use crate::interface::{CanInterface, timeout_error};
use crate::types::CanFrame;

/// Mock CAN interface with scripted responses and frame recording.
pub struct MockCanInterface {
    /// Queued responses returned by `recv_frame` (FIFO order).
    responses: Mutex<VecDeque<CanFrame>>,
    /// All frames accepted by `send_frame`, with the (tokio) time they went out.
    sent_frames: Mutex<Vec<(Instant, CanFrame)>>,
    /// Reject every send with an interface error.
    fail_sends: AtomicBool,
    closed: AtomicBool,
    shutdown_calls: AtomicUsize,
}

impl MockCanInterface {
    /// Create a new mock with no queued responses.
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Create a mock pre-loaded with response frames.
    pub fn with_responses(responses: Vec<CanFrame>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent_frames: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            shutdown_calls: AtomicUsize::new(0),
        }
    }

    /// Queue an additional response frame.
    pub fn queue_response(&self, frame: CanFrame) {
        self.responses.lock().unwrap().push_back(frame);
    }

    /// Responses not yet consumed.
    pub fn pending_responses(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    /// Get copies of all frames that were sent.
    pub fn sent_frames(&self) -> Vec<CanFrame> {
        self.sent_frames
            .lock()
            .unwrap()
            .iter()
            .map(|(_, f)| f.clone())
            .collect()
    }

    /// Sent frames with their send times.
    pub fn sent_log(&self) -> Vec<(Instant, CanFrame)> {
        self.sent_frames.lock().unwrap().clone()
    }

    /// Get the last sent frame, if any.
    pub fn last_sent(&self) -> Option<CanFrame> {
        self.sent_frames
            .lock()
            .unwrap()
            .last()
            .map(|(_, f)| f.clone())
    }

    pub fn clear_sent(&self) {
        self.sent_frames.lock().unwrap().clear();
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// How many times `shutdown` was called, including no-op repeats.
    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCanInterface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CanInterface for MockCanInterface {
    async fn send_frame(&self, frame: &CanFrame, _timeout: Duration) -> CanResult<()> {
        if self.is_closed() {
            return Err(CanError::Closed);
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(CanError::Interface("scripted send failure".into()));
        }
        frame.validate()?;

        self.sent_frames
            .lock()
            .unwrap()
            .push((Instant::now(), frame.clone()));
        Ok(())
    }

    async fn recv_frame(&self, timeout: Duration) -> CanResult<CanFrame> {
        if self.is_closed() {
            return Err(CanError::Closed);
        }
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(frame) => Ok(frame),
            None => {
                // Behave like an idle bus: wait out the timeout.
                tokio::time::sleep(timeout).await;
                Err(timeout_error(timeout))
            }
        }
    }

    async fn shutdown(&self) -> CanResult<()> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
