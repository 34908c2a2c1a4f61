//! Cooperative loop control shared by every task of a session.
//!
//! Loops poll these flags at each iteration boundary; nothing is preempted.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Which transmit behavior is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendMode {
    #[default]
    Off,
    /// Operator-defined burst of raw frames.
    Burst,
    /// Periodic control frames built from the live intent.
    Continuous,
}

impl SendMode {
    fn to_raw(self) -> u8 {
        match self {
            SendMode::Off => 0,
            SendMode::Burst => 1,
            SendMode::Continuous => 2,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => SendMode::Burst,
            2 => SendMode::Continuous,
            _ => SendMode::Off,
        }
    }
}

#[derive(Debug)]
pub struct LoopControl {
    cancelled: AtomicBool,
    receiving: AtomicBool,
    send_mode: AtomicU8,
}

impl LoopControl {
    pub fn new(receiving: bool, send_mode: SendMode) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            receiving: AtomicBool::new(receiving),
            send_mode: AtomicU8::new(send_mode.to_raw()),
        }
    }

    /// Ask every loop to stop at its next iteration boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn set_receiving(&self, on: bool) {
        if self.receiving.swap(on, Ordering::SeqCst) != on {
            tracing::info!(receiving = on, "receive toggled");
        }
    }

    pub fn is_receiving(&self) -> bool {
        self.receiving.load(Ordering::SeqCst)
    }

    pub fn set_send_mode(&self, mode: SendMode) {
        let previous = SendMode::from_raw(self.send_mode.swap(mode.to_raw(), Ordering::SeqCst));
        if previous != mode {
            tracing::info!(from = ?previous, to = ?mode, "send mode changed");
        }
    }

    pub fn send_mode(&self) -> SendMode {
        SendMode::from_raw(self.send_mode.load(Ordering::SeqCst))
    }

    /// Return to `Off` after a completed burst, unless the operator has
    /// already switched to another mode.
    pub fn finish_burst(&self) -> bool {
        self.send_mode
            .compare_exchange(
                SendMode::Burst.to_raw(),
                SendMode::Off.to_raw(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

impl Default for LoopControl {
    fn default() -> Self {
        Self::new(false, SendMode::Off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_round_trip_through_atomic() {
        let control = LoopControl::default();
        for mode in [SendMode::Burst, SendMode::Continuous, SendMode::Off] {
            control.set_send_mode(mode);
            assert_eq!(control.send_mode(), mode);
        }
    }

    #[test]
    fn finish_burst_only_from_burst() {
        let control = LoopControl::new(true, SendMode::Burst);
        assert!(control.finish_burst());
        assert_eq!(control.send_mode(), SendMode::Off);

        control.set_send_mode(SendMode::Continuous);
        assert!(!control.finish_burst());
        assert_eq!(control.send_mode(), SendMode::Continuous);
    }

    #[test]
    fn cancel_is_sticky() {
        let control = LoopControl::default();
        assert!(!control.is_cancelled());
        control.cancel();
        control.cancel();
        assert!(control.is_cancelled());
    }

    #[test]
    fn send_mode_deserializes_snake_case() {
        let mode: SendMode = serde_json::from_str(r#""continuous""#).unwrap();
        assert_eq!(mode, SendMode::Continuous);
    }
}
