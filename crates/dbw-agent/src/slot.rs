//! Single-entry handoff from the generate loop to the transmit loop.

use std::sync::{Mutex, MutexGuard, PoisonError};

use dbw_canbus::CanFrame;

/// Latest control frame set. Publishing overwrites; the transmit loop
/// re-sends whatever is current every period.
#[derive(Debug, Default)]
pub struct OutboundSlot {
    frames: Mutex<Vec<CanFrame>>,
}

impl OutboundSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CanFrame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, frames: Vec<CanFrame>) {
        *self.lock() = frames;
    }

    pub fn snapshot(&self) -> Vec<CanFrame> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_overwrites() {
        let slot = OutboundSlot::new();
        assert!(slot.is_empty());

        slot.publish(vec![CanFrame::new(0x100, vec![1]), CanFrame::new(0x101, vec![1])]);
        slot.publish(vec![CanFrame::new(0x520, vec![2])]);
        assert_eq!(slot.snapshot(), vec![CanFrame::new(0x520, vec![2])]);

        // Snapshots do not drain.
        assert_eq!(slot.snapshot().len(), 1);
        slot.clear();
        assert!(slot.snapshot().is_empty());
    }
}
