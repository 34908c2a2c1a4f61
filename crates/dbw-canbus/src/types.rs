//! Core CAN frame type and payload helpers.

use crate::error::{CanError, CanResult};

/// Declared length of every control frame, and the decode window of every report.
pub const FRAME_LEN: usize = 8;

/// Highest 11-bit standard identifier.
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Highest 29-bit extended identifier.
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Fixed-size payload every codec routine works on.
pub type Payload = [u8; FRAME_LEN];

// ── CAN Frame ───────────────────────────────────────────────────

/// A raw CAN 2.0 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// CAN arbitration ID (11-bit standard unless `extended`).
    pub id: u32,
    /// Data payload (0–8 bytes); its length is the declared length (DLC).
    pub data: Vec<u8>,
    /// 29-bit extended addressing.
    pub extended: bool,
}

impl CanFrame {
    /// Standard-addressed frame.
    pub fn new(id: u32, data: Vec<u8>) -> Self {
        Self {
            id,
            data,
            extended: false,
        }
    }

    /// Extended-addressed frame.
    pub fn new_extended(id: u32, data: Vec<u8>) -> Self {
        Self {
            id,
            data,
            extended: true,
        }
    }

    /// Standard-addressed control frame with a full 8-byte payload.
    pub fn control(id: u32, payload: Payload) -> Self {
        Self::new(id, payload.to_vec())
    }

    /// Declared data length.
    pub fn dlc(&self) -> usize {
        self.data.len()
    }

    /// Payload zero-padded (or truncated) to [`FRAME_LEN`] bytes.
    pub fn payload(&self) -> Payload {
        payload_from(&self.data)
    }

    /// Check identifier range and payload length.
    pub fn validate(&self) -> CanResult<()> {
        let max_id = if self.extended {
            MAX_EXTENDED_ID
        } else {
            MAX_STANDARD_ID
        };
        if self.id > max_id {
            return Err(CanError::InvalidFrame(format!(
                "identifier 0x{:X} exceeds 0x{max_id:X}",
                self.id
            )));
        }
        if self.data.len() > FRAME_LEN {
            return Err(CanError::InvalidFrame(format!(
                "payload of {} bytes exceeds {FRAME_LEN}",
                self.data.len()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for CanFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.extended {
            write!(f, "0x{:08X}", self.id)?;
        } else {
            write!(f, "0x{:03X}", self.id)?;
        }
        write!(f, " [{}]", self.data.len())?;
        for b in &self.data {
            write!(f, " {b:02X}")?;
        }
        Ok(())
    }
}

/// Copy `data` into a zero-padded payload; bytes past [`FRAME_LEN`] are ignored.
pub fn payload_from(data: &[u8]) -> Payload {
    let mut payload = [0u8; FRAME_LEN];
    let n = data.len().min(FRAME_LEN);
    payload[..n].copy_from_slice(&data[..n]);
    payload
}
