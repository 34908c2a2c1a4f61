//! Operator-entered burst-send parameters and their validated form.

use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CanError, CanResult};
use crate::types::{CanFrame, FRAME_LEN, MAX_EXTENDED_ID, MAX_STANDARD_ID, payload_from};

/// Burst parameters exactly as typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BurstParams {
    /// Identifier, hex (`"100"` or `"0x100"`).
    pub id: String,
    /// Payload bytes, hex, one entry per byte (up to 8).
    pub data: Vec<String>,
    /// Declared data length, decimal.
    pub length: String,
    /// Number of frames to send, decimal.
    pub count: String,
    /// Pause after each frame, decimal milliseconds.
    pub interval_ms: String,
    /// Add the repetition index to the identifier.
    pub increment_id: bool,
    pub extended: bool,
}

/// A validated burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstRequest {
    pub id: u32,
    pub data: Vec<u8>,
    pub count: u32,
    pub interval: Duration,
    pub increment_id: bool,
    pub extended: bool,
}

fn parse_hex<T>(
    field: &str,
    text: &str,
    parse: fn(&str, u32) -> Result<T, ParseIntError>,
) -> CanResult<T> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    parse(digits, 16).map_err(|e| CanError::InvalidParams(format!("{field} {text:?}: {e}")))
}

fn parse_dec<T: FromStr<Err = ParseIntError>>(field: &str, text: &str) -> CanResult<T> {
    text.trim()
        .parse()
        .map_err(|e| CanError::InvalidParams(format!("{field} {text:?}: {e}")))
}

impl BurstRequest {
    pub fn parse(params: &BurstParams) -> CanResult<Self> {
        let id = parse_hex("id", &params.id, u32::from_str_radix)?;
        let length: usize = parse_dec("length", &params.length)?;
        let count: u32 = parse_dec("count", &params.count)?;
        let interval_ms: u64 = parse_dec("interval", &params.interval_ms)?;

        if length > FRAME_LEN {
            return Err(CanError::InvalidParams(format!(
                "length {length} exceeds {FRAME_LEN}"
            )));
        }
        if params.data.len() > FRAME_LEN {
            return Err(CanError::InvalidParams(format!(
                "{} data bytes exceeds {FRAME_LEN}",
                params.data.len()
            )));
        }
        let bytes = params
            .data
            .iter()
            .enumerate()
            .map(|(i, b)| parse_hex(&format!("data[{i}]"), b, u8::from_str_radix))
            .collect::<CanResult<Vec<u8>>>()?;

        let max_id = if params.extended {
            MAX_EXTENDED_ID
        } else {
            MAX_STANDARD_ID
        };
        let last_id = if params.increment_id {
            id.checked_add(count.saturating_sub(1))
        } else {
            Some(id)
        };
        match last_id {
            Some(last) if last <= max_id => {}
            _ => {
                return Err(CanError::InvalidParams(format!(
                    "identifier 0x{id:X} (x{count}) exceeds 0x{max_id:X}"
                )));
            }
        }

        Ok(Self {
            id,
            data: payload_from(&bytes)[..length].to_vec(),
            count,
            interval: Duration::from_millis(interval_ms),
            increment_id: params.increment_id,
            extended: params.extended,
        })
    }

    /// The `index`-th frame of the burst.
    pub fn frame(&self, index: u32) -> CanFrame {
        let id = if self.increment_id {
            self.id + index
        } else {
            self.id
        };
        CanFrame {
            id,
            data: self.data.clone(),
            extended: self.extended,
        }
    }
}
