//! Bit-level signal helpers shared by the protocol codecs.
//!
//! All multi-byte signals on both vehicle buses are big-endian. Offsets are
//! byte indices into an 8-byte [`Payload`].

use crate::types::Payload;

/// Unsigned 16-bit big-endian field at `at..at + 2`.
pub fn be_u16(payload: &Payload, at: usize) -> u16 {
    u16::from_be_bytes([payload[at], payload[at + 1]])
}

/// Signed 16-bit big-endian field at `at..at + 2`.
pub fn be_i16(payload: &Payload, at: usize) -> i16 {
    i16::from_be_bytes([payload[at], payload[at + 1]])
}

/// Unsigned 32-bit big-endian field at `at..at + 4`.
pub fn be_u32(payload: &Payload, at: usize) -> u32 {
    u32::from_be_bytes([
        payload[at],
        payload[at + 1],
        payload[at + 2],
        payload[at + 3],
    ])
}

/// Write `value` big-endian at `at..at + 2`.
pub fn put_be_u16(payload: &mut Payload, at: usize, value: u16) {
    payload[at..at + 2].copy_from_slice(&value.to_be_bytes());
}

/// Interpret the low `bits` of `raw` as a two's-complement integer.
pub fn sign_extend(raw: u32, bits: u32) -> i32 {
    debug_assert!((1..=32).contains(&bits));
    let shift = 32 - bits;
    ((raw << shift) as i32) >> shift
}

/// Convert a physical value to its raw integer at `resolution` units per bit.
///
/// Rounds to nearest; NaN quantizes to 0.
pub fn quantize(value: f64, resolution: f64) -> i32 {
    (value / resolution).round() as i32
}

/// Quantize into a 16-bit field, two's-complement for negative values.
pub fn quantize_u16(value: f64, resolution: f64) -> u16 {
    quantize(value, resolution) as u16
}

/// `value` clamped to `[min, max]`. NaN is treated as zero.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0_f64.clamp(min, max);
    }
    value.clamp(min, max)
}
