//! Seven-segment encoding for common-cathode digits.
//!
//! Bit layout: bit 0 = segment a ... bit 6 = segment g, bit 7 = decimal point.

/// Segment patterns for 0-9.
pub static SEGMENT_TABLE: [u8; 10] = [0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F];

/// All segments off.
pub const BLANK: u8 = 0x00;

/// Decimal-point bit.
pub const DECIMAL_POINT: u8 = 0x80;

/// Encode a decimal digit. Out-of-range digits wrap modulo 10.
#[inline]
pub fn encode(digit: u8, decimal_point: bool) -> u8 {
    let pattern = SEGMENT_TABLE[usize::from(digit % 10)];
    if decimal_point {
        pattern | DECIMAL_POINT
    } else {
        pattern
    }
}

/// Inverse of [`encode`]: the digit a pattern shows, ignoring the decimal point.
/// Returns `None` for blank or non-digit patterns.
pub fn decode(pattern: u8) -> Option<u8> {
    let segments = pattern & !DECIMAL_POINT;
    SEGMENT_TABLE
        .iter()
        .position(|&p| p == segments)
        .and_then(|d| u8::try_from(d).ok())
}
