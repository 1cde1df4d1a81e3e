//! Decimal split, digit buffer and the lock-free handoff between the
//! acquisition path (single writer) and the refresh path (single reader).
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::DIGITS;
use crate::segment::{BLANK, DECIMAL_POINT, decode, encode};

/// Largest value the panel can show.
pub const MAX_DISPLAY: u16 = 9999;

const _: () = assert!(DIGITS == 4, "DigitBuffer packs into a u32");

/// Split `value` (clamped to [`MAX_DISPLAY`]) into decimal digits,
/// least-significant first.
pub fn split_decimal(value: u16) -> [u8; DIGITS] {
    let mut rest = value.min(MAX_DISPLAY);
    let mut out = [0u8; DIGITS];
    for digit in &mut out {
        *digit = (rest % 10) as u8;
        rest /= 10;
    }
    out
}

/// How a measurement is laid out on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLayout {
    /// Position carrying the decimal point, 0 = rightmost.
    pub decimal_point: Option<usize>,
    /// Blank zeros left of the most significant non-zero digit.
    pub blank_leading_zeros: bool,
}

impl Default for DisplayLayout {
    /// `XX.XX`: hundredths on positions 0-1, decimal point on position 2.
    fn default() -> Self {
        Self {
            decimal_point: Some(2),
            blank_leading_zeros: true,
        }
    }
}

impl DisplayLayout {
    /// Lowest position that may be blanked as a leading zero. Positions at or
    /// below the decimal point and position 0 always show a digit.
    fn first_blankable(&self) -> usize {
        self.decimal_point.map_or(1, |dp| dp + 1).max(1)
    }
}

/// Encoded patterns for every position, index 0 = rightmost digit = enable line 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DigitBuffer([u8; DIGITS]);

impl DigitBuffer {
    /// Every segment off.
    pub const fn blank() -> Self {
        Self([BLANK; DIGITS])
    }

    pub const fn from_patterns(patterns: [u8; DIGITS]) -> Self {
        Self(patterns)
    }

    /// Encode a scaled measurement for display.
    pub fn from_measurement(value: u16, layout: &DisplayLayout) -> Self {
        let digits = split_decimal(value);
        let floor = layout.first_blankable();
        let mut patterns = [BLANK; DIGITS];
        let mut leading = layout.blank_leading_zeros;
        for pos in (0..DIGITS).rev() {
            let d = digits[pos];
            if leading && d == 0 && pos >= floor {
                continue;
            }
            leading = false;
            patterns[pos] = encode(d, layout.decimal_point == Some(pos));
        }
        Self(patterns)
    }

    /// Pattern for one position; out-of-range positions read as blank.
    #[inline]
    pub fn pattern(&self, position: usize) -> u8 {
        self.0.get(position).copied().unwrap_or(BLANK)
    }

    pub const fn patterns(&self) -> [u8; DIGITS] {
        self.0
    }

    #[inline]
    pub const fn to_bits(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits.to_le_bytes())
    }
}

/// Leftmost digit first; unlit or unrecognised patterns print as a space.
impl fmt::Display for DigitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &p in self.0.iter().rev() {
            match decode(p) {
                Some(d) => write!(f, "{d}")?,
                None => f.write_str(" ")?,
            }
            if p & DECIMAL_POINT != 0 {
                f.write_str(".")?;
            }
        }
        Ok(())
    }
}

/// Single-word handoff of the current [`DigitBuffer`].
///
/// `publish` is one release store and `snapshot` one acquire load, so a reader
/// sees either the old buffer or the new one in full.
#[derive(Debug, Clone, Default)]
pub struct SharedDigitBuffer {
    bits: Arc<AtomicU32>,
}

impl SharedDigitBuffer {
    pub fn new(initial: DigitBuffer) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(initial.to_bits())),
        }
    }

    #[inline]
    pub fn publish(&self, buffer: &DigitBuffer) {
        self.bits.store(buffer.to_bits(), Ordering::Release);
    }

    #[inline]
    pub fn snapshot(&self) -> DigitBuffer {
        DigitBuffer::from_bits(self.bits.load(Ordering::Acquire))
    }
}
