//! Hardware collaborator contracts for the multiplexed display engine.
//!
//! The engine only ever talks to the outside world through these traits:
//! a bank of mutually exclusive digit-enable lines, an 8-bit segment bus and
//! a polled analog converter. Timing goes through [`Clock`].
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error used at every trait boundary.
pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Digit-enable (common) lines. Exactly one position may be enabled at a time.
pub trait DigitLines {
    /// Drive the line for `position` active. Callers disable all lines first.
    fn enable_position(&mut self, position: usize) -> HwResult<()>;
    /// Drive every digit line inactive.
    fn disable_all(&mut self) -> HwResult<()>;
}

/// Segment output lines a..g plus decimal point (bit 7).
pub trait SegmentBus {
    fn write_pattern(&mut self, pattern: u8) -> HwResult<()>;
}

/// Polled analog-to-digital converter.
pub trait Converter {
    fn start_conversion(&mut self, channel: u8) -> HwResult<()>;
    fn is_conversion_done(&mut self) -> HwResult<bool>;
    /// Result of the last completed conversion (10-bit for the reference board).
    fn read_result(&mut self) -> HwResult<u16>;
}

impl<T: DigitLines + ?Sized> DigitLines for Box<T> {
    fn enable_position(&mut self, position: usize) -> HwResult<()> {
        (**self).enable_position(position)
    }
    fn disable_all(&mut self) -> HwResult<()> {
        (**self).disable_all()
    }
}

impl<T: SegmentBus + ?Sized> SegmentBus for Box<T> {
    fn write_pattern(&mut self, pattern: u8) -> HwResult<()> {
        (**self).write_pattern(pattern)
    }
}

impl<T: Converter + ?Sized> Converter for Box<T> {
    fn start_conversion(&mut self, channel: u8) -> HwResult<()> {
        (**self).start_conversion(channel)
    }
    fn is_conversion_done(&mut self) -> HwResult<bool> {
        (**self).is_conversion_done()
    }
    fn read_result(&mut self) -> HwResult<u16> {
        (**self).read_result()
    }
}
