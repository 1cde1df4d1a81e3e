//! Common time helpers for segdisp_core.
use std::time::Duration;

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Duration in whole microseconds, saturating at `u64::MAX`.
#[inline]
pub fn duration_us(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

/// Duration in whole milliseconds, saturating at `u64::MAX`.
#[inline]
pub fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Full-panel refresh rate for a given cycle length.
/// - Clamps `cycle_us` to at least 1 to avoid division by zero.
#[inline]
pub fn refresh_hz(cycle_us: u64) -> u64 {
    MICROS_PER_SEC / cycle_us.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_timing_refreshes_above_flicker_threshold() {
        assert_eq!(refresh_hz(3920), 255);
        assert_eq!(refresh_hz(0), MICROS_PER_SEC);
    }

    #[test]
    fn conversions_saturate() {
        assert_eq!(duration_us(Duration::from_micros(980)), 980);
        assert_eq!(duration_ms(Duration::from_micros(980)), 0);
        assert_eq!(duration_us(Duration::MAX), u64::MAX);
    }
}
