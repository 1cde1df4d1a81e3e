//! Converter access and raw-to-hundredths scaling.
//!
//! `read_raw` blocks the caller while polling the converter, so a `Sampler`
//! belongs to the acquisition path only; the refresh path never touches it.
//! Polling is bounded: a conversion that does not complete within the
//! configured timeout is reported as `DisplayError::ConversionTimeout`.
use std::time::Duration;

use segdisp_traits::{Clock, Converter};
use tracing::{trace, warn};

use crate::config::{SamplingCfg, ScaleCfg};
use crate::{RawSample, ScaledMeasurement};
use crate::digits::MAX_DISPLAY;
use crate::error::DisplayError;
use crate::hw_error::map_hw_error;
use crate::util::duration_ms;

/// Scale a raw count to hundredths of the sensor unit, rounding half-up and
/// clamping to what the panel can show.
///
/// `value = (raw * reference_mv * 10 + full_scale / 2) / full_scale`
#[inline]
pub fn to_scaled(raw: RawSample, scale: &ScaleCfg) -> ScaledMeasurement {
    let full = u64::from(scale.full_scale.max(1));
    let raw = u64::from(raw).min(full);
    let value = (raw * u64::from(scale.reference_mv) * 10 + full / 2) / full;
    u16::try_from(value.min(u64::from(MAX_DISPLAY))).unwrap_or(MAX_DISPLAY)
}

pub struct Sampler<A, C> {
    converter: A,
    clock: C,
    scale: ScaleCfg,
    timeout: Duration,
    poll_interval: Duration,
}

impl<A: Converter, C: Clock> Sampler<A, C> {
    pub fn new(converter: A, scale: ScaleCfg, sampling: &SamplingCfg, clock: C) -> Self {
        Self {
            converter,
            clock,
            scale,
            timeout: sampling.conversion_timeout,
            poll_interval: sampling.poll_interval,
        }
    }

    /// Run one conversion on `channel` and return the raw count, clamped to
    /// the converter's full scale.
    pub fn read_raw(&mut self, channel: u8) -> Result<RawSample, DisplayError> {
        self.converter
            .start_conversion(channel)
            .map_err(|e| map_hw_error(&*e))?;
        let started = self.clock.now();
        loop {
            if self
                .converter
                .is_conversion_done()
                .map_err(|e| map_hw_error(&*e))?
            {
                break;
            }
            let waited = self.clock.now().saturating_duration_since(started);
            if waited >= self.timeout {
                let waited_ms = duration_ms(waited);
                warn!(channel, waited_ms, "conversion did not complete");
                return Err(DisplayError::ConversionTimeout { channel, waited_ms });
            }
            self.clock
                .sleep(self.poll_interval.min(self.timeout - waited));
        }
        let raw = self
            .converter
            .read_result()
            .map_err(|e| map_hw_error(&*e))?;
        trace!(channel, raw, "conversion complete");
        Ok(raw.min(self.scale.full_scale))
    }

    #[inline]
    pub fn to_scaled(&self, raw: RawSample) -> ScaledMeasurement {
        to_scaled(raw, &self.scale)
    }

    /// `read_raw` followed by `to_scaled`; returns `(raw, scaled)`.
    pub fn sample(&mut self, channel: u8) -> Result<(RawSample, ScaledMeasurement), DisplayError> {
        let raw = self.read_raw(channel)?;
        Ok((raw, self.to_scaled(raw)))
    }

    pub fn scale(&self) -> &ScaleCfg {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ScriptedConverter;
    use rstest::rstest;
    use segdisp_traits::clock::ManualClock;

    fn sampling(timeout_ms: u64, poll_us: u64) -> SamplingCfg {
        SamplingCfg {
            conversion_timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_micros(poll_us),
            ..SamplingCfg::default()
        }
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 49)]
    #[case(31, 1515)]
    #[case(204, 9971)]
    #[case(205, 9999)]
    #[case(1023, 9999)]
    #[case(u16::MAX, 9999)]
    fn scales_like_the_reference_board(#[case] raw: u16, #[case] expected: u16) {
        assert_eq!(to_scaled(raw, &ScaleCfg::default()), expected);
    }

    #[test]
    fn three_volt_reference_scales_proportionally() {
        let scale = ScaleCfg {
            reference_mv: 3300,
            full_scale: 1023,
        };
        // 100 counts * 3.3 V / 1023 = 322.58 mV -> 3225.8 hundredths
        assert_eq!(to_scaled(100, &scale), 3226);
    }

    #[test]
    fn read_raw_waits_for_completion() {
        let clock = ManualClock::new();
        let conv = ScriptedConverter::new([512]).with_latency_polls(4);
        let mut s = Sampler::new(conv, ScaleCfg::default(), &sampling(5, 50), clock.clone());
        assert_eq!(s.read_raw(6).expect("read"), 512);
        assert_eq!(clock.elapsed(), Duration::from_micros(200));
    }

    #[test]
    fn read_raw_clamps_to_full_scale() {
        let conv = ScriptedConverter::new([0x3FF, 0xFFFF]);
        let scale = ScaleCfg {
            reference_mv: 5000,
            full_scale: 1000,
        };
        let mut s = Sampler::new(conv, scale, &sampling(5, 50), ManualClock::new());
        assert_eq!(s.read_raw(6).expect("read"), 1000);
        assert_eq!(s.read_raw(6).expect("read"), 1000);
    }

    #[test]
    fn stalled_conversion_times_out() {
        let clock = ManualClock::new();
        let conv = ScriptedConverter::new([1]).stalled();
        let mut s = Sampler::new(conv, ScaleCfg::default(), &sampling(3, 400), clock.clone());
        let err = s.read_raw(6).expect_err("stall must time out");
        assert_eq!(
            err,
            DisplayError::ConversionTimeout {
                channel: 6,
                waited_ms: 3
            }
        );
        // Last sleep is trimmed so the wait never overshoots the bound.
        assert_eq!(clock.elapsed(), Duration::from_millis(3));
    }

    #[test]
    fn converter_errors_are_mapped() {
        let conv = ScriptedConverter::new([1]).failing("bus fault");
        let mut s = Sampler::new(conv, ScaleCfg::default(), &sampling(3, 50), ManualClock::new());
        assert_eq!(
            s.read_raw(6),
            Err(DisplayError::Hardware("bus fault".into()))
        );
    }
}
