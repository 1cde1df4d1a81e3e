//! Runtime configuration for the display engine.
//!
//! These are the structs the engine consumes; they are separate from the
//! TOML-deserialized config in `segdisp_config` (see `conversions`).
use std::time::Duration;

pub use crate::digits::DisplayLayout;
use crate::DIGITS;

/// Per-digit multiplexing timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshCfg {
    /// How long each digit stays lit.
    pub on_time: Duration,
    /// Dark gap before the next digit is lit.
    pub blank_time: Duration,
}

impl Default for RefreshCfg {
    fn default() -> Self {
        Self {
            on_time: Duration::from_micros(900),
            blank_time: Duration::from_micros(80),
        }
    }
}

impl RefreshCfg {
    /// One full pass over every digit, saturating at `Duration::MAX`.
    pub fn cycle(&self) -> Duration {
        self.on_time
            .checked_add(self.blank_time)
            .and_then(|slot| slot.checked_mul(DIGITS as u32))
            .unwrap_or(Duration::MAX)
    }
}

/// Acquisition cadence and conversion bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingCfg {
    pub channel: u8,
    /// Sample once every this many refresh cycles.
    pub cadence_cycles: u32,
    /// Upper bound on one conversion.
    pub conversion_timeout: Duration,
    /// Sleep between completion polls.
    pub poll_interval: Duration,
    /// Extra attempts before a cycle is reported as faulted.
    pub max_retries: u8,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            channel: 6,
            cadence_cycles: 64,
            conversion_timeout: Duration::from_millis(5),
            poll_interval: Duration::from_micros(50),
            max_retries: 2,
        }
    }
}

/// Raw-count to hundredths scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleCfg {
    pub reference_mv: u32,
    pub full_scale: u16,
}

impl Default for ScaleCfg {
    fn default() -> Self {
        Self {
            reference_mv: 5000,
            full_scale: 1023,
        }
    }
}

/// Everything the engine needs besides hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineCfg {
    pub refresh: RefreshCfg,
    pub sampling: SamplingCfg,
    pub scale: ScaleCfg,
    pub layout: DisplayLayout,
}
