#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the multiplexed display.
//!
//! `Config` and its sections are deserialized from TOML once at start-up and
//! validated with [`Config::validate`]. Digit count and filter window are
//! compile-time constants of the engine and are deliberately not configurable.
use serde::Deserialize;
use serde::de::Deserializer;

/// Number of digit positions on the board (`segdisp_core::DIGITS`).
pub const BOARD_DIGITS: usize = 4;

/// Longest full refresh cycle (all digits) that still reads as steady: 50 Hz.
pub const MAX_CYCLE_US: u64 = 20_000;

/// Highest channel the simulated converter accepts.
pub const MAX_CHANNEL: u8 = 15;

/// Highest channel on the MCP3008 (`segdisp_hardware::mcp3008::MAX_CHANNEL`).
pub const HARDWARE_MAX_CHANNEL: u8 = 7;

/// GPIO numbering (BCM) for the Raspberry Pi backend. Ignored by the simulator.
#[derive(Debug, Deserialize, Clone)]
pub struct Pins {
    /// Digit-enable lines, index 0 = rightmost digit.
    pub digit_enable: [u8; BOARD_DIGITS],
    /// Segment lines a, b, c, d, e, f, g, dp.
    pub segments: [u8; 8],
    /// Drive digit-enable lines low to select a digit (transistor-inverted boards).
    #[serde(default)]
    pub digit_active_low: bool,
}

/// SPI converter wiring for the Raspberry Pi backend.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AdcCfg {
    pub spi_bus: u8,
    pub chip_select: u8,
    pub clock_hz: u32,
}

impl Default for AdcCfg {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            chip_select: 0,
            clock_hz: 1_000_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshCfg {
    /// How long each digit stays lit (µs).
    pub on_time_us: u64,
    /// Dark gap before the next digit is lit (µs).
    pub blank_time_us: u64,
}

impl Default for RefreshCfg {
    fn default() -> Self {
        Self {
            on_time_us: 900,
            blank_time_us: 80,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SamplingCfg {
    /// Converter channel the sensor is wired to.
    pub channel: u8,
    /// Run the acquisition path once every this many full refresh cycles.
    pub cadence_cycles: u32,
    /// Give up on a single conversion after this long (ms).
    pub conversion_timeout_ms: u64,
    /// Sleep between completion polls (µs).
    pub poll_interval_us: u64,
    /// Extra attempts after a timed-out conversion before reporting a fault.
    pub max_retries: u8,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            channel: 6,
            cadence_cycles: 64,
            conversion_timeout_ms: 5,
            poll_interval_us: 50,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensorCfg {
    /// Converter reference voltage in millivolts (5000 or 3300 on the reference board).
    pub reference_mv: u32,
    /// Converter full-scale count (1023 for 10-bit).
    pub full_scale_counts: u16,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            reference_mv: 5000,
            full_scale_counts: 1023,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayCfg {
    /// Position carrying the decimal point (0 = rightmost). Accepts an index
    /// or the keyword "none".
    #[serde(deserialize_with = "de_decimal_point")]
    pub decimal_point: Option<usize>,
    /// Blank zeros left of the integer part.
    pub blank_leading_zeros: bool,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            decimal_point: Some(2),
            blank_leading_zeros: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DecimalPointToml {
    Position(usize),
    Keyword(String),
}

fn de_decimal_point<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    match DecimalPointToml::deserialize(deserializer)? {
        DecimalPointToml::Position(p) => Ok(Some(p)),
        DecimalPointToml::Keyword(k) if k.eq_ignore_ascii_case("none") => Ok(None),
        DecimalPointToml::Keyword(k) => Err(serde::de::Error::custom(format!(
            "decimal_point must be a position or \"none\", got \"{k}\""
        ))),
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Required only by the hardware backend.
    #[serde(default)]
    pub pins: Option<Pins>,
    #[serde(default)]
    pub adc: AdcCfg,
    #[serde(default)]
    pub refresh: RefreshCfg,
    #[serde(default)]
    pub sampling: SamplingCfg,
    #[serde(default)]
    pub sensor: SensorCfg,
    #[serde(default)]
    pub display: DisplayCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Refresh
        if self.refresh.on_time_us == 0 {
            eyre::bail!("refresh.on_time_us must be > 0");
        }
        if self.refresh.blank_time_us == 0 {
            eyre::bail!("refresh.blank_time_us must be > 0");
        }
        let cycle_us = self.cycle_us();
        if cycle_us > MAX_CYCLE_US {
            eyre::bail!(
                "refresh cycle of {cycle_us}us exceeds {MAX_CYCLE_US}us; the display would flicker"
            );
        }

        // Sampling
        if self.sampling.channel > MAX_CHANNEL {
            eyre::bail!("sampling.channel must be in 0..={MAX_CHANNEL}");
        }
        if self.sampling.cadence_cycles == 0 {
            eyre::bail!("sampling.cadence_cycles must be >= 1");
        }
        if self.sampling.conversion_timeout_ms == 0 {
            eyre::bail!("sampling.conversion_timeout_ms must be >= 1");
        }
        if self.sampling.poll_interval_us == 0 {
            eyre::bail!("sampling.poll_interval_us must be >= 1");
        }
        let timeout_us = self.sampling.conversion_timeout_ms.saturating_mul(1000);
        if self.sampling.poll_interval_us > timeout_us {
            eyre::bail!("sampling.poll_interval_us must not exceed the conversion timeout");
        }

        // Sensor
        if self.sensor.reference_mv == 0 {
            eyre::bail!("sensor.reference_mv must be > 0");
        }
        if self.sensor.full_scale_counts == 0 || self.sensor.full_scale_counts > 1023 {
            eyre::bail!("sensor.full_scale_counts must be in 1..=1023");
        }

        // Display
        if let Some(dp) = self.display.decimal_point
            && dp >= BOARD_DIGITS
        {
            eyre::bail!("display.decimal_point must be < {BOARD_DIGITS}");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Pins: every line must be distinct
        if let Some(pins) = &self.pins {
            let mut all: Vec<u8> = pins
                .digit_enable
                .iter()
                .chain(pins.segments.iter())
                .copied()
                .collect();
            all.sort_unstable();
            if all.windows(2).any(|w| w[0] == w[1]) {
                eyre::bail!("pins: digit_enable and segments must use distinct GPIO numbers");
            }
        }

        Ok(())
    }

    /// [`Config::validate`] plus the constraints of the Raspberry Pi backend:
    /// `[pins]` must be present and the channel must exist on the MCP3008.
    pub fn validate_for_hardware(&self) -> eyre::Result<()> {
        self.validate()?;
        if self.pins.is_none() {
            eyre::bail!("[pins] is required for the hardware backend");
        }
        if self.sampling.channel > HARDWARE_MAX_CHANNEL {
            eyre::bail!(
                "sampling.channel must be in 0..={HARDWARE_MAX_CHANNEL} on the MCP3008, got {}",
                self.sampling.channel
            );
        }
        Ok(())
    }

    /// Full refresh cycle length in microseconds.
    pub fn cycle_us(&self) -> u64 {
        self.refresh
            .on_time_us
            .saturating_add(self.refresh.blank_time_us)
            .saturating_mul(BOARD_DIGITS as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_board_defaults() {
        let cfg = load_toml("").expect("empty config parses");
        assert_eq!(cfg.refresh.on_time_us, 900);
        assert_eq!(cfg.refresh.blank_time_us, 80);
        assert_eq!(cfg.sampling.channel, 6);
        assert_eq!(cfg.sensor.full_scale_counts, 1023);
        assert_eq!(cfg.display.decimal_point, Some(2));
        assert_eq!(cfg.cycle_us(), 3920);
        cfg.validate().expect("defaults are valid");
    }
}
