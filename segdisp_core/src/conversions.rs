//! `From` implementations bridging `segdisp_config` types to `segdisp_core` types.

use std::time::Duration;

use crate::config::{DisplayLayout, EngineCfg, RefreshCfg, SamplingCfg, ScaleCfg};

impl From<&segdisp_config::RefreshCfg> for RefreshCfg {
    fn from(c: &segdisp_config::RefreshCfg) -> Self {
        Self {
            on_time: Duration::from_micros(c.on_time_us),
            blank_time: Duration::from_micros(c.blank_time_us),
        }
    }
}

impl From<&segdisp_config::SamplingCfg> for SamplingCfg {
    fn from(c: &segdisp_config::SamplingCfg) -> Self {
        Self {
            channel: c.channel,
            cadence_cycles: c.cadence_cycles,
            conversion_timeout: Duration::from_millis(c.conversion_timeout_ms),
            poll_interval: Duration::from_micros(c.poll_interval_us),
            max_retries: c.max_retries,
        }
    }
}

impl From<&segdisp_config::SensorCfg> for ScaleCfg {
    fn from(c: &segdisp_config::SensorCfg) -> Self {
        Self {
            reference_mv: c.reference_mv,
            full_scale: c.full_scale_counts,
        }
    }
}

impl From<&segdisp_config::DisplayCfg> for DisplayLayout {
    fn from(c: &segdisp_config::DisplayCfg) -> Self {
        Self {
            decimal_point: c.decimal_point,
            blank_leading_zeros: c.blank_leading_zeros,
        }
    }
}

impl From<&segdisp_config::Config> for EngineCfg {
    fn from(c: &segdisp_config::Config) -> Self {
        Self {
            refresh: (&c.refresh).into(),
            sampling: (&c.sampling).into(),
            scale: (&c.sensor).into(),
            layout: (&c.display).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_defaults_match_engine_defaults() {
        let cfg = segdisp_config::load_toml("").expect("parse");
        assert_eq!(EngineCfg::from(&cfg), EngineCfg::default());
    }

    #[test]
    fn units_are_converted() {
        let cfg = segdisp_config::load_toml(
            "[refresh]\non_time_us = 1200\nblank_time_us = 100\n\
             [sampling]\nconversion_timeout_ms = 3\npoll_interval_us = 20\n\
             [display]\ndecimal_point = \"none\"\n",
        )
        .expect("parse");
        let engine = EngineCfg::from(&cfg);
        assert_eq!(engine.refresh.on_time, Duration::from_micros(1200));
        assert_eq!(engine.refresh.cycle(), Duration::from_micros(5200));
        assert_eq!(engine.sampling.conversion_timeout, Duration::from_millis(3));
        assert_eq!(engine.sampling.poll_interval, Duration::from_micros(20));
        assert_eq!(engine.layout.decimal_point, None);
    }
}
