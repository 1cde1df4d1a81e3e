//! Config mapping, backend assembly, and the `run` / `self-check` commands.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::WrapErr;
use segdisp_config::Config;
use segdisp_core::error::{DisplayError, Result};
use segdisp_core::util::refresh_hz;
use segdisp_core::{AcquisitionStatus, DynEngine, EngineCfg, RefreshStats, RunningDisplay};

use crate::cli::RtOpts;
use crate::error_fmt::ConfigError;
use crate::rt::setup_rt_once;

/// How often the foreground loop checks for events and shutdown.
const SUPERVISE_EVERY: Duration = Duration::from_millis(20);

/// What a finished `run` reports.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Panel contents at shutdown, leftmost digit first.
    pub shown: String,
    pub last: Option<AcquisitionStatus>,
    pub stats: RefreshStats,
    pub elapsed: Duration,
}

/// Read, parse and validate the config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("read {}: {e}", path.display())))?;
    let cfg = segdisp_config::load_toml(&text)
        .map_err(|e| ConfigError(format!("parse {}: {e}", path.display())))?;
    cfg.validate().map_err(|e| ConfigError(e.to_string()))?;
    Ok(cfg)
}

/// Assemble an engine on the Raspberry Pi GPIO/SPI backend.
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn assemble(cfg: &Config) -> Result<DynEngine> {
    use segdisp_hardware::gpio::open_panel;
    use segdisp_hardware::mcp3008::Mcp3008;

    cfg.validate_for_hardware().map_err(|e| ConfigError(e.to_string()))?;
    let pins = cfg
        .pins
        .as_ref()
        .ok_or_else(|| ConfigError("[pins] is required for the hardware backend".into()))?;
    let (lines, bus) = open_panel(&pins.digit_enable, &pins.segments, pins.digit_active_low)
        .map_err(eyre::Report::new)?;
    let converter = Mcp3008::new(cfg.adc.spi_bus, cfg.adc.chip_select, cfg.adc.clock_hz)
        .map_err(eyre::Report::new)?;
    tracing::info!(
        spi_bus = cfg.adc.spi_bus,
        chip_select = cfg.adc.chip_select,
        "hardware backend opened"
    );

    DynEngine::builder()
        .with_cfg(EngineCfg::from(cfg))
        .with_digit_lines(lines)
        .with_segment_bus(bus)
        .with_converter(converter)
        .build()
}

/// Assemble an engine on the simulated panel and converter.
///
/// The input voltage comes from `SEGDISP_SIM_MV`; `SEGDISP_SIM_STALL=1` stalls
/// the converter.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn assemble(cfg: &Config) -> Result<DynEngine> {
    use segdisp_hardware::{SimPanel, SimulatedConverter};

    const ENV_SIM_MV: &str = "SEGDISP_SIM_MV";
    const ENV_SIM_STALL: &str = "SEGDISP_SIM_STALL";
    const DEFAULT_SIM_MV: u32 = 250;

    let millivolts = match std::env::var(ENV_SIM_MV) {
        Ok(v) => v
            .trim()
            .parse::<u32>()
            .map_err(|e| ConfigError(format!("{ENV_SIM_MV}={v}: {e}")))?,
        Err(_) => DEFAULT_SIM_MV,
    };
    let stalled = std::env::var(ENV_SIM_STALL).is_ok_and(|v| v.trim() == "1");

    let panel = SimPanel::new();
    let converter = SimulatedConverter::new(
        millivolts,
        cfg.sensor.reference_mv,
        cfg.sensor.full_scale_counts,
    );
    converter.handle().set_stalled(stalled);
    tracing::info!(millivolts, stalled, "simulated backend");

    DynEngine::builder()
        .with_cfg(EngineCfg::from(cfg))
        .with_digit_lines(panel.digit_lines())
        .with_segment_bus(panel.segment_bus())
        .with_converter(converter)
        .build()
}

/// Drive the panel until `shutdown` is set or `duration` has passed.
pub fn run_display(
    cfg: &Config,
    duration: Option<Duration>,
    rt: RtOpts,
    shutdown: &Arc<AtomicBool>,
) -> Result<RunOutcome> {
    setup_rt_once(rt);

    let engine = assemble(cfg)?;
    let running = RunningDisplay::spawn(engine).wrap_err("start display")?;
    let started = Instant::now();
    let mut last = None;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if duration.is_some_and(|d| started.elapsed() >= d) {
            break;
        }
        if !running.is_refreshing() {
            let err = running
                .take_failure()
                .unwrap_or_else(|| DisplayError::State("refresh thread stopped".into()));
            return Err(eyre::Report::new(err));
        }
        if let Some(status) = running.latest() {
            match &status {
                AcquisitionStatus::Updated {
                    raw,
                    scaled,
                    average,
                } => tracing::debug!(raw, scaled, average, shown = %running.shown(), "reading"),
                AcquisitionStatus::Faulted { error, consecutive } => {
                    tracing::warn!(error = %error, consecutive, "acquisition fault; panel holds last reading");
                }
            }
            last = Some(status);
        }
        std::thread::sleep(SUPERVISE_EVERY);
    }

    let shown = running.shown().to_string();
    let elapsed = started.elapsed();
    let stats = running.stop();
    tracing::info!(
        shown = %shown,
        ticks = stats.ticks,
        cycles = stats.cycles,
        overruns = stats.overruns,
        "display stopped"
    );
    Ok(RunOutcome {
        shown,
        last,
        stats,
        elapsed,
    })
}

/// Build the engine and take one primed reading without starting the threads.
pub fn self_check(cfg: &Config) -> Result<String> {
    let mut engine = assemble(cfg)?;
    let average = engine.prime().map_err(eyre::Report::new)?;
    engine.blank().map_err(eyre::Report::new)?;
    let shown = engine.buffer().snapshot().to_string();
    tracing::info!(average, shown = %shown, "self-check passed");
    Ok(shown)
}

/// Print refresh timing stats to stderr.
pub fn print_stats(cfg: &Config, outcome: &RunOutcome) {
    let s = &outcome.stats;
    let secs = outcome.elapsed.as_secs_f64();
    let measured_hz = if secs > 0.0 {
        s.cycles as f64 / secs
    } else {
        0.0
    };
    eprintln!("\n--- Refresh Stats ---");
    eprintln!("Ticks: {}", s.ticks);
    eprintln!("Cycles: {}", s.cycles);
    eprintln!(
        "Cycle (us): {}  nominal {} Hz, measured {measured_hz:.1} Hz",
        cfg.cycle_us(),
        refresh_hz(cfg.cycle_us())
    );
    eprintln!("Overruns (work past deadline): {}", s.overruns);
    eprintln!("Max wake-up lateness (us): {}", s.max_lateness_us);
    eprintln!("---------------------\n");
}

#[cfg(all(test, feature = "hardware", target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn hardware_channel_limit_matches_the_converter() {
        assert_eq!(
            segdisp_config::HARDWARE_MAX_CHANNEL,
            segdisp_hardware::mcp3008::MAX_CHANNEL
        );
    }

    #[test]
    fn hardware_assembly_rejects_unwired_channel() {
        let cfg = segdisp_config::load_toml(
            "[sampling]\nchannel = 12\n[pins]\ndigit_enable = [17, 27, 22, 23]\nsegments = [5, 6, 13, 19, 26, 16, 20, 21]\n",
        )
        .expect("parse TOML");
        let err = assemble(&cfg).expect_err("channel 12 is not on the MCP3008");
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }
}
