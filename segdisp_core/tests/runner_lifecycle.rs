//! Runner thread lifecycle and cleanup.
//!
//! Verifies that:
//! - Both threads are joined when the display is dropped
//! - Repeated start/stop does not leak threads or hang
//! - A converter stall mid-run keeps the last reading and reports faults
use std::time::{Duration, Instant};

use segdisp_core::{
    AcquisitionStatus, DigitBuffer, DisplayLayout, DynEngine, EngineCfg, RunningDisplay,
    SamplingCfg,
};
use segdisp_hardware::{SimPanel, SimulatedConverter};

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let until = Instant::now() + Duration::from_secs(5);
    while Instant::now() < until {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    false
}

fn start(panel: &SimPanel, converter: SimulatedConverter) -> RunningDisplay {
    let cfg = EngineCfg {
        sampling: SamplingCfg {
            cadence_cycles: 2,
            conversion_timeout: Duration::from_millis(2),
            ..SamplingCfg::default()
        },
        ..EngineCfg::default()
    };
    let engine = DynEngine::builder()
        .with_digit_lines(panel.digit_lines())
        .with_segment_bus(panel.segment_bus())
        .with_converter(converter)
        .with_cfg(cfg)
        .build()
        .expect("build");
    RunningDisplay::spawn(engine).expect("spawn")
}

#[test]
fn threads_exit_on_drop_and_panel_goes_dark() {
    let panel = SimPanel::new();
    let running = start(&panel, SimulatedConverter::new(250, 5000, 1023));
    assert!(wait_for(|| running.stats().cycles > 5));

    let began = Instant::now();
    drop(running);
    assert!(began.elapsed() < Duration::from_secs(1), "shutdown must be prompt");
    assert_eq!(panel.active_lines(), 0);
    assert_eq!(panel.overlaps(), 0);
}

#[test]
fn repeated_start_stop_does_not_hang() {
    let panel = SimPanel::new();
    for _ in 0..10 {
        let running = start(&panel, SimulatedConverter::new(250, 5000, 1023));
        std::thread::sleep(Duration::from_millis(5));
        let _ = running.latest();
        let stats = running.stop();
        assert!(stats.ticks > 0);
    }
}

#[test]
fn new_input_reaches_the_panel() {
    let panel = SimPanel::new();
    let converter = SimulatedConverter::new(250, 5000, 1023);
    let sensor = converter.handle();
    let running = start(&panel, converter);

    // 250 mV -> 51 counts -> 24.93
    let first = DigitBuffer::from_measurement(2493, &DisplayLayout::default());
    assert_eq!(running.shown(), first);

    // 300 mV -> 61 counts -> 29.81 once the window has turned over.
    sensor.set_millivolts(300);
    let settled = DigitBuffer::from_measurement(2981, &DisplayLayout::default());
    assert!(wait_for(|| running.shown() == settled));
    assert!(wait_for(|| panel.latched() == settled.patterns()));
}

#[test]
fn stall_mid_run_keeps_last_reading() {
    let panel = SimPanel::new();
    let converter = SimulatedConverter::new(250, 5000, 1023);
    let sensor = converter.handle();
    let running = start(&panel, converter);
    let shown = running.shown();

    sensor.set_stalled(true);
    let mut faults = 0;
    assert!(wait_for(|| {
        if let Some(AcquisitionStatus::Faulted { consecutive, error }) = running.latest() {
            assert!(error.is_timeout());
            faults = consecutive;
        }
        faults >= 2
    }));
    assert_eq!(running.shown(), shown);
    assert!(running.is_refreshing());

    sensor.set_stalled(false);
    assert!(wait_for(|| matches!(
        running.latest(),
        Some(AcquisitionStatus::Updated { .. })
    )));
}
