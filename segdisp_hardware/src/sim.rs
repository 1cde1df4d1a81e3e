//! In-memory stand-ins for the board.
//!
//! `SimPanel` models four common-cathode digits sharing one segment bus. It
//! remembers what each position last showed (what the eye would see) and
//! counts the two wiring hazards a multiplexer must avoid: two digits enabled
//! at once, and segment writes while a digit is lit (ghosting).
//!
//! `SimulatedConverter` models a 10-bit converter reading an LM35-style sensor
//! whose input voltage can be changed or stalled at runtime.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};

use segdisp_traits::{Converter, DigitLines, HwResult, SegmentBus};
use tracing::trace;

use crate::error::HwError;

/// Positions on the simulated panel.
pub const SIM_DIGITS: usize = 4;

#[derive(Debug, Default)]
struct PanelState {
    enabled_mask: AtomicU8,
    bus: AtomicU8,
    latched: [AtomicU8; SIM_DIGITS],
    overlaps: AtomicU32,
    ghost_writes: AtomicU32,
    enables: AtomicU64,
}

/// Shared view of the simulated panel. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct SimPanel {
    state: Arc<PanelState>,
}

impl SimPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digit-enable lines wired to this panel.
    pub fn digit_lines(&self) -> SimDigitLines {
        SimDigitLines {
            state: self.state.clone(),
        }
    }

    /// Segment bus wired to this panel.
    pub fn segment_bus(&self) -> SimSegmentBus {
        SimSegmentBus {
            state: self.state.clone(),
        }
    }

    /// Pattern each position showed the last time it was lit, index 0 = rightmost.
    pub fn latched(&self) -> [u8; SIM_DIGITS] {
        std::array::from_fn(|i| self.state.latched[i].load(Ordering::Acquire))
    }

    /// Number of digit lines active right now.
    pub fn active_lines(&self) -> u32 {
        self.state.enabled_mask.load(Ordering::Acquire).count_ones()
    }

    /// Times a digit was enabled while another one was still on.
    pub fn overlaps(&self) -> u32 {
        self.state.overlaps.load(Ordering::Relaxed)
    }

    /// Times the segment bus changed while a digit was lit.
    pub fn ghost_writes(&self) -> u32 {
        self.state.ghost_writes.load(Ordering::Relaxed)
    }

    /// Total enable operations.
    pub fn enables(&self) -> u64 {
        self.state.enables.load(Ordering::Relaxed)
    }

    /// Current raw segment bus value.
    pub fn bus(&self) -> u8 {
        self.state.bus.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct SimDigitLines {
    state: Arc<PanelState>,
}

impl DigitLines for SimDigitLines {
    fn enable_position(&mut self, position: usize) -> HwResult<()> {
        if position >= SIM_DIGITS {
            return Err(Box::new(HwError::InvalidPosition(position)));
        }
        let prev = self
            .state
            .enabled_mask
            .swap(1u8 << position, Ordering::AcqRel);
        if prev != 0 {
            self.state.overlaps.fetch_add(1, Ordering::Relaxed);
        }
        let pattern = self.state.bus.load(Ordering::Acquire);
        self.state.latched[position].store(pattern, Ordering::Release);
        self.state.enables.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn disable_all(&mut self) -> HwResult<()> {
        self.state.enabled_mask.store(0, Ordering::Release);
        Ok(())
    }
}

#[derive(Debug)]
pub struct SimSegmentBus {
    state: Arc<PanelState>,
}

impl SegmentBus for SimSegmentBus {
    fn write_pattern(&mut self, pattern: u8) -> HwResult<()> {
        if self.state.enabled_mask.load(Ordering::Acquire) != 0 {
            self.state.ghost_writes.fetch_add(1, Ordering::Relaxed);
        }
        self.state.bus.store(pattern, Ordering::Release);
        Ok(())
    }
}

#[derive(Debug)]
struct SensorState {
    millivolts: AtomicU32,
    stalled: AtomicBool,
    conversions: AtomicU64,
    noise_seed: AtomicU32,
}

/// Handle for steering a running `SimulatedConverter` from another thread.
#[derive(Debug, Clone)]
pub struct SensorHandle {
    state: Arc<SensorState>,
}

impl SensorHandle {
    /// Change the analog input seen by subsequent conversions.
    pub fn set_millivolts(&self, mv: u32) {
        self.state.millivolts.store(mv, Ordering::Relaxed);
    }

    /// A stalled converter never reports completion.
    pub fn set_stalled(&self, stalled: bool) {
        self.state.stalled.store(stalled, Ordering::Relaxed);
    }

    /// Conversions started so far.
    pub fn conversions(&self) -> u64 {
        self.state.conversions.load(Ordering::Relaxed)
    }
}

/// Simulated polled converter.
///
/// A conversion completes after `latency_polls` calls to `is_conversion_done`.
/// `noise_counts` adds deterministic ±noise (xorshift) to each result.
#[derive(Debug)]
pub struct SimulatedConverter {
    state: Arc<SensorState>,
    reference_mv: u32,
    full_scale: u16,
    latency_polls: u32,
    noise_counts: u16,
    pending: Option<u32>,
    result: u16,
}

impl SimulatedConverter {
    pub fn new(millivolts: u32, reference_mv: u32, full_scale: u16) -> Self {
        Self {
            state: Arc::new(SensorState {
                millivolts: AtomicU32::new(millivolts),
                stalled: AtomicBool::new(false),
                conversions: AtomicU64::new(0),
                noise_seed: AtomicU32::new(0x9E37_79B9),
            }),
            reference_mv: reference_mv.max(1),
            full_scale,
            latency_polls: 1,
            noise_counts: 0,
            pending: None,
            result: 0,
        }
    }

    /// Number of completion polls before a conversion is done.
    pub fn with_latency_polls(mut self, polls: u32) -> Self {
        self.latency_polls = polls;
        self
    }

    /// Peak deterministic noise added to each result, in counts.
    pub fn with_noise(mut self, counts: u16) -> Self {
        self.noise_counts = counts;
        self
    }

    pub fn handle(&self) -> SensorHandle {
        SensorHandle {
            state: self.state.clone(),
        }
    }

    fn next_noise(&self) -> i32 {
        if self.noise_counts == 0 {
            return 0;
        }
        let mut x = self.state.noise_seed.load(Ordering::Relaxed);
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state.noise_seed.store(x, Ordering::Relaxed);
        let span = u32::from(self.noise_counts) * 2 + 1;
        (x % span) as i32 - i32::from(self.noise_counts)
    }

    fn convert(&self) -> u16 {
        let mv = u64::from(self.state.millivolts.load(Ordering::Relaxed));
        let fs = u64::from(self.full_scale);
        let ideal = (mv * fs + u64::from(self.reference_mv) / 2) / u64::from(self.reference_mv);
        let noisy = i64::try_from(ideal).unwrap_or(i64::MAX) + i64::from(self.next_noise());
        noisy.clamp(0, i64::from(self.full_scale)) as u16
    }
}

impl Converter for SimulatedConverter {
    fn start_conversion(&mut self, channel: u8) -> HwResult<()> {
        if channel > 15 {
            return Err(Box::new(HwError::InvalidChannel(channel)));
        }
        self.pending = Some(self.latency_polls);
        self.state.conversions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_conversion_done(&mut self) -> HwResult<bool> {
        if self.state.stalled.load(Ordering::Relaxed) {
            return Ok(false);
        }
        match self.pending {
            Some(0) => {
                self.result = self.convert();
                self.pending = None;
                trace!(raw = self.result, "simulated conversion complete");
                Ok(true)
            }
            Some(left) => {
                self.pending = Some(left - 1);
                Ok(false)
            }
            None => Ok(true),
        }
    }

    fn read_result(&mut self) -> HwResult<u16> {
        Ok(self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wait(conv: &mut SimulatedConverter) -> u16 {
        for _ in 0..100 {
            if conv.is_conversion_done().unwrap() {
                return conv.read_result().unwrap();
            }
        }
        panic!("conversion never completed");
    }

    #[test]
    fn converter_maps_millivolts_to_counts() {
        let mut conv = SimulatedConverter::new(2500, 5000, 1023);
        conv.start_conversion(6).unwrap();
        assert_eq!(wait(&mut conv), 512);

        conv.handle().set_millivolts(5000);
        conv.start_conversion(6).unwrap();
        assert_eq!(wait(&mut conv), 1023);
    }

    #[test]
    fn converter_honours_latency() {
        let mut conv = SimulatedConverter::new(1000, 5000, 1023).with_latency_polls(3);
        conv.start_conversion(0).unwrap();
        assert!(!conv.is_conversion_done().unwrap());
        assert!(!conv.is_conversion_done().unwrap());
        assert!(!conv.is_conversion_done().unwrap());
        assert!(conv.is_conversion_done().unwrap());
    }

    #[test]
    fn stalled_converter_never_completes() {
        let mut conv = SimulatedConverter::new(1000, 5000, 1023);
        conv.handle().set_stalled(true);
        conv.start_conversion(0).unwrap();
        for _ in 0..50 {
            assert!(!conv.is_conversion_done().unwrap());
        }
    }

    #[test]
    fn noise_stays_within_bounds() {
        let mut conv = SimulatedConverter::new(2500, 5000, 1023).with_noise(3);
        for _ in 0..200 {
            conv.start_conversion(6).unwrap();
            let raw = wait(&mut conv);
            assert!((509..=515).contains(&raw), "raw {raw} outside noise band");
        }
    }

    #[test]
    fn rejects_unknown_channel() {
        let mut conv = SimulatedConverter::new(0, 5000, 1023);
        assert!(conv.start_conversion(16).is_err());
    }

    #[test]
    fn panel_latches_bus_on_enable() {
        let panel = SimPanel::new();
        let mut lines = panel.digit_lines();
        let mut bus = panel.segment_bus();

        bus.write_pattern(0x3F).unwrap();
        lines.enable_position(2).unwrap();
        assert_eq!(panel.latched()[2], 0x3F);
        assert_eq!(panel.active_lines(), 1);

        lines.disable_all().unwrap();
        assert_eq!(panel.active_lines(), 0);
        assert_eq!(panel.overlaps(), 0);
        assert_eq!(panel.ghost_writes(), 0);
    }

    #[test]
    fn panel_counts_hazards() {
        let panel = SimPanel::new();
        let mut lines = panel.digit_lines();
        let mut bus = panel.segment_bus();

        lines.enable_position(0).unwrap();
        bus.write_pattern(0x06).unwrap();
        lines.enable_position(1).unwrap();
        assert_eq!(panel.ghost_writes(), 1);
        assert_eq!(panel.overlaps(), 1);
        assert!(lines.enable_position(SIM_DIGITS).is_err());
    }
}
