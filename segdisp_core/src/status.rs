//! Results reported by the acquisition path and refresh statistics.

use crate::error::DisplayError;

/// Outcome of one acquisition cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionStatus {
    /// A fresh sample was filtered and the panel buffer replaced.
    Updated {
        raw: u16,
        scaled: u16,
        average: u16,
    },
    /// Every attempt failed; the panel keeps its last known-good reading.
    Faulted {
        error: DisplayError,
        consecutive: u32,
    },
}

impl AcquisitionStatus {
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Faulted { .. })
    }
}

/// Snapshot of the refresh thread's timing counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Scheduler ticks executed.
    pub ticks: u64,
    /// Full panel cycles completed.
    pub cycles: u64,
    /// Ticks whose work finished after the next deadline.
    pub overruns: u64,
    /// Worst observed wake-up lateness (µs).
    pub max_lateness_us: u64,
}
