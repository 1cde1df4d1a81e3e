//! The multiplexing state machine (fast path).
//!
//! Each call to [`RefreshScheduler::tick`] performs exactly one phase change
//! and returns how long the caller should hold before the next tick. The
//! sequence for consecutive positions is
//!
//! ```text
//! Show(p) -> Blank(p+1) -> Show(p+1) -> Blank(p+2) -> ...
//! ```
//!
//! Every digit is switched off and the segment bus cleared before the next
//! digit's pattern goes out, so a pattern is never visible on the wrong digit.
//! The tick reads the shared buffer once, on the Blank -> Show edge, and never
//! samples, divides or allocates.
use std::time::Duration;

use segdisp_traits::{DigitLines, SegmentBus};

use crate::DIGITS;
use crate::config::RefreshCfg;
use crate::digits::SharedDigitBuffer;
use crate::error::DisplayError;
use crate::hw_error::map_hw_error;
use crate::segment::BLANK;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Blank,
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshState {
    pub position: usize,
    pub phase: Phase,
}

/// Result of one tick: the state just entered and how long to hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub position: usize,
    pub phase: Phase,
    pub hold: Duration,
    /// The last position was just lit; one full panel cycle is done.
    pub cycle_completed: bool,
}

pub struct RefreshScheduler<L, B> {
    lines: L,
    bus: B,
    buffer: SharedDigitBuffer,
    timing: RefreshCfg,
    state: RefreshState,
}

impl<L: DigitLines, B: SegmentBus> RefreshScheduler<L, B> {
    /// Take ownership of the lines and blank the panel. The first tick lights
    /// nothing and starts the blank phase of position 0.
    pub fn new(
        mut lines: L,
        mut bus: B,
        buffer: SharedDigitBuffer,
        timing: RefreshCfg,
    ) -> Result<Self, DisplayError> {
        lines.disable_all().map_err(|e| map_hw_error(&*e))?;
        bus.write_pattern(BLANK).map_err(|e| map_hw_error(&*e))?;
        Ok(Self {
            lines,
            bus,
            buffer,
            timing,
            state: RefreshState {
                position: DIGITS - 1,
                phase: Phase::Show,
            },
        })
    }

    pub fn tick(&mut self) -> Result<Transition, DisplayError> {
        match self.state.phase {
            Phase::Show => {
                self.lines.disable_all().map_err(|e| map_hw_error(&*e))?;
                self.bus
                    .write_pattern(BLANK)
                    .map_err(|e| map_hw_error(&*e))?;
                let next = if self.state.position + 1 == DIGITS {
                    0
                } else {
                    self.state.position + 1
                };
                self.state = RefreshState {
                    position: next,
                    phase: Phase::Blank,
                };
                Ok(Transition {
                    position: next,
                    phase: Phase::Blank,
                    hold: self.timing.blank_time,
                    cycle_completed: false,
                })
            }
            Phase::Blank => {
                let position = self.state.position;
                let pattern = self.buffer.snapshot().pattern(position);
                self.bus
                    .write_pattern(pattern)
                    .map_err(|e| map_hw_error(&*e))?;
                self.lines
                    .enable_position(position)
                    .map_err(|e| map_hw_error(&*e))?;
                self.state.phase = Phase::Show;
                Ok(Transition {
                    position,
                    phase: Phase::Show,
                    hold: self.timing.on_time,
                    cycle_completed: position == DIGITS - 1,
                })
            }
        }
    }

    /// Switch everything off. The next tick resumes at the blank phase of position 0.
    pub fn blank(&mut self) -> Result<(), DisplayError> {
        self.state = RefreshState {
            position: DIGITS - 1,
            phase: Phase::Show,
        };
        self.lines.disable_all().map_err(|e| map_hw_error(&*e))?;
        self.bus
            .write_pattern(BLANK)
            .map_err(|e| map_hw_error(&*e))
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn timing(&self) -> &RefreshCfg {
        &self.timing
    }
}

/// Counts completed cycles and fires once every `every` of them.
#[derive(Debug, Clone)]
pub struct CadenceGate {
    every: u32,
    count: u32,
}

impl CadenceGate {
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            count: 0,
        }
    }

    /// Record one completed cycle; true when the acquisition path is due.
    #[inline]
    pub fn on_cycle(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.every {
            self.count = 0;
            true
        } else {
            false
        }
    }
}
