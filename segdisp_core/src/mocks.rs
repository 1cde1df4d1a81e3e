//! Test and helper mocks for segdisp_core.
//!
//! `EventLog` records every line operation in order so tests can check the
//! multiplexing discipline. `ScriptedConverter` replays a fixed list of
//! results and can be told to stall or fail.
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use segdisp_traits::{Converter, DigitLines, HwResult, SegmentBus};

/// One observed line operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    Enable(usize),
    DisableAll,
    Pattern(u8),
}

/// Shared, ordered record of digit-line and segment-bus operations.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<LineEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> RecordingLines {
        RecordingLines {
            log: self.clone(),
            fail_after: None,
            enables: 0,
        }
    }

    pub fn bus(&self) -> RecordingBus {
        RecordingBus { log: self.clone() }
    }

    pub fn events(&self) -> Vec<LineEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, event: LineEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Digit lines that append to an [`EventLog`].
#[derive(Debug)]
pub struct RecordingLines {
    log: EventLog,
    fail_after: Option<usize>,
    enables: usize,
}

impl RecordingLines {
    /// Fail every `enable_position` after the first `n` succeed.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl DigitLines for RecordingLines {
    fn enable_position(&mut self, position: usize) -> HwResult<()> {
        if self.fail_after.is_some_and(|n| self.enables >= n) {
            return Err(Box::new(std::io::Error::other("digit driver fault")));
        }
        self.enables += 1;
        self.log.push(LineEvent::Enable(position));
        Ok(())
    }

    fn disable_all(&mut self) -> HwResult<()> {
        self.log.push(LineEvent::DisableAll);
        Ok(())
    }
}

/// Segment bus that appends to an [`EventLog`].
#[derive(Debug)]
pub struct RecordingBus {
    log: EventLog,
}

impl SegmentBus for RecordingBus {
    fn write_pattern(&mut self, pattern: u8) -> HwResult<()> {
        self.log.push(LineEvent::Pattern(pattern));
        Ok(())
    }
}

/// Converter replaying `values` in a loop, one per conversion.
#[derive(Debug)]
pub struct ScriptedConverter {
    values: Vec<u16>,
    latency_polls: u32,
    pending: Option<u32>,
    current: usize,
    stall_all: bool,
    stall_on: HashSet<usize>,
    failure: Option<String>,
    started: Arc<AtomicUsize>,
}

impl ScriptedConverter {
    pub fn new(values: impl IntoIterator<Item = u16>) -> Self {
        Self {
            values: values.into_iter().collect(),
            latency_polls: 0,
            pending: None,
            current: 0,
            stall_all: false,
            stall_on: HashSet::new(),
            failure: None,
            started: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Report "not done" this many times before each conversion completes.
    pub fn with_latency_polls(mut self, polls: u32) -> Self {
        self.latency_polls = polls;
        self
    }

    /// No conversion ever completes.
    pub fn stalled(mut self) -> Self {
        self.stall_all = true;
        self
    }

    /// The conversions with these ordinals (0-based) never complete.
    pub fn stall_on(mut self, ordinals: impl IntoIterator<Item = usize>) -> Self {
        self.stall_on.extend(ordinals);
        self
    }

    /// Every call fails with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_owned());
        self
    }

    /// Shared count of conversions started.
    pub fn started(&self) -> Arc<AtomicUsize> {
        self.started.clone()
    }

    fn check_failure(&self) -> HwResult<()> {
        match &self.failure {
            Some(msg) => Err(Box::new(std::io::Error::other(msg.clone()))),
            None => Ok(()),
        }
    }
}

impl Converter for ScriptedConverter {
    fn start_conversion(&mut self, _channel: u8) -> HwResult<()> {
        self.check_failure()?;
        self.current = self.started.fetch_add(1, Ordering::Relaxed);
        self.pending = Some(self.latency_polls);
        Ok(())
    }

    fn is_conversion_done(&mut self) -> HwResult<bool> {
        self.check_failure()?;
        if self.stall_all || self.stall_on.contains(&self.current) {
            return Ok(false);
        }
        match self.pending {
            Some(0) | None => Ok(true),
            Some(left) => {
                self.pending = Some(left - 1);
                Ok(false)
            }
        }
    }

    fn read_result(&mut self) -> HwResult<u16> {
        self.check_failure()?;
        if self.values.is_empty() {
            return Ok(0);
        }
        Ok(self.values[self.current % self.values.len()])
    }
}
