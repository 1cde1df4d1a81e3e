//! Type-state builder for `DisplayEngine` and the generic `build_engine` constructor.
//!
//! The builder enforces at compile time that digit lines, a segment bus and a
//! converter are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use segdisp_traits::{Clock, Converter, DigitLines, MonotonicClock, SegmentBus};

use crate::acquisition::Acquisition;
use crate::config::{DisplayLayout, EngineCfg, RefreshCfg, SamplingCfg, ScaleCfg};
use crate::digits::SharedDigitBuffer;
use crate::error::{BuildError, DisplayError, Result};
use crate::scheduler::{CadenceGate, RefreshScheduler, Transition};
use crate::util::duration_us;
use crate::{DIGITS, MAX_CYCLE};

pub type BoxedLines = Box<dyn DigitLines + Send>;
pub type BoxedBus = Box<dyn SegmentBus + Send>;
pub type BoxedConverter = Box<dyn Converter + Send>;
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Dynamically dispatched engine produced by [`DisplayBuilder`].
pub type DynEngine = DisplayEngine<BoxedLines, BoxedBus, BoxedConverter, SharedClock>;

/// Scheduler, acquisition pipeline and cadence gate sharing one digit buffer.
///
/// Drive it directly with [`DisplayEngine::tick`] and
/// [`DisplayEngine::poll_acquisition`], or hand it to
/// [`crate::runner::RunningDisplay::spawn`] to run both paths on threads.
pub struct DisplayEngine<L, B, A, C> {
    pub(crate) scheduler: RefreshScheduler<L, B>,
    pub(crate) acquisition: Acquisition<A, C>,
    pub(crate) cadence: CadenceGate,
    pub(crate) clock: C,
    pub(crate) buffer: SharedDigitBuffer,
    pub(crate) cfg: EngineCfg,
}

impl<L, B, A, C> core::fmt::Debug for DisplayEngine<L, B, A, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DisplayEngine")
            .field("shown", &self.buffer.snapshot())
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl<L, B, A, C> DisplayEngine<L, B, A, C>
where
    L: DigitLines,
    B: SegmentBus,
    A: Converter,
    C: Clock,
{
    /// Seed the filter and publish the first reading.
    pub fn prime(&mut self) -> core::result::Result<u16, DisplayError> {
        self.acquisition.prime()
    }

    /// One refresh tick. The flag is true when a completed cycle made the
    /// acquisition path due.
    pub fn tick(&mut self) -> core::result::Result<(Transition, bool), DisplayError> {
        let t = self.scheduler.tick()?;
        let due = t.cycle_completed && self.cadence.on_cycle();
        Ok((t, due))
    }

    /// Run one acquisition cycle on the calling thread.
    pub fn poll_acquisition(&mut self) -> crate::status::AcquisitionStatus {
        self.acquisition.poll()
    }

    /// Switch the panel off.
    pub fn blank(&mut self) -> core::result::Result<(), DisplayError> {
        self.scheduler.blank()
    }

    pub fn buffer(&self) -> &SharedDigitBuffer {
        &self.buffer
    }

    pub fn cfg(&self) -> &EngineCfg {
        &self.cfg
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl DynEngine {
    /// Start building a boxed engine.
    pub fn builder() -> DisplayBuilder<Missing, Missing, Missing> {
        DisplayBuilder::default()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for the boxed [`DynEngine`]. All settings are validated on `build()`.
pub struct DisplayBuilder<L, B, A> {
    lines: Option<BoxedLines>,
    bus: Option<BoxedBus>,
    converter: Option<BoxedConverter>,
    cfg: EngineCfg,
    clock: Option<SharedClock>,
    _l: PhantomData<L>,
    _b: PhantomData<B>,
    _a: PhantomData<A>,
}

impl Default for DisplayBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            lines: None,
            bus: None,
            converter: None,
            cfg: EngineCfg::default(),
            clock: None,
            _l: PhantomData,
            _b: PhantomData,
            _a: PhantomData,
        }
    }
}

/// Check an engine configuration against the timing and scaling contracts.
pub fn validate(cfg: &EngineCfg) -> core::result::Result<(), BuildError> {
    let RefreshCfg {
        on_time,
        blank_time,
    } = cfg.refresh;
    if on_time.is_zero() {
        return Err(BuildError::InvalidConfig("on_time must be > 0"));
    }
    if blank_time.is_zero() {
        return Err(BuildError::InvalidConfig("blank_time must be > 0"));
    }
    if cfg.refresh.cycle() > MAX_CYCLE {
        return Err(BuildError::InvalidConfig(
            "refresh cycle too long; the display would flicker",
        ));
    }
    if cfg.sampling.cadence_cycles == 0 {
        return Err(BuildError::InvalidConfig("cadence_cycles must be >= 1"));
    }
    if cfg.sampling.poll_interval.is_zero() {
        return Err(BuildError::InvalidConfig("poll_interval must be > 0"));
    }
    if cfg.sampling.conversion_timeout < cfg.sampling.poll_interval {
        return Err(BuildError::InvalidConfig(
            "conversion_timeout must be >= poll_interval",
        ));
    }
    if cfg.scale.reference_mv == 0 {
        return Err(BuildError::InvalidConfig("reference_mv must be > 0"));
    }
    if !(1..=1023).contains(&cfg.scale.full_scale) {
        return Err(BuildError::InvalidConfig("full_scale must be in 1..=1023"));
    }
    if cfg.layout.decimal_point.is_some_and(|dp| dp >= DIGITS) {
        return Err(BuildError::InvalidConfig("decimal_point out of range"));
    }
    Ok(())
}

/// Validate `cfg`, blank the panel and assemble an engine.
///
/// The single source of truth for construction, used by both
/// `DisplayBuilder::try_build()` and `build_engine()`.
fn validate_and_build<L, B, A, C>(
    lines: L,
    bus: B,
    converter: A,
    clock: C,
    cfg: EngineCfg,
) -> Result<DisplayEngine<L, B, A, C>>
where
    L: DigitLines,
    B: SegmentBus,
    A: Converter,
    C: Clock + Clone,
{
    validate(&cfg).map_err(eyre::Report::new)?;

    let buffer = SharedDigitBuffer::default();
    let scheduler = RefreshScheduler::new(lines, bus, buffer.clone(), cfg.refresh)
        .map_err(eyre::Report::new)?;
    let acquisition = Acquisition::new(
        converter,
        clock.clone(),
        &cfg.sampling,
        cfg.scale,
        cfg.layout,
        buffer.clone(),
    );

    tracing::debug!(
        cycle_us = duration_us(cfg.refresh.cycle()),
        cadence_cycles = cfg.sampling.cadence_cycles,
        "display engine assembled"
    );

    Ok(DisplayEngine {
        scheduler,
        acquisition,
        cadence: CadenceGate::new(cfg.sampling.cadence_cycles),
        clock,
        buffer,
        cfg,
    })
}

impl<L, B, A> DisplayBuilder<L, B, A> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<DynEngine> {
        let lines = self
            .lines
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDigitLines))?;
        let bus = self
            .bus
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSegmentBus))?;
        let converter = self
            .converter
            .ok_or_else(|| eyre::Report::new(BuildError::MissingConverter))?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        validate_and_build(lines, bus, converter, clock, self.cfg)
    }
}

/// Chainable setters that do not affect type-state.
impl<L, B, A> DisplayBuilder<L, B, A> {
    pub fn with_cfg(mut self, cfg: EngineCfg) -> Self {
        self.cfg = cfg;
        self
    }
    pub fn with_refresh(mut self, refresh: RefreshCfg) -> Self {
        self.cfg.refresh = refresh;
        self
    }
    pub fn with_sampling(mut self, sampling: SamplingCfg) -> Self {
        self.cfg.sampling = sampling;
        self
    }
    pub fn with_scale(mut self, scale: ScaleCfg) -> Self {
        self.cfg.scale = scale;
        self
    }
    pub fn with_layout(mut self, layout: DisplayLayout) -> Self {
        self.cfg.layout = layout;
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<B, A> DisplayBuilder<Missing, B, A> {
    pub fn with_digit_lines(
        self,
        lines: impl DigitLines + Send + 'static,
    ) -> DisplayBuilder<Set, B, A> {
        DisplayBuilder {
            lines: Some(Box::new(lines)),
            bus: self.bus,
            converter: self.converter,
            cfg: self.cfg,
            clock: self.clock,
            _l: PhantomData,
            _b: PhantomData,
            _a: PhantomData,
        }
    }
}

impl<L, A> DisplayBuilder<L, Missing, A> {
    pub fn with_segment_bus(
        self,
        bus: impl SegmentBus + Send + 'static,
    ) -> DisplayBuilder<L, Set, A> {
        DisplayBuilder {
            lines: self.lines,
            bus: Some(Box::new(bus)),
            converter: self.converter,
            cfg: self.cfg,
            clock: self.clock,
            _l: PhantomData,
            _b: PhantomData,
            _a: PhantomData,
        }
    }
}

impl<L, B> DisplayBuilder<L, B, Missing> {
    pub fn with_converter(
        self,
        converter: impl Converter + Send + 'static,
    ) -> DisplayBuilder<L, B, Set> {
        DisplayBuilder {
            lines: self.lines,
            bus: self.bus,
            converter: Some(Box::new(converter)),
            cfg: self.cfg,
            clock: self.clock,
            _l: PhantomData,
            _b: PhantomData,
            _a: PhantomData,
        }
    }
}

impl DisplayBuilder<Set, Set, Set> {
    /// Validate and build. Only available when lines, bus and converter are set.
    pub fn build(self) -> Result<DynEngine> {
        self.try_build()
    }
}

/// Build a statically dispatched engine from concrete collaborators.
///
/// Delegates to the shared `validate_and_build`.
pub fn build_engine<L, B, A, C>(
    lines: L,
    bus: B,
    converter: A,
    clock: C,
    cfg: EngineCfg,
) -> Result<DisplayEngine<L, B, A, C>>
where
    L: DigitLines,
    B: SegmentBus,
    A: Converter,
    C: Clock + Clone,
{
    validate_and_build(lines, bus, converter, clock, cfg)
}
