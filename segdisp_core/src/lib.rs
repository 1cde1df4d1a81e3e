#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Multiplexed seven-segment display engine (hardware-agnostic).
//!
//! All hardware goes through the `segdisp_traits` contracts: `DigitLines`,
//! `SegmentBus` and `Converter`. Timing goes through `Clock`.
//!
//! ## Architecture
//!
//! - **Fast path** (`scheduler`): one phase change per tick, Blank before
//!   every Show, reading the panel buffer once per digit.
//! - **Slow path** (`acquisition`): bounded conversion (`sampler`), moving
//!   average (`filter`), decimal split and encoding (`digits`, `segment`),
//!   one atomic publish per reading.
//! - **Host runtime** (`runner`): both paths on their own threads with a
//!   non-blocking cadence trigger between them.
//! - **Construction** (`builder`): type-state builder with validation.
//!
//! ## Fixed-Point Arithmetic
//!
//! Readings are `u16` hundredths of the sensor unit, clamped to `0..=9999`
//! so they always fit the panel.
use std::time::Duration;

pub mod acquisition;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod digits;
pub mod error;
pub mod filter;
pub mod hw_error;
pub mod mocks;
pub mod runner;
pub mod sampler;
pub mod scheduler;
pub mod segment;
pub mod status;
pub mod util;

/// Digit positions on the panel.
pub const DIGITS: usize = segdisp_config::BOARD_DIGITS;

/// Moving-average window length.
pub const FILTER_WINDOW: usize = 8;

/// Longest full refresh cycle that still reads as steady (50 Hz).
pub const MAX_CYCLE: Duration = Duration::from_micros(segdisp_config::MAX_CYCLE_US);

/// Raw converter count.
pub type RawSample = u16;
/// Hundredths of the sensor unit, `0..=9999`.
pub type ScaledMeasurement = u16;

pub use acquisition::Acquisition;
pub use builder::{DisplayBuilder, DisplayEngine, DynEngine, build_engine};
pub use config::{DisplayLayout, EngineCfg, RefreshCfg, SamplingCfg, ScaleCfg};
pub use digits::{DigitBuffer, SharedDigitBuffer, split_decimal};
pub use error::{BuildError, DisplayError, Result};
pub use filter::MovingAverageFilter;
pub use runner::RunningDisplay;
pub use sampler::{Sampler, to_scaled};
pub use scheduler::{CadenceGate, Phase, RefreshScheduler, RefreshState, Transition};
pub use segment::encode;
pub use status::{AcquisitionStatus, RefreshStats};
