//! Display and converter backends.
//!
//! The simulated panel and converter are always available and are what the
//! CLI uses off-target. The Raspberry Pi backends (GPIO digit/segment lines and
//! an MCP3008 10-bit SPI converter) are behind the `hardware` feature.
pub mod error;
pub mod sim;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod mcp3008;

pub use sim::{SensorHandle, SimDigitLines, SimPanel, SimSegmentBus, SimulatedConverter};
