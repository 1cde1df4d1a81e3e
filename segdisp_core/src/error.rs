use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisplayError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for converter")]
    Timeout,
    #[error("conversion on channel {channel} did not complete within {waited_ms} ms")]
    ConversionTimeout { channel: u8, waited_ms: u64 },
    #[error("invalid state: {0}")]
    State(String),
}

impl DisplayError {
    /// True for the converter-stall family of errors.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout | Self::ConversionTimeout { .. })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing digit lines")]
    MissingDigitLines,
    #[error("missing segment bus")]
    MissingSegmentBus,
    #[error("missing converter")]
    MissingConverter,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
