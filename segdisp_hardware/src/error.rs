use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("spi error: {0}")]
    Spi(String),
    #[error("digit position {0} is not wired")]
    InvalidPosition(usize),
    #[error("converter channel {0} is out of range")]
    InvalidChannel(u8),
}

pub type Result<T> = std::result::Result<T, HwError>;
