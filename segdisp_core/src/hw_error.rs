//! Maps `Box<dyn Error>` from trait boundaries to typed `DisplayError`.
//!
//! The traits in `segdisp_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `segdisp_hardware::HwError` downcasting.

use crate::error::DisplayError;

/// Map a trait-boundary error to a typed `DisplayError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> DisplayError {
    #[cfg(feature = "hardware-errors")]
    {
        use segdisp_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::InvalidPosition(_) | HwError::InvalidChannel(_) => {
                    DisplayError::Config(hw.to_string())
                }
                other => DisplayError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        DisplayError::Timeout
    } else {
        DisplayError::Hardware(s)
    }
}
