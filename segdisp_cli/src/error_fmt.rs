//! Human-readable error descriptions, stable exit codes and JSON error output.

use segdisp_core::error::{BuildError, DisplayError};
use segdisp_hardware::error::HwError;

/// Exit code for anything without a more specific mapping.
pub const EXIT_GENERIC: i32 = 1;
/// The converter never finished a conversion.
pub const EXIT_CONVERSION_TIMEOUT: i32 = 3;
/// The config file is missing, unparsable or out of range.
pub const EXIT_CONFIG: i32 = 4;
/// A GPIO, SPI or digit-line failure.
pub const EXIT_HARDWARE: i32 = 5;

/// Config problems raised before any typed error exists (load, parse, validate).
#[derive(Debug, thiserror::Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ce) = err.downcast_ref::<ConfigError>() {
        return format!(
            "What happened: The configuration could not be used ({}).\nLikely causes: Missing file, a TOML syntax error or an out-of-range value.\nHow to fix: Edit the config (see etc/segdisp.toml for a sample), then rerun.",
            ce.0
        );
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDigitLines | BuildError::MissingSegmentBus => format!(
                "What happened: The display engine has no panel to drive ({be}).\nLikely causes: The GPIO backend failed to initialize or was not wired into the builder.\nHow to fix: Check [pins] in the config and that the process may access GPIO."
            ),
            BuildError::MissingConverter => "What happened: The display engine has no converter.\nLikely causes: The SPI converter failed to initialize.\nHow to fix: Check [adc] in the config and that SPI is enabled on the board.".to_string(),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range timing, sampling or display values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(de) = err.downcast_ref::<DisplayError>() {
        return match de {
            DisplayError::ConversionTimeout { channel, waited_ms } => format!(
                "What happened: The converter did not finish a conversion on channel {channel} within {waited_ms} ms.\nLikely causes: Converter unpowered, wrong SPI wiring or chip select, or a timeout configured too low.\nHow to fix: Verify the converter wiring and [adc], and consider raising sampling.conversion_timeout_ms."
            ),
            DisplayError::Timeout => "What happened: Timed out waiting for the converter.\nLikely causes: Converter unpowered or miswired.\nHow to fix: Verify the converter wiring and [adc] settings.".to_string(),
            DisplayError::Hardware(msg) | DisplayError::HardwareFault(msg) => format!(
                "What happened: A display or converter line failed ({msg}).\nLikely causes: Wrong pin numbers, missing GPIO/SPI permissions or a wiring fault.\nHow to fix: Check [pins] and [adc], and that the process may access /dev/gpiomem and /dev/spidev*."
            ),
            DisplayError::Config(msg) => format!(
                "What happened: The hardware rejected a setting ({msg}).\nLikely causes: A channel or digit position outside what the board supports.\nHow to fix: Edit the config file, then rerun."
            ),
            DisplayError::State(_) => format!(
                "What happened: {de}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(he) = err.downcast_ref::<HwError>() {
        return format!(
            "What happened: Failed to initialize hardware ({he}).\nLikely causes: Incorrect pin numbers, SPI disabled, or insufficient permissions.\nHow to fix: Fix [pins]/[adc] in the config and ensure the process may access GPIO and SPI."
        );
    }

    // Generic fallback
    let msg = err.to_string();
    let cause = err
        .source()
        .map(|src| format!(" Cause: {src}"))
        .unwrap_or_default();
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable process exit code for an error.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<BuildError>().is_some() {
        return EXIT_CONFIG;
    }
    if let Some(de) = err.downcast_ref::<DisplayError>() {
        return match de {
            DisplayError::ConversionTimeout { .. } | DisplayError::Timeout => {
                EXIT_CONVERSION_TIMEOUT
            }
            DisplayError::Config(_) => EXIT_CONFIG,
            DisplayError::Hardware(_) | DisplayError::HardwareFault(_) => EXIT_HARDWARE,
            DisplayError::State(_) => EXIT_GENERIC,
        };
    }
    if err.downcast_ref::<HwError>().is_some() {
        return EXIT_HARDWARE;
    }
    EXIT_GENERIC
}

/// Stable machine-readable name for the error's category.
fn reason_name(err: &eyre::Report) -> &'static str {
    match exit_code_for_error(err) {
        EXIT_CONVERSION_TIMEOUT => "ConversionTimeout",
        EXIT_CONFIG => "Config",
        EXIT_HARDWARE => "Hardware",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let msg = humanize(err);
    let reason = reason_name(err);
    let obj = match err.downcast_ref::<DisplayError>() {
        Some(DisplayError::ConversionTimeout { channel, waited_ms }) => json!({
            "reason": reason,
            "details": { "channel": channel, "waited_ms": waited_ms },
            "message": msg,
        }),
        _ => json!({ "reason": reason, "message": msg }),
    };
    obj.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_exit_three_with_details() {
        let err = eyre::Report::new(DisplayError::ConversionTimeout {
            channel: 6,
            waited_ms: 5,
        });
        assert_eq!(exit_code_for_error(&err), EXIT_CONVERSION_TIMEOUT);
        assert!(humanize(&err).starts_with("What happened: The converter did not finish"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).expect("json");
        assert_eq!(v["reason"], "ConversionTimeout");
        assert_eq!(v["details"]["channel"], 6);
    }

    #[test]
    fn config_and_build_errors_share_exit_four() {
        let cfg = eyre::Report::new(ConfigError("bad".into()));
        let build = eyre::Report::new(BuildError::InvalidConfig("on_time must be > 0"));
        assert_eq!(exit_code_for_error(&cfg), EXIT_CONFIG);
        assert_eq!(exit_code_for_error(&build), EXIT_CONFIG);
        assert!(humanize(&build).contains("on_time must be > 0"));
    }

    #[test]
    fn hardware_errors_exit_five() {
        let line = eyre::Report::new(DisplayError::Hardware("digit driver fault".into()));
        let init = eyre::Report::new(HwError::Gpio("no /dev/gpiomem".into()));
        assert_eq!(exit_code_for_error(&line), EXIT_HARDWARE);
        assert_eq!(exit_code_for_error(&init), EXIT_HARDWARE);
    }

    #[test]
    fn wrapped_errors_keep_their_code() {
        use eyre::WrapErr;
        let res: eyre::Result<()> = Err(eyre::Report::new(DisplayError::Timeout));
        let err = res.wrap_err("self-check").expect_err("error");
        assert_eq!(exit_code_for_error(&err), EXIT_CONVERSION_TIMEOUT);
    }

    #[test]
    fn unknown_errors_are_generic() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), EXIT_GENERIC);
        assert!(humanize(&err).contains("Original: boom"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).expect("json");
        assert_eq!(v["reason"], "Error");
    }
}
