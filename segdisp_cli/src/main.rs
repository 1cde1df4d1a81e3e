//! `segdisp`: drive a multiplexed seven-segment panel from a sampled sensor.

mod cli;
mod error_fmt;
mod render;
mod rt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use segdisp_core::digits::MAX_DISPLAY;
use segdisp_core::{AcquisitionStatus, DigitBuffer, DisplayLayout};
use serde_json::json;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::{Cli, Commands, RtLock, RtOpts};
use crate::error_fmt::{ConfigError, exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let json = cli.json;
    let code = match real_main(cli) {
        Ok(()) => 0,
        Err(err) => {
            if json {
                println!("{}", format_error_json(&err));
            } else {
                eprintln!("{}", humanize(&err));
            }
            tracing::debug!(error = ?err, "exiting with error");
            exit_code_for_error(&err)
        }
    };
    std::process::exit(code);
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    // Nicer panic and error reports; ignore if a hook is already installed.
    let _ = color_eyre::install();

    // `render` works without a config file; everything else needs one.
    let cfg = if matches!(cli.cmd, Commands::Render { .. }) && !cli.config.exists() {
        segdisp_config::load_toml("").map_err(|e| ConfigError(e.to_string()))?
    } else {
        run::load_config(&cli.config)?
    };

    // Held until the command returns so the file sink is flushed.
    let _file_guard = init_tracing(cli.json, &cli.log_level, &cfg.logging)?;

    match cli.cmd {
        Commands::Render { value } => {
            let value = u16::try_from(value.min(u32::from(MAX_DISPLAY))).unwrap_or(MAX_DISPLAY);
            let buffer = DigitBuffer::from_measurement(value, &DisplayLayout::from(&cfg.display));
            if cli.json {
                let patterns: Vec<u8> = buffer.patterns().iter().rev().copied().collect();
                println!(
                    "{}",
                    json!({ "value": value, "shown": buffer.to_string(), "patterns": patterns })
                );
            } else {
                for row in render::art(&buffer) {
                    println!("{row}");
                }
                println!("patterns: {}", render::hex_patterns(&buffer));
            }
            Ok(())
        }
        Commands::SelfCheck => {
            let shown = run::self_check(&cfg).wrap_err("self-check")?;
            if cli.json {
                println!("{}", json!({ "status": "ok", "shown": shown }));
            } else {
                println!("self-check ok: reading {shown}");
            }
            Ok(())
        }
        Commands::Run {
            duration_ms,
            stats,
            rt,
            rt_prio,
            rt_cpu,
            rt_lock,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = shutdown.clone();
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                    .wrap_err("install Ctrl-C handler")?;
            }
            let rt = RtOpts {
                enabled: rt,
                prio: rt_prio,
                cpu: rt_cpu,
                lock: rt_lock.unwrap_or_else(RtLock::os_default),
            };
            let outcome = run::run_display(
                &cfg,
                duration_ms.map(Duration::from_millis),
                rt,
                &shutdown,
            )?;
            if stats {
                run::print_stats(&cfg, &outcome);
            }
            if cli.json {
                let last = match &outcome.last {
                    Some(AcquisitionStatus::Updated { .. }) => "updated",
                    Some(AcquisitionStatus::Faulted { .. }) => "faulted",
                    None => "none",
                };
                println!(
                    "{}",
                    json!({
                        "shown": outcome.shown,
                        "last_status": last,
                        "elapsed_ms": u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
                        "ticks": outcome.stats.ticks,
                        "cycles": outcome.stats.cycles,
                        "overruns": outcome.stats.overruns,
                        "max_lateness_us": outcome.stats.max_lateness_us,
                    })
                );
            } else {
                println!("display stopped; last reading {}", outcome.shown);
            }
            Ok(())
        }
    }
}

/// Console logs go to stderr (pretty or JSON); `RUST_LOG` overrides `--log-level`.
/// `[logging] file` adds a JSON-lines file sink with optional rotation.
fn init_tracing(
    json: bool,
    level: &str,
    logging: &segdisp_config::Logging,
) -> eyre::Result<Option<WorkerGuard>> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };
    let mut layers = vec![console];

    let mut guard = None;
    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| ConfigError(format!("logging.file {file:?} has no file name")))?;
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, g) = tracing_appender::non_blocking(appender);
        guard = Some(g);
        let file_level = logging.level.as_deref().unwrap_or(level);
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(file_level))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(guard)
}
