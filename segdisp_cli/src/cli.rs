//! CLI argument definitions.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "segdisp", version, about = "Multiplexed seven-segment display driver")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/segdisp.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

impl RtLock {
    #[inline]
    pub fn os_default() -> Self {
        if cfg!(target_os = "linux") {
            RtLock::Current
        } else {
            RtLock::None
        }
    }
}

/// Real-time knobs for `run --rt`.
#[derive(Copy, Clone, Debug)]
pub struct RtOpts {
    pub enabled: bool,
    pub prio: Option<i32>,
    pub cpu: Option<usize>,
    pub lock: RtLock,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the panel with live readings until Ctrl-C (or --duration-ms)
    Run {
        /// Stop on its own after this many milliseconds
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Print refresh timing stats on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
        /// Enable real-time mode (SCHED_FIFO, affinity, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux.\n\nAttempts SCHED_FIFO priority, pins the process to one CPU and calls mlockall to keep the refresh thread free of page faults. Usually needs root or CAP_SYS_NICE/CAP_IPC_LOCK. Failures are logged as warnings and the display keeps running."
        )]
        rt: bool,
        /// SCHED_FIFO priority for --rt (1..=max)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// CPU index to pin to for --rt (defaults to 0)
        #[arg(long, value_name = "CPU")]
        rt_cpu: Option<usize>,
        /// Memory locking mode for --rt: none, current or all
        #[arg(long, value_enum, value_name = "MODE")]
        rt_lock: Option<RtLock>,
    },
    /// Show how a value (in hundredths) would look on the panel
    Render {
        /// Value in hundredths, e.g. 2537 for 25.37; clamped to 9999
        value: u32,
    },
    /// Load the config, assemble the engine and take one filtered reading
    SelfCheck,
}
