//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "linetrace", version, about = "Line follower CLI")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides logging.level
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Command-line overrides applied on top of the config file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Read and log sensors without driving the motors
    #[arg(long, action = ArgAction::SetTrue)]
    pub monitor: bool,
    /// Base forward speed, 0..=1 (overrides steering.base_speed)
    #[arg(long, value_name = "SPEED")]
    pub speed: Option<f32>,
    /// Steering gain (overrides steering.gain)
    #[arg(long, value_name = "GAIN")]
    pub gain: Option<f32>,
    /// Control loop rate in Hz (overrides control.rate_hz)
    #[arg(long, value_name = "HZ")]
    pub hz: Option<f32>,
    /// Stop after this many control cycles; runs until Ctrl-C otherwise
    #[arg(long, value_name = "N")]
    pub cycles: Option<u64>,
    /// Print control loop timing stats
    #[arg(long, action = ArgAction::SetTrue)]
    pub stats: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow the line until Ctrl-C or the cycle limit
    Run(RunArgs),
    /// Quick health check: one sensor read and a zero motor command
    SelfCheck,
}
