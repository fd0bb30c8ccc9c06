#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the line follower.
//!
//! - `Config` and its sections are deserialized from TOML; every section is
//!   optional and falls back to the tuned defaults.
//! - `validate()` rejects values the controller cannot run with, before any
//!   hardware is touched.
use eyre::WrapErr;
use serde::Deserialize;
use std::path::Path;

/// Highest input channel on the MCP3004 ADC.
pub const MCP3004_MAX_CHANNEL: u8 = 3;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensorsCfg {
    /// ADC channels, ordered left-to-right by physical placement.
    pub channels: Vec<u8>,
    /// True when the sensor reads high over the white background.
    pub white_is_high: bool,
    /// Normalized values below this are "line-like".
    pub dark_threshold: f32,
}

impl Default for SensorsCfg {
    fn default() -> Self {
        Self {
            channels: vec![0, 1, 2, 3],
            white_is_high: true,
            dark_threshold: 0.55,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterCfg {
    /// Moving-average window per channel (1 disables smoothing).
    pub window: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { window: 4 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Value-weighted centroid across all channels.
    #[default]
    Centroid,
    /// Left-group mean versus right-group mean.
    Paired,
    /// Hard threshold vote of line-like channels.
    Threshold,
}

impl StrategyKind {
    /// Name as written in the TOML.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Centroid => "centroid",
            Self::Paired => "paired",
            Self::Threshold => "threshold",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SteeringCfg {
    pub strategy: StrategyKind,
    /// Forward speed when the line is centered, 0..=1.
    pub base_speed: f32,
    /// Differential gain applied to the lateral offset.
    pub gain: f32,
    /// Offsets with a smaller magnitude are forced to zero.
    pub deadband: f32,
    /// Magnitude bound for every issued motor command.
    pub max_output: f32,
    /// Left/right difference below which the vehicle is reported as going forward.
    pub turn_threshold: f32,
    /// Positions (indices into `sensors.channels`) averaged as the left group.
    pub left_group: Option<Vec<usize>>,
    /// Positions averaged as the right group.
    pub right_group: Option<Vec<usize>>,
}

impl Default for SteeringCfg {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Centroid,
            base_speed: 0.45,
            gain: 0.8,
            deadband: 0.05,
            max_output: 1.0,
            turn_threshold: 0.15,
            left_group: None,
            right_group: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlCfg {
    /// Control loop rate in Hz. Also accepts alias "hz".
    #[serde(alias = "hz")]
    pub rate_hz: f32,
    /// Read and log sensors but never drive the motors.
    pub monitor_only: bool,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            rate_hz: 25.0,
            monitor_only: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SafetyCfg {
    /// Consecutive cycles without the line before the emergency stop latches.
    pub loss_limit: u32,
}

impl Default for SafetyCfg {
    fn default() -> Self {
        Self { loss_limit: 6 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RampCfg {
    /// Total soft-start duration in milliseconds.
    pub duration_ms: u64,
    /// Number of intermediate commands issued during the soft start.
    pub steps: u32,
}

impl Default for RampCfg {
    fn default() -> Self {
        Self {
            duration_ms: 600,
            steps: 12,
        }
    }
}

/// BCM pin numbers and bus settings for the MCP3004 + DRV8835 backend.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Pins {
    pub left_in1: u8,
    pub left_in2: u8,
    pub right_in1: u8,
    pub right_in2: u8,
    pub spi_bus: u8,
    pub spi_chip_select: u8,
    pub spi_clock_hz: u32,
    /// Software PWM frequency for the motor driver inputs.
    pub pwm_hz: f64,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            left_in1: 6,
            left_in2: 5,
            right_in1: 26,
            right_in2: 27,
            spi_bus: 0,
            spi_chip_select: 0,
            spi_clock_hz: 1_000_000,
            pwm_hz: 100.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
    /// Emit one cycle record every N cycles (1 = every cycle).
    pub cycle_every: u32,
    /// Optional plain-text file receiving every cycle record, for offline tuning.
    pub cycle_file: Option<String>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            file: None,
            level: None,
            rotation: None,
            cycle_every: 1,
            cycle_file: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub sensors: SensorsCfg,
    pub filter: FilterCfg,
    pub steering: SteeringCfg,
    pub control: ControlCfg,
    pub safety: SafetyCfg,
    pub ramp: RampCfg,
    pub pins: Pins,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = load_toml(&text).wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn check_group(name: &str, group: Option<&Vec<usize>>, channels: usize) -> eyre::Result<()> {
    if let Some(g) = group {
        if g.is_empty() {
            eyre::bail!("steering.{name} must not be empty");
        }
        if let Some(bad) = g.iter().find(|&&i| i >= channels) {
            eyre::bail!("steering.{name} index {bad} out of range for {channels} channels");
        }
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sensors
        let channels = &self.sensors.channels;
        if channels.is_empty() {
            eyre::bail!("sensors.channels must list at least one channel");
        }
        if let Some(ch) = channels.iter().find(|&&c| c > MCP3004_MAX_CHANNEL) {
            eyre::bail!(
                "sensors.channels entry {ch} exceeds MCP3004 channel {MCP3004_MAX_CHANNEL}"
            );
        }
        for (i, c) in channels.iter().enumerate() {
            if channels[..i].contains(c) {
                eyre::bail!("sensors.channels lists channel {c} twice");
            }
        }
        let t = self.sensors.dark_threshold;
        if !(t > 0.0 && t < 1.0) {
            eyre::bail!("sensors.dark_threshold must be in (0.0, 1.0)");
        }

        // Filter
        if self.filter.window == 0 {
            eyre::bail!("filter.window must be >= 1");
        }

        // Steering
        let s = &self.steering;
        if !(0.0..=1.0).contains(&s.base_speed) {
            eyre::bail!("steering.base_speed must be in [0.0, 1.0]");
        }
        if !s.gain.is_finite() || s.gain < 0.0 {
            eyre::bail!("steering.gain must be a finite value >= 0");
        }
        if !(0.0..1.0).contains(&s.deadband) {
            eyre::bail!("steering.deadband must be in [0.0, 1.0)");
        }
        if !(s.max_output > 0.0 && s.max_output <= 1.0) {
            eyre::bail!("steering.max_output must be in (0.0, 1.0]");
        }
        if !s.turn_threshold.is_finite() || s.turn_threshold < 0.0 {
            eyre::bail!("steering.turn_threshold must be >= 0");
        }
        check_group("left_group", s.left_group.as_ref(), channels.len())?;
        check_group("right_group", s.right_group.as_ref(), channels.len())?;
        if s.strategy == StrategyKind::Paired
            && channels.len() < 2
            && (s.left_group.is_none() || s.right_group.is_none())
        {
            eyre::bail!("steering.strategy = \"paired\" needs at least two channels");
        }

        // Control
        let hz = self.control.rate_hz;
        if !hz.is_finite() || hz <= 0.0 {
            eyre::bail!("control.rate_hz must be > 0");
        }
        if hz > 1000.0 {
            eyre::bail!("control.rate_hz is unreasonably large (>1000 Hz)");
        }

        // Safety
        if self.safety.loss_limit == 0 {
            eyre::bail!("safety.loss_limit must be >= 1");
        }

        // Ramp
        if self.ramp.steps > 1000 {
            eyre::bail!("ramp.steps is unreasonably large (>1000)");
        }
        if self.ramp.duration_ms > 60_000 {
            eyre::bail!("ramp.duration_ms is unreasonably large (>60s)");
        }

        // Pins
        if !(self.pins.pwm_hz.is_finite() && self.pins.pwm_hz > 0.0) {
            eyre::bail!("pins.pwm_hz must be > 0");
        }
        if self.pins.spi_clock_hz == 0 {
            eyre::bail!("pins.spi_clock_hz must be > 0");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {r:?}");
        }
        if self.logging.cycle_every == 0 {
            eyre::bail!("logging.cycle_every must be >= 1");
        }

        Ok(())
    }
}
