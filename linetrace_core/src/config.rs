//! Configuration types for the follower.
//!
//! These are the runtime configuration structs used by `TracerCore`.
//! They are separate from the TOML-deserialized config in `linetrace_config`.

/// Sensor array layout and polarity.
#[derive(Debug, Clone)]
pub struct SensorCfg {
    /// Number of channels, ordered left-to-right.
    pub channels: usize,
    /// True when raw readings are high over the white background.
    pub white_is_high: bool,
    /// A normalized value below this is line-like.
    pub dark_threshold: f32,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            channels: 4,
            white_is_high: true,
            dark_threshold: 0.55,
        }
    }
}

/// Per-channel smoothing.
#[derive(Debug, Clone)]
pub struct FilterCfg {
    /// Moving average window size (1 = disabled).
    pub window: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { window: 4 }
    }
}

/// How the lateral offset is derived from the smoothed values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Line-likeness weighted centroid over evenly spaced channel positions.
    #[default]
    Centroid,
    /// Mean of the left group against the mean of the right group.
    /// Empty groups select the left and right halves of the array.
    Paired { left: Vec<usize>, right: Vec<usize> },
    /// Mean position of the channels below the dark threshold.
    Threshold,
}

/// Steering and mixing parameters.
#[derive(Debug, Clone)]
pub struct SteeringCfg {
    pub strategy: Strategy,
    /// Forward speed at zero offset, in `[0, 1]`.
    pub base_speed: f32,
    /// Differential gain applied to the offset.
    pub gain: f32,
    /// Offsets with `|offset| < deadband` become exactly 0.
    pub deadband: f32,
    /// Magnitude bound applied to every issued command.
    pub max_output: f32,
    /// Left/right difference below which a cycle reads as "forward".
    pub turn_threshold: f32,
}

impl Default for SteeringCfg {
    fn default() -> Self {
        Self {
            strategy: Strategy::Centroid,
            base_speed: 0.45,
            gain: 0.8,
            deadband: 0.05,
            max_output: 1.0,
            turn_threshold: 0.15,
        }
    }
}

/// Safety supervision.
#[derive(Debug, Clone)]
pub struct SafetyCfg {
    /// Consecutive line-absent cycles that latch the emergency stop.
    pub loss_limit: u32,
}

impl Default for SafetyCfg {
    fn default() -> Self {
        Self { loss_limit: 6 }
    }
}

/// Loop pacing and operating mode.
#[derive(Debug, Clone)]
pub struct LoopCfg {
    /// Control rate in Hz.
    pub rate_hz: f32,
    /// Sense, estimate and log, but command zero to the motors every cycle.
    pub monitor_only: bool,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            rate_hz: 25.0,
            monitor_only: false,
        }
    }
}

/// Soft start before the first control cycle.
#[derive(Debug, Clone)]
pub struct RampCfg {
    pub duration_ms: u64,
    /// 0 issues the target directly.
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

/// Everything a run needs besides the devices themselves.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub sensors: SensorCfg,
    pub filter: FilterCfg,
    pub steering: SteeringCfg,
    pub safety: SafetyCfg,
    pub control: LoopCfg,
    pub ramp: RampCfg,
}
