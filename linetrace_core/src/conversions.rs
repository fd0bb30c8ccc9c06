//! Conversions from the TOML schema (`linetrace_config`) to runtime configs.

use crate::config::{
    FilterCfg, LoopCfg, RampCfg, RunConfig, SafetyCfg, SensorCfg, SteeringCfg, Strategy,
};
use linetrace_config as cfg;

impl From<&cfg::SensorsCfg> for SensorCfg {
    fn from(s: &cfg::SensorsCfg) -> Self {
        Self {
            channels: s.channels.len(),
            white_is_high: s.white_is_high,
            dark_threshold: s.dark_threshold,
        }
    }
}

impl From<&cfg::FilterCfg> for FilterCfg {
    fn from(f: &cfg::FilterCfg) -> Self {
        Self { window: f.window }
    }
}

impl From<&cfg::SteeringCfg> for SteeringCfg {
    fn from(s: &cfg::SteeringCfg) -> Self {
        let strategy = match s.strategy {
            cfg::StrategyKind::Centroid => Strategy::Centroid,
            cfg::StrategyKind::Paired => Strategy::Paired {
                left: s.left_group.clone().unwrap_or_default(),
                right: s.right_group.clone().unwrap_or_default(),
            },
            cfg::StrategyKind::Threshold => Strategy::Threshold,
        };
        Self {
            strategy,
            base_speed: s.base_speed,
            gain: s.gain,
            deadband: s.deadband,
            max_output: s.max_output,
            turn_threshold: s.turn_threshold,
        }
    }
}

impl From<&cfg::SafetyCfg> for SafetyCfg {
    fn from(s: &cfg::SafetyCfg) -> Self {
        Self {
            loss_limit: s.loss_limit,
        }
    }
}

impl From<&cfg::ControlCfg> for LoopCfg {
    fn from(c: &cfg::ControlCfg) -> Self {
        Self {
            rate_hz: c.rate_hz,
            monitor_only: c.monitor_only,
        }
    }
}

impl From<&cfg::RampCfg> for RampCfg {
    fn from(r: &cfg::RampCfg) -> Self {
        Self {
            duration_ms: r.duration_ms,
            steps: r.steps,
        }
    }
}

impl From<&cfg::Config> for RunConfig {
    fn from(c: &cfg::Config) -> Self {
        Self {
            sensors: (&c.sensors).into(),
            filter: (&c.filter).into(),
            steering: (&c.steering).into(),
            safety: (&c.safety).into(),
            control: (&c.control).into(),
            ramp: (&c.ramp).into(),
        }
    }
}
