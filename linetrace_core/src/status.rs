//! Per-cycle report and the fault and maneuver types it carries.

use core::fmt;

use crate::mixer::MotorCommand;
use crate::monitor::LossState;

/// I/O problem observed during one cycle. The cycle counts as line-absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    SensorRead(String),
    ChannelCount { expected: usize, got: usize },
    MotorWrite(String),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorRead(e) => write!(f, "sensor read failed: {e}"),
            Self::ChannelCount { expected, got } => {
                write!(f, "sensor returned {got} values, expected {expected}")
            }
            Self::MotorWrite(e) => write!(f, "motor write failed: {e}"),
        }
    }
}

/// Coarse label for what the issued command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maneuver {
    Stopped,
    Forward,
    TurningLeft,
    TurningRight,
}

impl Maneuver {
    pub fn classify(cmd: MotorCommand, turn_threshold: f32) -> Self {
        if cmd.is_stop() {
            Self::Stopped
        } else if (cmd.left - cmd.right).abs() < turn_threshold {
            Self::Forward
        } else if cmd.right > cmd.left {
            Self::TurningLeft
        } else {
            Self::TurningRight
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Forward => "forward",
            Self::TurningLeft => "turning-left",
            Self::TurningRight => "turning-right",
        }
    }
}

impl fmt::Display for Maneuver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic record of one control cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    /// Milliseconds since the run began.
    pub t_ms: u64,
    /// Normalized, smoothed values; empty when the read faulted.
    pub values: Vec<f32>,
    pub present: bool,
    pub center: f32,
    /// Command actually sent (or attempted) this cycle.
    pub command: MotorCommand,
    pub state: LossState,
    pub loss_count: u32,
    pub maneuver: Maneuver,
    pub fault: Option<Fault>,
}

impl CycleReport {
    pub fn lost(&self) -> bool {
        self.loss_count > 0
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:<6} t={:>7}ms vals=[", self.cycle, self.t_ms)?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v:.2}")?;
        }
        write!(
            f,
            "] center={:+.2} out=({:+.2},{:+.2}) {}",
            self.center, self.command.left, self.command.right, self.maneuver
        )?;
        match self.state {
            LossState::Tracking => {}
            LossState::Lost => write!(f, " LOST({})", self.loss_count)?,
            LossState::EmergencyStop => write!(f, " ESTOP({})", self.loss_count)?,
        }
        if let Some(fault) = &self.fault {
            write!(f, " fault: {fault}")?;
        }
        Ok(())
    }
}
