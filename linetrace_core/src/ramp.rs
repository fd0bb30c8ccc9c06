//! Soft start: `target·k/steps` for k = 1..=steps.

use std::time::Duration;

use crate::mixer::MotorCommand;

/// How the soft start ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampOutcome {
    Completed,
    /// Monitor-only runs never drive the motors.
    Skipped,
    Cancelled,
    /// A ramp command could not be written; the motors were stopped.
    Faulted,
}

impl RampOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RampOutcome::Completed => "completed",
            RampOutcome::Skipped => "skipped",
            RampOutcome::Cancelled => "cancelled",
            RampOutcome::Faulted => "faulted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SoftStart {
    target: MotorCommand,
    steps: u32,
    k: u32,
}

impl SoftStart {
    /// `steps == 0` yields the target once.
    pub fn new(target: MotorCommand, steps: u32) -> Self {
        Self {
            target,
            steps: steps.max(1),
            k: 0,
        }
    }

    /// Fixed delay between two ramp commands.
    pub fn step_delay(duration: Duration, steps: u32) -> Duration {
        duration / steps.max(1)
    }
}

impl Iterator for SoftStart {
    type Item = MotorCommand;

    fn next(&mut self) -> Option<MotorCommand> {
        if self.k >= self.steps {
            return None;
        }
        self.k += 1;
        Some(self.target.scaled(self.k as f32 / self.steps as f32))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.steps - self.k) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for SoftStart {}

/// All commands of a soft start, in issue order.
pub fn ramp_sequence(target: MotorCommand, steps: u32) -> Vec<MotorCommand> {
    SoftStart::new(target, steps).collect()
}
