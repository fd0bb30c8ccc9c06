//! The line-following control loop (`TracerCore`).
//!
//! One `step()` is one cycle: read, normalize, smooth, detect presence,
//! estimate the offset, supervise loss, mix, clamp, write and report.
//! I/O failures never escape `step()`; they turn the cycle into a
//! line-absent cycle and are reported in the cycle's `fault` field.

use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use linetrace_traits::Clock;

use crate::config::{LoopCfg, RampCfg, SensorCfg, SteeringCfg};
use crate::error::Result;
use crate::estimator::LineEstimator;
use crate::filter::ChannelFilter;
use crate::hw_error::map_hw_error;
use crate::logger::DiagnosticSink;
use crate::mixer::{Mixer, MotorCommand};
use crate::monitor::{LossMonitor, LossState};
use crate::normalize::normalize;
use crate::presence::line_present;
use crate::ramp::{RampOutcome, SoftStart};
use crate::shutdown::Shutdown;
use crate::status::{CycleReport, Fault, Maneuver};

pub struct TracerCore<S: linetrace_traits::SensorArray, M: linetrace_traits::MotorPair> {
    pub(crate) sensors: S,
    pub(crate) motors: M,
    pub(crate) sensor_cfg: SensorCfg,
    pub(crate) steering: SteeringCfg,
    pub(crate) control: LoopCfg,
    pub(crate) ramp: RampCfg,
    pub(crate) filter: ChannelFilter,
    pub(crate) estimator: Box<dyn LineEstimator>,
    pub(crate) mixer: Mixer,
    pub(crate) monitor: LossMonitor,
    pub(crate) sink: Box<dyn DiagnosticSink>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) period: Duration,
    pub(crate) cycle: u64,
    pub(crate) last_command: MotorCommand,
    pub(crate) stopped: bool,
}

impl<S: linetrace_traits::SensorArray, M: linetrace_traits::MotorPair> core::fmt::Debug
    for TracerCore<S, M>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TracerCore")
            .field("strategy", &self.estimator.name())
            .field("cycle", &self.cycle)
            .field("state", &self.monitor.state())
            .field("last_command", &self.last_command)
            .field("monitor_only", &self.control.monitor_only)
            .finish()
    }
}

impl<S: linetrace_traits::SensorArray, M: linetrace_traits::MotorPair> TracerCore<S, M> {
    pub fn monitor_only(&self) -> bool {
        self.control.monitor_only
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn rate_hz(&self) -> f32 {
        self.control.rate_hz
    }

    pub fn strategy(&self) -> &'static str {
        self.estimator.name()
    }

    pub fn loss_state(&self) -> LossState {
        self.monitor.state()
    }

    /// Cycles completed since `begin()`.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    pub fn last_command(&self) -> MotorCommand {
        self.last_command
    }

    /// Reset per-run state. Call before a new run.
    pub fn begin(&mut self) {
        self.epoch = self.clock.now();
        self.cycle = 0;
        self.filter.reset();
        self.monitor.reset();
        self.last_command = MotorCommand::STOP;
    }

    /// Stop both motors.
    pub fn motor_stop(&mut self) -> Result<()> {
        self.motors
            .stop()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("motor_stop")?;
        self.stopped = true;
        self.last_command = MotorCommand::STOP;
        Ok(())
    }

    /// Final stop at the end of a run.
    pub fn halt(&mut self) -> Result<()> {
        let r = self.motor_stop();
        match &r {
            Ok(()) => tracing::info!(cycles = self.cycle, "motors stopped"),
            Err(e) => tracing::error!(error = %e, "failed to stop motors"),
        }
        r
    }

    fn write(&mut self, cmd: MotorCommand) -> Result<()> {
        self.motors
            .set(cmd.left, cmd.right)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("motor set")?;
        self.stopped = false;
        self.last_command = cmd;
        Ok(())
    }

    /// Ramp from standstill to straight-ahead travel at base speed.
    ///
    /// Checks `shutdown` between steps. Skipped in monitor-only mode.
    pub fn soft_start(&mut self, shutdown: &Shutdown) -> RampOutcome {
        if self.control.monitor_only {
            return RampOutcome::Skipped;
        }
        let base = self.steering.base_speed;
        let target = MotorCommand::new(base, base).limited(self.steering.max_output);
        let delay = SoftStart::step_delay(
            Duration::from_millis(self.ramp.duration_ms),
            self.ramp.steps,
        );
        for cmd in SoftStart::new(target, self.ramp.steps) {
            if shutdown.is_triggered() {
                return RampOutcome::Cancelled;
            }
            if let Err(e) = self.write(cmd) {
                tracing::warn!(error = %e, "soft start aborted");
                if let Err(e) = self.motor_stop() {
                    tracing::warn!(error = %e, "motor_stop failed after soft start fault");
                }
                return RampOutcome::Faulted;
            }
            tracing::debug!(left = cmd.left, right = cmd.right, "soft start step");
            if shutdown.wait(delay) {
                return RampOutcome::Cancelled;
            }
        }
        RampOutcome::Completed
    }

    fn sense(&mut self) -> std::result::Result<Vec<f32>, Fault> {
        let raw = self
            .sensors
            .read()
            .map_err(|e| Fault::SensorRead(map_hw_error(&*e).to_string()))?;
        if raw.len() != self.sensor_cfg.channels {
            return Err(Fault::ChannelCount {
                expected: self.sensor_cfg.channels,
                got: raw.len(),
            });
        }
        let mut values: Vec<f32> = raw
            .iter()
            .map(|&r| normalize(r, self.sensor_cfg.white_is_high))
            .collect();
        self.filter.apply(&mut values);
        Ok(values)
    }

    /// One iteration of the control loop.
    pub fn step(&mut self) -> CycleReport {
        let t_ms = self.clock.ms_since(self.epoch);

        let (values, mut fault) = match self.sense() {
            Ok(v) => (v, None),
            Err(f) => {
                tracing::warn!(
                    cycle = self.cycle,
                    fault = %f,
                    "sensor fault; cycle counts as line lost"
                );
                (Vec::new(), Some(f))
            }
        };

        let present = fault.is_none() && line_present(&values, self.sensor_cfg.dark_threshold);
        let center = if values.is_empty() {
            0.0
        } else {
            self.estimator.estimate(&values)
        };

        let mut state = self.monitor.observe(present);
        let desired = if self.control.monitor_only || state.forces_stop() {
            MotorCommand::STOP
        } else {
            self.mixer.mix(center)
        };
        let mut command = desired.limited(self.steering.max_output);

        if let Err(e) = self.write(command) {
            tracing::warn!(
                cycle = self.cycle,
                error = %e,
                "motor write failed; cycle counts as line lost"
            );
            if let Err(e) = self.motor_stop() {
                tracing::warn!(error = %e, "motor_stop failed after write fault");
            }
            state = self.monitor.revise_as_lost();
            command = MotorCommand::STOP;
            fault.get_or_insert_with(|| Fault::MotorWrite(format!("{e:#}")));
        }

        let report = CycleReport {
            cycle: self.cycle,
            t_ms,
            values,
            present,
            center,
            command,
            state,
            loss_count: self.monitor.count(),
            maneuver: Maneuver::classify(command, self.steering.turn_threshold),
            fault,
        };
        self.sink.record(&report);
        self.cycle += 1;
        report
    }
}

impl<S: linetrace_traits::SensorArray, M: linetrace_traits::MotorPair> Drop for TracerCore<S, M> {
    fn drop(&mut self) {
        if !self.stopped
            && let Err(e) = self.motors.stop()
        {
            tracing::warn!(error = %e, "motor stop on drop failed");
        }
    }
}
