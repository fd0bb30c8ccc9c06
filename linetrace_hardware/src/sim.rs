//! Simulated sensor array and motor driver.
//!
//! The sensor models a dark line of Gaussian cross-section under an evenly
//! spaced array; the line's lateral position follows a `LinePath` evaluated
//! against an injectable clock, so runs are reproducible under `ManualClock`.
use std::sync::{Arc, Mutex};
use std::time::Instant;

use linetrace_traits::{Clock, MotorPair, SensorArray};

use crate::error::HwError;

/// Reflectance over the background, in raw white-high units.
const WHITE_LEVEL: f32 = 0.9;
/// Reflectance at the middle of the line.
const BLACK_LEVEL: f32 = 0.1;
/// Line half-width (standard deviation) in array coordinates.
const LINE_SIGMA: f32 = 0.35;

/// Where the simulated line sits under the array over time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinePath {
    /// No line under the array.
    Absent,
    /// Fixed lateral position in `[-1, 1]` (negative = left).
    Fixed(f32),
    /// Sinusoidal sweep with the given amplitude and period.
    Sweep { amplitude: f32, period_ms: u64 },
}

impl LinePath {
    /// Lateral position `elapsed_ms` into the run, or `None` when absent.
    pub fn position_at(&self, elapsed_ms: u64) -> Option<f32> {
        match *self {
            LinePath::Absent => None,
            LinePath::Fixed(p) => Some(p.clamp(-1.0, 1.0)),
            LinePath::Sweep {
                amplitude,
                period_ms,
            } => {
                let period = period_ms.max(1) as f32;
                let phase = (elapsed_ms % period_ms.max(1)) as f32 / period;
                Some((amplitude * (std::f32::consts::TAU * phase).sin()).clamp(-1.0, 1.0))
            }
        }
    }
}

/// Simulated reflectance array.
pub struct SimulatedLineSensor<C: Clock> {
    positions: Vec<f32>,
    white_is_high: bool,
    path: LinePath,
    clock: C,
    epoch: Instant,
    fail_every: Option<u32>,
    reads: u32,
}

impl<C: Clock> SimulatedLineSensor<C> {
    pub fn new(channels: usize, white_is_high: bool, path: LinePath, clock: C) -> Self {
        let n = channels.max(1);
        let half = (n as f32 - 1.0) / 2.0;
        let positions = (0..n)
            .map(|i| if half > 0.0 { (i as f32 - half) / half } else { 0.0 })
            .collect();
        let epoch = clock.now();
        Self {
            positions,
            white_is_high,
            path,
            clock,
            epoch,
            fail_every: None,
            reads: 0,
        }
    }

    /// Make every `n`-th read fail with `HwError::Simulated`.
    pub fn fail_every(mut self, n: u32) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    fn sample(&self, line: Option<f32>) -> Vec<f32> {
        self.positions
            .iter()
            .map(|&x| {
                let depth = line.map_or(0.0, |p| {
                    let d = (x - p) / LINE_SIGMA;
                    (-0.5 * d * d).exp()
                });
                let white_high = WHITE_LEVEL - (WHITE_LEVEL - BLACK_LEVEL) * depth;
                if self.white_is_high {
                    white_high
                } else {
                    1.0 - white_high
                }
            })
            .collect()
    }
}

impl<C: Clock> SensorArray for SimulatedLineSensor<C> {
    fn read(&mut self) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
        self.reads = self.reads.wrapping_add(1);
        if let Some(n) = self.fail_every
            && self.reads % n == 0
        {
            return Err(Box::new(HwError::Simulated));
        }
        let elapsed = self.clock.ms_since(self.epoch);
        let line = self.path.position_at(elapsed);
        let values = self.sample(line);
        tracing::trace!(?line, ?values, "simulated sensor read");
        Ok(values)
    }
}

/// Read-only view of the last command accepted by `SimulatedMotors`.
#[derive(Debug, Clone, Default)]
pub struct MotorProbe {
    last: Arc<Mutex<(f32, f32)>>,
}

impl MotorProbe {
    pub fn last(&self) -> (f32, f32) {
        self.last.lock().map(|g| *g).unwrap_or((0.0, 0.0))
    }
}

/// Simulated motor driver; remembers the last command.
#[derive(Debug, Default)]
pub struct SimulatedMotors {
    probe: MotorProbe,
}

impl SimulatedMotors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> MotorProbe {
        self.probe.clone()
    }

    fn store(&self, cmd: (f32, f32)) {
        if let Ok(mut g) = self.probe.last.lock() {
            *g = cmd;
        }
    }
}

impl MotorPair for SimulatedMotors {
    fn set(
        &mut self,
        left: f32,
        right: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::trace!(left, right, "simulated motors set");
        self.store((left, right));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!("simulated motors stopped");
        self.store((0.0, 0.0));
        Ok(())
    }
}
