//! Run loop: soft start, paced control cycles, and the final halt.

use std::time::{Duration, Instant};

use linetrace_traits::{MotorPair, SensorArray};

use crate::builder::build_tracer;
use crate::config::RunConfig;
use crate::error::{Result, TracerError};
use crate::logger::DiagnosticSink;
use crate::monitor::LossState;
use crate::ramp::RampOutcome;
use crate::shutdown::Shutdown;
use crate::status::CycleReport;
use crate::tracer::TracerCore;

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    /// Stop after this many control cycles.
    pub max_cycles: Option<u64>,
    /// Record per-cycle latency for `LoopStats`.
    pub collect_stats: bool,
}

/// Control loop timing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopStats {
    /// Per-cycle work time in microseconds.
    pub latencies_us: Vec<u64>,
    pub missed_deadlines: usize,
    pub period_us: u64,
}

impl LoopStats {
    fn new(period: Duration) -> Self {
        Self {
            latencies_us: Vec::new(),
            missed_deadlines: 0,
            period_us: u64::try_from(period.as_micros()).unwrap_or(u64::MAX),
        }
    }

    fn record(&mut self, latency: Duration) {
        let us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latencies_us.push(us);
        if us > self.period_us {
            self.missed_deadlines = self.missed_deadlines.saturating_add(1);
        }
    }

    pub fn min_us(&self) -> u64 {
        self.latencies_us.iter().copied().min().unwrap_or(0)
    }

    pub fn max_us(&self) -> u64 {
        self.latencies_us.iter().copied().max().unwrap_or(0)
    }

    pub fn avg_us(&self) -> f64 {
        if self.latencies_us.is_empty() {
            return 0.0;
        }
        self.latencies_us.iter().sum::<u64>() as f64 / self.latencies_us.len() as f64
    }

    /// Sample standard deviation; 0 with fewer than two samples.
    pub fn stdev_us(&self) -> f64 {
        let n = self.latencies_us.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.avg_us();
        let var = self
            .latencies_us
            .iter()
            .map(|&x| (x as f64 - mean).powi(2))
            .sum::<f64>()
            / (n as f64 - 1.0);
        var.sqrt()
    }
}

/// What happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ramp: RampOutcome,
    pub cycles: u64,
    /// Cycles in which the line counted as absent.
    pub lost_cycles: u64,
    /// Times the emergency stop latched.
    pub emergency_stops: u64,
    /// Cycles carrying a sensor or motor fault.
    pub faults: u64,
    /// True when the run ended through the shutdown token.
    pub cancelled: bool,
    pub stats: Option<LoopStats>,
}

impl RunSummary {
    fn new(ramp: RampOutcome) -> Self {
        Self {
            ramp,
            cycles: 0,
            lost_cycles: 0,
            emergency_stops: 0,
            faults: 0,
            cancelled: false,
            stats: None,
        }
    }

    fn absorb(&mut self, report: &CycleReport, previous: LossState) {
        self.cycles += 1;
        if report.lost() {
            self.lost_cycles += 1;
        }
        if report.state == LossState::EmergencyStop && previous != LossState::EmergencyStop {
            self.emergency_stops += 1;
        }
        if report.fault.is_some() {
            self.faults += 1;
        }
    }
}

/// Build a tracer and run it until cancelled or the cycle limit.
pub fn run<S, M>(
    sensors: S,
    motors: M,
    config: RunConfig,
    sink: Option<Box<dyn DiagnosticSink>>,
    params: &RunParams,
    shutdown: &Shutdown,
) -> Result<RunSummary>
where
    S: SensorArray + 'static,
    M: MotorPair + 'static,
{
    let mut tracer = build_tracer(sensors, motors, config, None, sink)?;
    drive(&mut tracer, params, shutdown)
}

/// Soft start, then fixed-period cycles until `shutdown` fires or
/// `params.max_cycles` is reached. The motors are stopped on every exit.
pub fn drive<S, M>(
    tracer: &mut TracerCore<S, M>,
    params: &RunParams,
    shutdown: &Shutdown,
) -> Result<RunSummary>
where
    S: SensorArray,
    M: MotorPair,
{
    tracer.begin();
    let period = tracer.period();
    tracing::info!(
        rate_hz = tracer.rate_hz(),
        strategy = tracer.strategy(),
        monitor_only = tracer.monitor_only(),
        max_cycles = ?params.max_cycles,
        "line follow start"
    );

    let ramp = tracer.soft_start(shutdown);
    let mut summary = RunSummary::new(ramp);
    let mut stats = params.collect_stats.then(|| LoopStats::new(period));

    if ramp == RampOutcome::Cancelled {
        summary.cancelled = true;
    } else {
        let mut deadline = Instant::now() + period;
        loop {
            if params.max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }
            if shutdown.is_triggered() {
                summary.cancelled = true;
                break;
            }
            let t0 = Instant::now();
            let previous = tracer.loss_state();
            let report = tracer.step();
            summary.absorb(&report, previous);
            if let Some(s) = stats.as_mut() {
                s.record(t0.elapsed());
            }
            if params.max_cycles.is_some_and(|max| summary.cycles >= max) {
                break;
            }

            let now = Instant::now();
            let remaining = deadline.saturating_duration_since(now);
            deadline += period;
            if deadline < now {
                // fell behind; restart the schedule from here
                deadline = now + period;
            }
            if shutdown.wait(remaining) {
                summary.cancelled = true;
                break;
            }
        }
    }
    summary.stats = stats;

    let stopped = tracer.halt();
    tracing::info!(
        cycles = summary.cycles,
        lost = summary.lost_cycles,
        estops = summary.emergency_stops,
        faults = summary.faults,
        cancelled = summary.cancelled,
        "line follow stop"
    );
    stopped.map_err(|e| {
        let msg = format!("{e:#}");
        e.wrap_err(TracerError::StopFailed(msg))
    })?;
    Ok(summary)
}
