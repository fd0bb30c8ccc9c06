//! Type-state builder for `Tracer` and generic `build_tracer` constructor.
//!
//! The builder enforces at compile time that sensors and motors are provided
//! before `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use linetrace_traits::{Clock, MonotonicClock, MotorPair, SensorArray};

use crate::config::*;
use crate::error::{BuildError, Result};
use crate::estimator::for_strategy;
use crate::filter::ChannelFilter;
use crate::logger::{DiagnosticSink, TracingSink};
use crate::mixer::{Mixer, MotorCommand};
use crate::monitor::{LossMonitor, LossState};
use crate::ramp::RampOutcome;
use crate::runner::{RunParams, RunSummary};
use crate::shutdown::Shutdown;
use crate::status::CycleReport;
use crate::tracer::TracerCore;
use crate::util::{MAX_RATE_HZ, period};

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Line follower over boxed devices.
pub struct Tracer {
    pub(crate) inner: TracerCore<Box<dyn SensorArray>, Box<dyn MotorPair>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.inner, f)
    }
}

impl Tracer {
    /// Start building a Tracer.
    pub fn builder() -> TracerBuilder<Missing, Missing> {
        TracerBuilder::default()
    }

    /// Reset per-run state. Call before a new run.
    pub fn begin(&mut self) {
        self.inner.begin();
    }

    /// One iteration of the control loop.
    pub fn step(&mut self) -> CycleReport {
        self.inner.step()
    }

    pub fn soft_start(&mut self, shutdown: &Shutdown) -> RampOutcome {
        self.inner.soft_start(shutdown)
    }

    /// Stop both motors.
    pub fn motor_stop(&mut self) -> Result<()> {
        self.inner.motor_stop()
    }

    /// Ramp, loop until cancelled or the cycle limit, then stop the motors.
    pub fn run(&mut self, params: &RunParams, shutdown: &Shutdown) -> Result<RunSummary> {
        crate::runner::drive(&mut self.inner, params, shutdown)
    }

    pub fn loss_state(&self) -> LossState {
        self.inner.loss_state()
    }

    pub fn last_command(&self) -> MotorCommand {
        self.inner.last_command()
    }

    pub fn strategy(&self) -> &'static str {
        self.inner.strategy()
    }

    pub fn monitor_only(&self) -> bool {
        self.inner.monitor_only()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Tracer`. All fields are validated on `build()`.
pub struct TracerBuilder<S, M> {
    sensors: Option<Box<dyn SensorArray>>,
    motors: Option<Box<dyn MotorPair>>,
    config: RunConfig,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    sink: Option<Box<dyn DiagnosticSink>>,
    _s: PhantomData<S>,
    _m: PhantomData<M>,
}

impl Default for TracerBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            sensors: None,
            motors: None,
            config: RunConfig::default(),
            clock: None,
            sink: None,
            _s: PhantomData,
            _m: PhantomData,
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Reject configurations the loop cannot run with.
pub fn validate(config: &RunConfig) -> Result<()> {
    let RunConfig {
        sensors,
        filter,
        steering,
        safety,
        control,
        ramp: _,
    } = config;
    if sensors.channels == 0 {
        return Err(invalid("at least one sensor channel is required"));
    }
    if !(sensors.dark_threshold > 0.0 && sensors.dark_threshold < 1.0) {
        return Err(invalid("dark_threshold must be in (0, 1)"));
    }
    if filter.window == 0 {
        return Err(invalid("filter window must be >= 1"));
    }
    if !(0.0..=1.0).contains(&steering.base_speed) {
        return Err(invalid("base_speed must be in [0, 1]"));
    }
    if !steering.gain.is_finite() || steering.gain < 0.0 {
        return Err(invalid("gain must be finite and >= 0"));
    }
    if !(0.0..1.0).contains(&steering.deadband) {
        return Err(invalid("deadband must be in [0, 1)"));
    }
    if !(steering.max_output > 0.0 && steering.max_output <= 1.0) {
        return Err(invalid("max_output must be in (0, 1]"));
    }
    if !steering.turn_threshold.is_finite() || steering.turn_threshold < 0.0 {
        return Err(invalid("turn_threshold must be finite and >= 0"));
    }
    if let Strategy::Paired { left, right } = &steering.strategy
        && left.iter().chain(right).any(|&i| i >= sensors.channels)
    {
        return Err(invalid("paired group index out of range"));
    }
    if !control.rate_hz.is_finite() || control.rate_hz <= 0.0 {
        return Err(invalid("rate_hz must be > 0"));
    }
    if control.rate_hz > MAX_RATE_HZ {
        return Err(invalid("rate_hz must be <= 1000"));
    }
    if safety.loss_limit == 0 {
        return Err(invalid("loss_limit must be >= 1"));
    }
    Ok(())
}

/// Validate configuration and construct a `TracerCore`.
///
/// This is the single source of truth for validation and construction,
/// used by both `TracerBuilder::try_build()` and `build_tracer()`.
fn validate_and_build<S: SensorArray, M: MotorPair>(
    sensors: S,
    motors: M,
    config: RunConfig,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    sink: Option<Box<dyn DiagnosticSink>>,
) -> Result<TracerCore<S, M>> {
    validate(&config)?;

    let RunConfig {
        sensors: sensor_cfg,
        filter,
        steering,
        safety,
        control,
        ramp,
    } = config;

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let epoch = clock.now();

    let estimator = for_strategy(
        &steering.strategy,
        sensor_cfg.channels,
        sensor_cfg.dark_threshold,
        steering.deadband,
    );

    Ok(TracerCore {
        sensors,
        motors,
        filter: ChannelFilter::new(sensor_cfg.channels, filter.window),
        estimator,
        mixer: Mixer {
            base_speed: steering.base_speed,
            gain: steering.gain,
        },
        monitor: LossMonitor::new(safety.loss_limit),
        sink: sink.unwrap_or_else(|| Box::new(TracingSink::default())),
        clock,
        epoch,
        period: period(control.rate_hz),
        cycle: 0,
        last_command: MotorCommand::STOP,
        stopped: true,
        sensor_cfg,
        steering,
        control,
        ramp,
    })
}

impl<S, M> TracerBuilder<S, M> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Tracer> {
        let sensors = self
            .sensors
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensors))?;
        let motors = self
            .motors
            .ok_or_else(|| eyre::Report::new(BuildError::MissingMotors))?;
        let inner = validate_and_build(sensors, motors, self.config, self.clock, self.sink)?;
        Ok(Tracer { inner })
    }
}

/// Chainable setters that do not affect type-state.
impl<S, M> TracerBuilder<S, M> {
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }
    pub fn with_sensor_cfg(mut self, sensors: SensorCfg) -> Self {
        self.config.sensors = sensors;
        self
    }
    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.config.filter = filter;
        self
    }
    pub fn with_steering(mut self, steering: SteeringCfg) -> Self {
        self.config.steering = steering;
        self
    }
    pub fn with_safety(mut self, safety: SafetyCfg) -> Self {
        self.config.safety = safety;
        self
    }
    pub fn with_loop(mut self, control: LoopCfg) -> Self {
        self.config.control = control;
        self
    }
    pub fn with_ramp(mut self, ramp: RampCfg) -> Self {
        self.config.ramp = ramp;
        self
    }
    pub fn monitor_only(mut self, yes: bool) -> Self {
        self.config.control.monitor_only = yes;
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    /// Where cycle records go; defaults to `TracingSink`.
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }
}

// Setters that advance type-state
impl<M> TracerBuilder<Missing, M> {
    pub fn with_sensors(self, sensors: impl SensorArray + 'static) -> TracerBuilder<Set, M> {
        TracerBuilder {
            sensors: Some(Box::new(sensors)),
            motors: self.motors,
            config: self.config,
            clock: self.clock,
            sink: self.sink,
            _s: PhantomData,
            _m: PhantomData,
        }
    }
}

impl<S> TracerBuilder<S, Missing> {
    pub fn with_motors(self, motors: impl MotorPair + 'static) -> TracerBuilder<S, Set> {
        TracerBuilder {
            sensors: self.sensors,
            motors: Some(Box::new(motors)),
            config: self.config,
            clock: self.clock,
            sink: self.sink,
            _s: PhantomData,
            _m: PhantomData,
        }
    }
}

impl TracerBuilder<Set, Set> {
    /// Validate and build the Tracer. Only available when sensors and motors are set.
    pub fn build(self) -> Result<Tracer> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias using the unified core.
pub type TracerG<S, M> = TracerCore<S, M>;

/// Build a statically-dispatched `TracerG` from concrete sensors and motors.
///
/// Delegates to the shared `validate_and_build`.
pub fn build_tracer<S, M>(
    sensors: S,
    motors: M,
    config: RunConfig,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    sink: Option<Box<dyn DiagnosticSink>>,
) -> Result<TracerG<S, M>>
where
    S: SensorArray + 'static,
    M: MotorPair + 'static,
{
    validate_and_build(sensors, motors, config, clock, sink)
}
