use std::error::Error;
use std::time::{Duration, Instant};

use linetrace_core::mocks::{MotorCall, RecordingMotors, ScriptedSensors};
use linetrace_core::runner::{self, RunParams};
use linetrace_core::{NullSink, RampOutcome, RunConfig, Shutdown, Tracer, TracerError};
use linetrace_traits::MotorPair;
use rstest::rstest;

const LINE_CENTER: [f32; 4] = [0.9, 0.3, 0.3, 0.9];

fn fast_config() -> RunConfig {
    let mut c = RunConfig::default();
    c.control.rate_hz = 1000.0;
    c.ramp.duration_ms = 0;
    c.ramp.steps = 0;
    c
}

fn limited(n: u64) -> RunParams {
    RunParams {
        max_cycles: Some(n),
        collect_stats: false,
    }
}

#[test]
fn stops_after_cycle_limit_and_halts() {
    let motors = RecordingMotors::new();
    let summary = runner::run(
        ScriptedSensors::constant(LINE_CENTER.to_vec()),
        motors.clone(),
        fast_config(),
        Some(Box::new(NullSink)),
        &limited(5),
        &Shutdown::new(),
    )
    .expect("run");
    assert_eq!(summary.cycles, 5);
    assert_eq!(summary.ramp, RampOutcome::Completed);
    assert!(!summary.cancelled);
    assert_eq!(summary.lost_cycles, 0);
    // one ramp command, five cycles, then the final stop
    assert_eq!(motors.sets().len(), 6);
    assert_eq!(motors.calls().last(), Some(&MotorCall::Stop));
}

#[test]
fn soft_start_issues_scaled_targets() {
    let motors = RecordingMotors::new();
    let mut c = fast_config();
    c.steering.base_speed = 0.5;
    c.ramp.steps = 4;
    c.ramp.duration_ms = 4;
    runner::run(
        ScriptedSensors::constant(LINE_CENTER.to_vec()),
        motors.clone(),
        c,
        Some(Box::new(NullSink)),
        &limited(0),
        &Shutdown::new(),
    )
    .expect("run");
    assert_eq!(
        motors.calls(),
        vec![
            MotorCall::Set(0.125, 0.125),
            MotorCall::Set(0.25, 0.25),
            MotorCall::Set(0.375, 0.375),
            MotorCall::Set(0.5, 0.5),
            MotorCall::Stop,
        ]
    );
}

#[test]
fn cancelled_before_start_only_stops() {
    let motors = RecordingMotors::new();
    let shutdown = Shutdown::new();
    shutdown.handle().trigger();
    let summary = runner::run(
        ScriptedSensors::constant(LINE_CENTER.to_vec()),
        motors.clone(),
        RunConfig::default(),
        Some(Box::new(NullSink)),
        &RunParams::default(),
        &shutdown,
    )
    .expect("run");
    assert!(summary.cancelled);
    assert_eq!(summary.ramp, RampOutcome::Cancelled);
    assert_eq!(summary.cycles, 0);
    assert_eq!(motors.calls(), vec![MotorCall::Stop]);
}

#[test]
fn cancellation_mid_ramp_stops_the_motors() {
    let motors = RecordingMotors::new();
    let shutdown = Shutdown::new();
    let handle = shutdown.handle();
    let mut c = RunConfig::default();
    c.steering.base_speed = 0.45;
    c.ramp.steps = 10;
    c.ramp.duration_ms = 1000;
    let trigger = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(250));
        handle.trigger();
    });
    let t0 = Instant::now();
    let summary = runner::run(
        ScriptedSensors::constant(LINE_CENTER.to_vec()),
        motors.clone(),
        c,
        Some(Box::new(NullSink)),
        &RunParams::default(),
        &shutdown,
    )
    .expect("run");
    trigger.join().expect("join");
    assert_eq!(summary.ramp, RampOutcome::Cancelled);
    assert!(summary.cancelled);
    assert_eq!(summary.cycles, 0);
    let sets = motors.sets();
    assert!(!sets.is_empty());
    assert!(sets.len() < 10, "ramp ran to completion: {sets:?}");
    assert!(sets.iter().all(|&(l, r)| l < 0.45 && r < 0.45));
    assert_eq!(motors.calls().last(), Some(&MotorCall::Stop));
    assert!(t0.elapsed() < Duration::from_millis(900));
}

#[test]
fn cancellation_wakes_the_loop_and_stops_motors() {
    let motors = RecordingMotors::new();
    let shutdown = Shutdown::new();
    let handle = shutdown.handle();
    let mut c = RunConfig::default();
    c.control.rate_hz = 2.0;
    c.ramp.steps = 0;
    c.ramp.duration_ms = 0;
    let mut t = Tracer::builder()
        .with_sensors(ScriptedSensors::constant(LINE_CENTER.to_vec()))
        .with_motors(motors.clone())
        .with_config(c)
        .with_sink(NullSink)
        .build()
        .expect("build");
    let trigger = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        handle.trigger();
    });
    let t0 = Instant::now();
    let summary = t.run(&RunParams::default(), &shutdown).expect("run");
    trigger.join().expect("join");
    assert!(summary.cancelled);
    assert_eq!(summary.cycles, 1);
    // woke well before the 500 ms period elapsed
    assert!(t0.elapsed() < Duration::from_millis(400));
    assert_eq!(motors.calls().last(), Some(&MotorCall::Stop));
}

#[test]
fn monitor_only_skips_the_ramp() {
    let motors = RecordingMotors::new();
    let mut c = fast_config();
    c.control.monitor_only = true;
    c.ramp.steps = 12;
    let summary = runner::run(
        ScriptedSensors::constant(LINE_CENTER.to_vec()),
        motors.clone(),
        c,
        Some(Box::new(NullSink)),
        &limited(3),
        &Shutdown::new(),
    )
    .expect("run");
    assert_eq!(summary.ramp, RampOutcome::Skipped);
    assert!(motors.sets().iter().all(|&s| s == (0.0, 0.0)));
    assert_eq!(motors.sets().len(), 3);
}

#[rstest]
#[case(1, 5, 1)]
#[case(2, 5, 1)]
#[case(6, 5, 0)]
fn counts_lost_cycles_and_estops(#[case] limit: u32, #[case] cycles: u64, #[case] estops: u64) {
    let mut c = fast_config();
    c.safety.loss_limit = limit;
    let summary = runner::run(
        ScriptedSensors::constant(vec![0.9; 4]),
        RecordingMotors::new(),
        c,
        Some(Box::new(NullSink)),
        &limited(cycles),
        &Shutdown::new(),
    )
    .expect("run");
    assert_eq!(summary.lost_cycles, cycles);
    assert_eq!(summary.emergency_stops, estops);
    assert_eq!(summary.faults, 0);
}

#[test]
fn stats_cover_every_cycle() {
    let summary = runner::run(
        ScriptedSensors::constant(LINE_CENTER.to_vec()),
        RecordingMotors::new(),
        fast_config(),
        Some(Box::new(NullSink)),
        &RunParams {
            max_cycles: Some(4),
            collect_stats: true,
        },
        &Shutdown::new(),
    )
    .expect("run");
    let stats = summary.stats.expect("stats");
    assert_eq!(stats.latencies_us.len(), 4);
    assert_eq!(stats.period_us, 1000);
    assert!(stats.min_us() <= stats.max_us());
    assert!(stats.stdev_us() >= 0.0);
}

struct StuckMotors;

impl MotorPair for StuckMotors {
    fn set(&mut self, _l: f32, _r: f32) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
    fn stop(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("driver unresponsive")))
    }
}

#[test]
fn failed_final_stop_is_an_error() {
    let err = runner::run(
        ScriptedSensors::constant(LINE_CENTER.to_vec()),
        StuckMotors,
        fast_config(),
        Some(Box::new(NullSink)),
        &limited(1),
        &Shutdown::new(),
    )
    .unwrap_err();
    assert!(
        matches!(err.downcast_ref::<TracerError>(), Some(TracerError::StopFailed(_))),
        "{err:#}"
    );
}
