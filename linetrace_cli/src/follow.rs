//! Config mapping, backend assembly, and the `run` / `self-check` commands.

use eyre::WrapErr;
use linetrace_config::Config;
use linetrace_core::error::{Result, TracerError};
use linetrace_core::hw_error::map_hw_error;
use linetrace_core::runner::{self, RunParams, RunSummary};
use linetrace_core::{DiagnosticSink, FileSink, LoopStats, RunConfig, Shutdown, TracingSink};
use linetrace_traits::{MotorPair, SensorArray};

use crate::cli::RunArgs;

/// Sensor array and motors behind the trait seams.
pub type Backend = (Box<dyn SensorArray>, Box<dyn MotorPair>);

/// Apply the command-line overrides, then validate the result.
pub fn effective_config(cfg: &Config, args: &RunArgs) -> Result<Config> {
    let mut cfg = cfg.clone();
    if args.monitor {
        cfg.control.monitor_only = true;
    }
    if let Some(speed) = args.speed {
        cfg.steering.base_speed = speed;
    }
    if let Some(gain) = args.gain {
        cfg.steering.gain = gain;
    }
    if let Some(hz) = args.hz {
        cfg.control.rate_hz = hz;
    }
    cfg.validate().map_err(config_error)?;
    Ok(cfg)
}

/// Tag a config failure so it maps to the configuration exit code.
pub fn config_error(e: eyre::Report) -> eyre::Report {
    eyre::Report::new(TracerError::Config(format!("{e:#}")))
}

#[cfg(not(feature = "hardware"))]
pub fn make_backend(cfg: &Config) -> Result<Backend> {
    use linetrace_hardware::{LinePath, SimulatedLineSensor, SimulatedMotors};
    use linetrace_traits::MonotonicClock;

    let path = match std::env::var("LINETRACE_SIM_LINE").as_deref() {
        Ok("lost") => LinePath::Absent,
        Ok("center") => LinePath::Fixed(0.0),
        Ok("left") => LinePath::Fixed(-0.6),
        Ok("right") => LinePath::Fixed(0.6),
        _ => LinePath::Sweep {
            amplitude: 0.6,
            period_ms: 4000,
        },
    };
    let fail_every = std::env::var("LINETRACE_SIM_FAIL_READS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(0);
    tracing::info!(?path, fail_every, "using simulated backend");

    let sensors = SimulatedLineSensor::new(
        cfg.sensors.channels.len(),
        cfg.sensors.white_is_high,
        path,
        MonotonicClock::new(),
    )
    .fail_every(fail_every);
    Ok((Box::new(sensors), Box::new(SimulatedMotors::new())))
}

#[cfg(feature = "hardware")]
pub fn make_backend(cfg: &Config) -> Result<Backend> {
    use linetrace_hardware::{HardwareMotors, HardwareSensors, HwError};

    fn hw_init(e: HwError) -> eyre::Report {
        eyre::Report::new(TracerError::HardwareFault(e.to_string()))
    }

    let p = &cfg.pins;
    let sensors = HardwareSensors::new(
        p.spi_bus,
        p.spi_chip_select,
        p.spi_clock_hz,
        cfg.sensors.channels.clone(),
    )
    .map_err(hw_init)
    .wrap_err("open mcp3004")?;
    let motors = HardwareMotors::new(
        (p.left_in1, p.left_in2),
        (p.right_in1, p.right_in2),
        p.pwm_hz,
    )
    .map_err(hw_init)
    .wrap_err("open motor pins")?;
    Ok((Box::new(sensors), Box::new(motors)))
}

fn make_sink(cfg: &Config) -> Result<Box<dyn DiagnosticSink>> {
    let mut sinks: Vec<Box<dyn DiagnosticSink>> =
        vec![Box::new(TracingSink::new(cfg.logging.cycle_every))];
    if let Some(path) = cfg.logging.cycle_file.as_deref() {
        let file = FileSink::new(path).wrap_err_with(|| format!("open cycle file {path}"))?;
        sinks.push(Box::new(file));
    }
    Ok(Box::new(sinks))
}

/// Follow the line with the configured backend until cancelled or the cycle limit.
pub fn run_follow(cfg: &Config, args: &RunArgs, shutdown: &Shutdown) -> Result<RunSummary> {
    let cfg = effective_config(cfg, args)?;
    let (sensors, motors) = make_backend(&cfg).wrap_err("hardware init")?;
    let sink = make_sink(&cfg)?;
    let params = RunParams {
        max_cycles: args.cycles,
        collect_stats: args.stats,
    };
    let summary = runner::run(
        sensors,
        motors,
        RunConfig::from(&cfg),
        Some(sink),
        &params,
        shutdown,
    )?;
    if let Some(stats) = summary.stats.as_ref() {
        print_stats(stats, summary.cycles);
    }
    Ok(summary)
}

/// One-line report of a finished run.
pub fn summary_text(s: &RunSummary) -> String {
    format!(
        "run complete: cycles={} lost={} estops={} faults={} ramp={}{}",
        s.cycles,
        s.lost_cycles,
        s.emergency_stops,
        s.faults,
        s.ramp.as_str(),
        if s.cancelled { " (cancelled)" } else { "" }
    )
}

/// JSON record of a finished run.
pub fn summary_json(s: &RunSummary, cfg: &Config, args: &RunArgs) -> serde_json::Value {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
    serde_json::json!({
        "timestamp": timestamp,
        "cycles": s.cycles,
        "lost_cycles": s.lost_cycles,
        "emergency_stops": s.emergency_stops,
        "faults": s.faults,
        "cancelled": s.cancelled,
        "ramp": s.ramp.as_str(),
        "monitor_only": args.monitor || cfg.control.monitor_only,
        "strategy": cfg.steering.strategy.as_str(),
    })
}

/// Build the backend, read once, command zero and stop.
pub fn self_check(cfg: &Config) -> Result<String> {
    let (mut sensors, mut motors) = make_backend(cfg).wrap_err("hardware init")?;
    let values = sensors
        .read()
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err("sensor read")?;
    let expected = cfg.sensors.channels.len();
    if values.len() != expected {
        return Err(eyre::Report::new(TracerError::HardwareFault(format!(
            "expected {expected} channels, read {}",
            values.len()
        ))));
    }
    motors
        .set(0.0, 0.0)
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err("motor set")?;
    motors
        .stop()
        .map_err(|e| eyre::Report::new(TracerError::StopFailed(e.to_string())))?;
    let vals = values
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("self-check ok: {expected} channels [{vals}]"))
}

/// Print latency/jitter stats to stderr.
fn print_stats(stats: &LoopStats, cycles: u64) {
    let min = stats.min_us();
    let max = stats.max_us();
    let avg = stats.avg_us();
    let stdev = stats.stdev_us();
    eprintln!("\n--- Linetrace Stats ---");
    eprintln!("Cycles: {cycles}");
    eprintln!("Period (us): {}", stats.period_us);
    eprintln!("Latency min/avg/max/stdev (us): {min:.0} / {avg:.1} / {max:.0} / {stdev:.1}");
    eprintln!("Missed deadlines (> period): {}", stats.missed_deadlines);
    eprintln!("-----------------------\n");
}
