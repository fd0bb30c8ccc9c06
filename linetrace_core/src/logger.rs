//! Per-cycle diagnostic output.

use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::status::CycleReport;

/// Receives one record per control cycle.
pub trait DiagnosticSink {
    fn record(&mut self, report: &CycleReport);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Box<T> {
    fn record(&mut self, report: &CycleReport) {
        (**self).record(report);
    }
}

/// Fans a record out to several sinks.
impl DiagnosticSink for Vec<Box<dyn DiagnosticSink>> {
    fn record(&mut self, report: &CycleReport) {
        for sink in self.iter_mut() {
            sink.record(report);
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _report: &CycleReport) {}
}

/// Emits records as `tracing` events on target `linetrace::cycle`.
///
/// Only every `every`-th cycle is emitted; cycles with a fault always are.
#[derive(Debug, Clone)]
pub struct TracingSink {
    every: u64,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self { every: 1 }
    }
}

impl TracingSink {
    pub fn new(every: u32) -> Self {
        Self {
            every: u64::from(every.max(1)),
        }
    }

    /// Whether `r` passes the decimation. Faulty cycles always do.
    pub fn should_emit(&self, r: &CycleReport) -> bool {
        r.fault.is_some() || r.cycle % self.every == 0
    }
}

impl DiagnosticSink for TracingSink {
    fn record(&mut self, r: &CycleReport) {
        if !self.should_emit(r) {
            return;
        }
        if let Some(fault) = &r.fault {
            tracing::warn!(
                target: "linetrace::cycle",
                cycle = r.cycle,
                t_ms = r.t_ms,
                values = ?r.values,
                center = r.center,
                left = r.command.left,
                right = r.command.right,
                state = r.state.as_str(),
                loss = r.loss_count,
                maneuver = r.maneuver.as_str(),
                fault = %fault,
                "cycle fault"
            );
            return;
        }
        tracing::info!(
            target: "linetrace::cycle",
            cycle = r.cycle,
            t_ms = r.t_ms,
            values = ?r.values,
            center = r.center,
            left = r.command.left,
            right = r.command.right,
            state = r.state.as_str(),
            loss = r.loss_count,
            maneuver = r.maneuver.as_str(),
            "cycle"
        );
    }
}

/// Appends the human-readable line of every record to a file.
pub struct FileSink {
    out: LineWriter<File>,
    failed: bool,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            out: LineWriter::new(file),
            failed: false,
        })
    }
}

impl DiagnosticSink for FileSink {
    fn record(&mut self, report: &CycleReport) {
        if let Err(e) = writeln!(self.out, "{report}") {
            // first failure only
            if !self.failed {
                tracing::warn!(error = %e, "cycle log write failed");
                self.failed = true;
            }
        }
    }
}

/// Keeps every record in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    records: Arc<Mutex<Vec<CycleReport>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CycleReport> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticSink for CaptureSink {
    fn record(&mut self, report: &CycleReport) {
        if let Ok(mut r) = self.records.lock() {
            r.push(report.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::MotorCommand;
    use crate::monitor::LossState;
    use crate::status::{Fault, Maneuver};

    fn report(cycle: u64) -> CycleReport {
        CycleReport {
            cycle,
            t_ms: cycle * 40,
            values: vec![0.9, 0.3, 0.3, 0.9],
            present: true,
            center: 0.0,
            command: MotorCommand::new(0.45, 0.45),
            state: LossState::Tracking,
            loss_count: 0,
            maneuver: Maneuver::Forward,
            fault: None,
        }
    }

    #[test]
    fn file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycles.log");
        {
            let mut sink = FileSink::new(&path).unwrap();
            sink.record(&report(0));
            sink.record(&report(1));
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("out=(+0.45,+0.45) forward"));
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let a = CaptureSink::new();
        let b = CaptureSink::new();
        let mut sinks: Vec<Box<dyn DiagnosticSink>> =
            vec![Box::new(a.clone()), Box::new(b.clone()), Box::new(NullSink)];
        sinks.record(&report(3));
        assert_eq!(a.records().len(), 1);
        assert_eq!(b.records()[0].cycle, 3);
    }

    #[test]
    fn tracing_sink_never_panics_without_subscriber() {
        let mut s = TracingSink::new(0);
        for c in 0..5 {
            s.record(&report(c));
        }
    }

    #[test]
    fn tracing_sink_decimates_by_cycle() {
        let s = TracingSink::new(3);
        let emitted: Vec<u64> = (0..8).filter(|&c| s.should_emit(&report(c))).collect();
        assert_eq!(emitted, vec![0, 3, 6]);
    }

    #[test]
    fn tracing_sink_always_emits_faults() {
        let s = TracingSink::new(3);
        let mut faulty = report(1);
        faulty.fault = Some(Fault::SensorRead("spi timeout".into()));
        assert!(s.should_emit(&faulty));
        assert!(!s.should_emit(&report(1)));
    }

    #[test]
    fn zero_interval_emits_every_cycle() {
        let s = TracingSink::new(0);
        assert!((0..4).all(|c| s.should_emit(&report(c))));
        assert!(TracingSink::default().should_emit(&report(7)));
    }
}
