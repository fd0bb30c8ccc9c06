//! Test and helper mocks for linetrace_core

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Sensor array replaying a fixed script of readings.
///
/// Each entry is either a reading or an error message. Once the script is
/// exhausted the last entry repeats.
#[derive(Debug, Clone)]
pub struct ScriptedSensors {
    script: VecDeque<Result<Vec<f32>, String>>,
    last: Result<Vec<f32>, String>,
}

impl ScriptedSensors {
    pub fn new<I>(readings: I) -> Self
    where
        I: IntoIterator<Item = Vec<f32>>,
    {
        Self::from_script(readings.into_iter().map(Ok))
    }

    pub fn from_script<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Result<Vec<f32>, String>>,
    {
        Self {
            script: script.into_iter().collect(),
            last: Err("script empty".into()),
        }
    }

    /// Always returns `reading`.
    pub fn constant(reading: Vec<f32>) -> Self {
        Self::new([reading])
    }
}

impl linetrace_traits::SensorArray for ScriptedSensors {
    fn read(&mut self) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last.clone().map_err(Into::into)
    }
}

/// One call made on `RecordingMotors`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCall {
    Set(f32, f32),
    Stop,
}

/// Motor pair that records every call; clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingMotors {
    calls: Arc<Mutex<Vec<MotorCall>>>,
    fail_sets: Arc<Mutex<VecDeque<bool>>>,
}

impl RecordingMotors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the upcoming `set` calls according to `pattern` (true = fail).
    pub fn fail_sets(self, pattern: impl IntoIterator<Item = bool>) -> Self {
        if let Ok(mut f) = self.fail_sets.lock() {
            f.extend(pattern);
        }
        self
    }

    pub fn calls(&self) -> Vec<MotorCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Only the `set` calls, as `(left, right)`.
    pub fn sets(&self) -> Vec<(f32, f32)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MotorCall::Set(l, r) => Some((l, r)),
                MotorCall::Stop => None,
            })
            .collect()
    }

    pub fn stops(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MotorCall::Stop))
            .count()
    }

    fn push(&self, call: MotorCall) {
        if let Ok(mut c) = self.calls.lock() {
            c.push(call);
        }
    }
}

impl linetrace_traits::MotorPair for RecordingMotors {
    fn set(
        &mut self,
        left: f32,
        right: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.push(MotorCall::Set(left, right));
        let fail = self
            .fail_sets
            .lock()
            .ok()
            .and_then(|mut f| f.pop_front())
            .unwrap_or(false);
        if fail {
            return Err(Box::new(std::io::Error::other("motor driver rejected command")));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.push(MotorCall::Stop);
        Ok(())
    }
}
