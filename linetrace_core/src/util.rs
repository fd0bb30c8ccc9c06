//! Common time/period helpers for linetrace_core.

use std::time::Duration;

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Highest accepted control rate.
pub const MAX_RATE_HZ: f32 = 1000.0;

/// Compute the loop period in microseconds for a given rate in Hz.
/// - Non-finite or non-positive rates fall back to 1 Hz.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: f32) -> u64 {
    let hz = if hz.is_finite() && hz > 0.0 { f64::from(hz) } else { 1.0 };
    ((MICROS_PER_SEC as f64 / hz).round() as u64).max(1)
}

/// Loop period for a given rate in Hz.
#[inline]
pub fn period(hz: f32) -> Duration {
    Duration::from_micros(period_us(hz))
}
