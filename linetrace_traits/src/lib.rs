//! Hardware seams shared by the controller, the hardware backends and tests.
//!
//! Both traits return `Box<dyn Error + Send + Sync>` so backends are free to
//! surface their own error types; `linetrace_core::hw_error` maps them back to
//! typed errors.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Reflectance sensor array, read left-to-right by physical placement.
pub trait SensorArray {
    /// Read one raw value per channel, each in `[0, 1]`.
    fn read(&mut self) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Differential drive with one motor per side.
pub trait MotorPair {
    /// Command both sides; values are in `[-1, 1]` (negative = reverse).
    fn set(&mut self, left: f32, right: f32)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Force both sides to zero. Must be safe to call repeatedly.
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: SensorArray + ?Sized> SensorArray for Box<T> {
    fn read(&mut self) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}

impl<T: MotorPair + ?Sized> MotorPair for Box<T> {
    fn set(
        &mut self,
        left: f32,
        right: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set(left, right)
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).stop()
    }
}
