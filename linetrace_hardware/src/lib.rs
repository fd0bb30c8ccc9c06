//! Sensor and motor backends for the line follower.
//!
//! The simulated backend is always available; the MCP3004 + DRV8835 backend
//! for the Raspberry Pi is compiled with the `hardware` feature.
#[cfg(feature = "hardware")]
pub mod drv8835;
pub mod error;
#[cfg(feature = "hardware")]
pub mod mcp3004;
pub mod sim;

pub use error::HwError;
pub use sim::{LinePath, MotorProbe, SimulatedLineSensor, SimulatedMotors};

#[cfg(feature = "hardware")]
pub struct HardwareSensors {
    adc: mcp3004::Mcp3004,
    channels: Vec<u8>,
}

#[cfg(feature = "hardware")]
impl HardwareSensors {
    pub fn new(bus: u8, chip_select: u8, clock_hz: u32, channels: Vec<u8>) -> error::Result<Self> {
        let adc = mcp3004::Mcp3004::new(bus, chip_select, clock_hz)?;
        tracing::info!(bus, chip_select, ?channels, "mcp3004 opened");
        Ok(Self { adc, channels })
    }
}

#[cfg(feature = "hardware")]
impl linetrace_traits::SensorArray for HardwareSensors {
    fn read(&mut self) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
        let mut out = Vec::with_capacity(self.channels.len());
        for &ch in &self.channels {
            match self.adc.read_channel(ch) {
                Ok(v) => out.push(v),
                Err(e) => {
                    tracing::error!(channel = ch, error = %e, "adc read error");
                    return Err(Box::new(e));
                }
            }
        }
        Ok(out)
    }
}

#[cfg(feature = "hardware")]
pub struct HardwareMotors {
    left: drv8835::Bridge,
    right: drv8835::Bridge,
}

#[cfg(feature = "hardware")]
impl HardwareMotors {
    pub fn new(pins: (u8, u8), right_pins: (u8, u8), pwm_hz: f64) -> error::Result<Self> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let left = drv8835::Bridge::new(&gpio, pins.0, pins.1, pwm_hz)?;
        let right = drv8835::Bridge::new(&gpio, right_pins.0, right_pins.1, pwm_hz)?;
        tracing::info!(?pins, ?right_pins, pwm_hz, "drv8835 opened");
        Ok(Self { left, right })
    }
}

#[cfg(feature = "hardware")]
impl linetrace_traits::MotorPair for HardwareMotors {
    fn set(
        &mut self,
        left: f32,
        right: f32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.left.drive(left)?;
        self.right.drive(right)?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        // Release both sides even if the first one fails.
        let l = self.left.release();
        let r = self.right.release();
        l?;
        r?;
        Ok(())
    }
}
