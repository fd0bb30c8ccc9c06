use rppal::gpio::{Gpio, OutputPin};

use crate::error::{HwError, Result};

/// One DRV8835 bridge in IN/IN mode: PWM on IN1 drives forward, on IN2 reverse.
pub struct Bridge {
    in1: OutputPin,
    in2: OutputPin,
    pwm_hz: f64,
}

impl Bridge {
    pub fn new(gpio: &Gpio, in1: u8, in2: u8, pwm_hz: f64) -> Result<Self> {
        let open = |pin: u8| -> Result<OutputPin> {
            gpio.get(pin)
                .map(|p| p.into_output_low())
                .map_err(|e| HwError::Gpio(format!("open motor pin {pin}: {e}")))
        };
        Ok(Self {
            in1: open(in1)?,
            in2: open(in2)?,
            pwm_hz,
        })
    }

    /// Drive at `speed` in `[-1, 1]`.
    pub fn drive(&mut self, speed: f32) -> Result<()> {
        let duty = f64::from(speed.abs().min(1.0));
        let (active, idle) = if speed >= 0.0 {
            (&mut self.in1, &mut self.in2)
        } else {
            (&mut self.in2, &mut self.in1)
        };
        idle.clear_pwm().map_err(|e| HwError::Gpio(e.to_string()))?;
        idle.set_low();
        if duty == 0.0 {
            active.clear_pwm().map_err(|e| HwError::Gpio(e.to_string()))?;
            active.set_low();
            return Ok(());
        }
        active
            .set_pwm_frequency(self.pwm_hz, duty)
            .map_err(|e| HwError::Gpio(e.to_string()))
    }

    /// Coast: both inputs low.
    pub fn release(&mut self) -> Result<()> {
        for pin in [&mut self.in1, &mut self.in2] {
            pin.clear_pwm().map_err(|e| HwError::Gpio(e.to_string()))?;
            pin.set_low();
        }
        Ok(())
    }
}
