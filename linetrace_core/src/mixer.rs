//! Differential steering.

/// Normalized left/right wheel command, each side in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorCommand {
    pub left: f32,
    pub right: f32,
}

impl MotorCommand {
    pub const STOP: Self = Self {
        left: 0.0,
        right: 0.0,
    };

    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    pub fn is_stop(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }

    pub fn scaled(self, k: f32) -> Self {
        Self::new(self.left * k, self.right * k)
    }

    /// Final clamp before the actuator: NaN becomes 0, magnitudes are bounded by `max`.
    pub fn limited(self, max: f32) -> Self {
        let clamp = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(-max, max) };
        Self::new(clamp(self.left), clamp(self.right))
    }
}

/// `base ∓ gain·steer`, each side clamped to `[-1, 1]`.
///
/// Positive steer (line to the right) slows the left wheel and speeds up the right.
pub fn mix_to_motors(base: f32, steer: f32, gain: f32) -> MotorCommand {
    let diff = gain * steer;
    MotorCommand::new((base - diff).clamp(-1.0, 1.0), (base + diff).clamp(-1.0, 1.0))
}

#[derive(Debug, Clone, Copy)]
pub struct Mixer {
    pub base_speed: f32,
    pub gain: f32,
}

impl Mixer {
    pub fn mix(&self, steer: f32) -> MotorCommand {
        mix_to_motors(self.base_speed, steer, self.gain)
    }
}
