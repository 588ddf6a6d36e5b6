//! Beam rotation: a damped rotational spring toward a mass-driven tilt

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Beam angle in degrees (positive tilts the right bowl down)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Beam {
    pub angle: f32,
    /// Degrees per second
    pub angular_velocity: f32,
}

impl Beam {
    /// Angle the spring pulls toward for a given mass difference
    #[inline]
    pub fn equilibrium(mass_difference: f32, tuning: &Tuning) -> f32 {
        (mass_difference * tuning.torque_gain).clamp(-tuning.max_angle, tuning.max_angle)
    }

    /// Semi-implicit Euler step, then a soft stop at the tilt limit
    pub fn advance(&mut self, mass_difference: f32, dt: f32, tuning: &Tuning) {
        let target = Self::equilibrium(mass_difference, tuning);
        let acc = (target - self.angle) * tuning.beam_stiffness
            - tuning.beam_damping * self.angular_velocity;
        self.angular_velocity += acc * dt;
        self.angle += self.angular_velocity * dt;

        if self.angle.abs() > tuning.max_angle {
            self.angle = self.angle.signum() * tuning.max_angle;
            self.angular_velocity *= tuning.soft_stop;
        }
    }
}
