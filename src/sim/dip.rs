//! Bowl dip: a small damped spring for tactile bounce
//!
//! Decoration only. Nothing here feeds back into mass or beam angle.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DipOscillator {
    /// Vertical offset of the bowl (px, positive is down)
    pub dip: f32,
    pub velocity: f32,
}

impl DipOscillator {
    #[inline]
    pub fn apply_impulse(&mut self, magnitude: f32) {
        self.velocity += magnitude;
    }

    pub fn advance(&mut self, dt: f32, tuning: &Tuning) {
        self.velocity += (-tuning.dip_stiffness * self.dip - tuning.dip_damping * self.velocity) * dt;
        self.dip += self.velocity * dt;
    }

    pub fn is_at_rest(&self) -> bool {
        self.dip.abs() < 1e-3 && self.velocity.abs() < 1e-3
    }
}
