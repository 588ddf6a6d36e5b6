//! Data-driven physics constants
//!
//! Every rate is per second so the integrators stay correct when the host
//! ticks at something other than 60 Hz. The defaults are the hand-tuned
//! per-frame values of the scale, converted at [`REFERENCE_HZ`].

use serde::{Deserialize, Serialize};

use crate::consts::{REFERENCE_HZ, SIM_DT};
use crate::error::TuningError;

const HZ: f32 = REFERENCE_HZ;
const HZ2: f32 = REFERENCE_HZ * REFERENCE_HZ;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Masses ===
    /// Exponential approach rate of current mass toward target (1/s)
    pub mass_rate: f32,

    // === Beam ===
    /// Degrees of equilibrium tilt per unit of mass difference
    pub torque_gain: f32,
    /// Maximum beam tilt (degrees)
    pub max_angle: f32,
    /// Spring stiffness toward equilibrium (1/s²)
    pub beam_stiffness: f32,
    /// Angular damping (1/s)
    pub beam_damping: f32,
    /// Velocity multiplier applied when the beam hits its tilt limit
    pub soft_stop: f32,

    // === Bowl dips ===
    pub dip_stiffness: f32,
    pub dip_damping: f32,
    /// Right bowl kick when the answer set changes (px/s)
    pub answer_impulse: f32,
    /// Left bowl kick when a panel first touches the rim (px/s)
    pub landing_impulse: f32,
    /// Left bowl kick when a panel settles (px/s)
    pub settle_impulse: f32,
    /// Left bowl kick when a panel finishes fading out (px/s)
    pub removal_impulse: f32,

    // === Falling panels ===
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Fraction of speed kept after the single bounce
    pub restitution: f32,
    /// Spawn height relative to the rim line (negative is above)
    pub spawn_offset: f32,
    /// Airtime after which a panel is pinned regardless of its phase (s)
    pub max_airtime: f32,
    /// Opacity lost per second while fading out
    pub fade_rate: f32,

    // === Staggering ===
    /// Delay before a panel target change starts animating (s)
    pub reaction_delay: f32,
    /// Gap between consecutive spawns (s)
    pub spawn_stagger: f32,
    /// Gap between consecutive removals (s)
    pub retire_stagger: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            mass_rate: -(0.95_f32.ln()) * HZ,

            torque_gain: 0.15,
            max_angle: 45.0,
            beam_stiffness: 0.00005 * HZ2,
            beam_damping: 0.008 * HZ,
            soft_stop: 0.8,

            dip_stiffness: 0.04 * HZ2,
            dip_damping: 0.4 * HZ,
            answer_impulse: 8.0 * HZ,
            landing_impulse: 8.0 * HZ,
            settle_impulse: 4.0 * HZ,
            removal_impulse: -4.0 * HZ,

            gravity: 0.5 * HZ2,
            restitution: 0.6,
            spawn_offset: -180.0,
            max_airtime: 1.5,
            fade_rate: 0.05 * HZ,

            reaction_delay: 1.5,
            spawn_stagger: 0.5,
            retire_stagger: 0.7,
        }
    }
}

impl Tuning {
    /// Parse overrides from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validated()
    }

    /// Reject values that would make the integrators diverge or stall
    pub fn validated(self) -> Result<Self, TuningError> {
        let non_negative = [
            ("mass_rate", self.mass_rate),
            ("torque_gain", self.torque_gain),
            ("max_angle", self.max_angle),
            ("beam_stiffness", self.beam_stiffness),
            ("beam_damping", self.beam_damping),
            ("dip_stiffness", self.dip_stiffness),
            ("dip_damping", self.dip_damping),
            ("gravity", self.gravity),
            ("max_airtime", self.max_airtime),
            ("fade_rate", self.fade_rate),
            ("reaction_delay", self.reaction_delay),
            ("spawn_stagger", self.spawn_stagger),
            ("retire_stagger", self.retire_stagger),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                log::warn!("Rejecting tuning {field} = {value}");
                return Err(TuningError::Invalid { field, value });
            }
        }

        let unit_interval = [
            ("soft_stop", self.soft_stop),
            ("restitution", self.restitution),
        ];
        for (field, value) in unit_interval {
            if !(0.0..=1.0).contains(&value) {
                log::warn!("Rejecting tuning {field} = {value}");
                return Err(TuningError::Invalid { field, value });
            }
        }

        // Semi-implicit Euler diverges once a substep gets this stiff
        for (field, damping, stiffness) in [
            ("beam", self.beam_damping, self.beam_stiffness),
            ("dip", self.dip_damping, self.dip_stiffness),
        ] {
            if damping * SIM_DT >= 2.0 || stiffness * SIM_DT * SIM_DT >= 4.0 {
                log::warn!("Rejecting tuning {field} spring: unstable at {SIM_DT} s");
                return Err(TuningError::Invalid {
                    field,
                    value: damping.max(stiffness),
                });
            }
        }

        for (field, value) in [
            ("answer_impulse", self.answer_impulse),
            ("landing_impulse", self.landing_impulse),
            ("settle_impulse", self.settle_impulse),
            ("removal_impulse", self.removal_impulse),
            ("spawn_offset", self.spawn_offset),
        ] {
            if !value.is_finite() {
                return Err(TuningError::Invalid { field, value });
            }
        }

        Ok(self)
    }
}
