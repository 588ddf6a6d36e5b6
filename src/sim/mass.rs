//! Smoothed bowl masses
//!
//! External energy numbers arrive in jumps; the beam only ever sees the
//! tweened `current` value.

use serde::{Deserialize, Serialize};

/// Which side of the beam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Renewable credit (solar panels)
    Left,
    /// Energy cost (answer tiles)
    Right,
}

impl Side {
    /// -1 for left, +1 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// One tweened scalar
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MassTween {
    pub current: f32,
    pub target: f32,
}

impl MassTween {
    /// Move `current` toward `target` by the fraction a rate covers in `dt`
    pub fn advance(&mut self, dt: f32, rate: f32) {
        let alpha = 1.0 - (-rate * dt).exp();
        self.current += (self.target - self.current) * alpha;
    }

    #[inline]
    pub fn error(&self) -> f32 {
        (self.target - self.current).abs()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassModel {
    pub left: MassTween,
    pub right: MassTween,
}

impl MassModel {
    /// Set the steady-state mass for one side (clamped to non-negative)
    pub fn set_target(&mut self, side: Side, value: f32) {
        let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        self.side_mut(side).target = value;
    }

    pub fn advance(&mut self, dt: f32, rate: f32) {
        self.left.advance(dt, rate);
        self.right.advance(dt, rate);
    }

    pub fn side(&self, side: Side) -> &MassTween {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut MassTween {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Right minus left, the quantity that tilts the beam
    #[inline]
    pub fn difference(&self) -> f32 {
        self.right.current - self.left.current
    }
}
