//! Falling solar panels
//!
//! Each unit runs a one-shot state machine: it drops from above the bowl,
//! bounces once off the rim line, and pins itself there when gravity brings it
//! back down. Removal is a fade with no physics.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::RIM_Y;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelPhase {
    /// Dropping toward the rim line
    Falling,
    /// Rebounded once, on its way back down
    Bounced,
    /// Resting on the rim, owned by the layout
    Settled,
    /// Being removed
    Fading,
}

/// Transition reported by a single advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// First contact with the rim line
    Landed,
    Settled,
    /// Fade finished; the unit can be dropped
    Faded,
}

/// One panel and its animator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelUnit {
    pub id: u32,
    /// Relative to the left bowl anchor
    pub position: Vec2,
    /// Vertical velocity (px/s, positive is down)
    pub velocity: f32,
    pub phase: PanelPhase,
    pub opacity: f32,
    /// Seconds spent in the air
    pub airtime: f32,
}

impl PanelUnit {
    /// A new unit above the bowl, at rest
    pub fn spawn(id: u32, tuning: &Tuning) -> Self {
        Self {
            id,
            position: Vec2::new(0.0, RIM_Y + tuning.spawn_offset),
            velocity: 0.0,
            phase: PanelPhase::Falling,
            opacity: 1.0,
            airtime: 0.0,
        }
    }

    /// A unit that is already resting (resync, reduced motion)
    pub fn settled(id: u32) -> Self {
        Self {
            id,
            position: Vec2::new(0.0, RIM_Y),
            velocity: 0.0,
            phase: PanelPhase::Settled,
            opacity: 1.0,
            airtime: 0.0,
        }
    }

    #[inline]
    pub fn is_in_flight(&self) -> bool {
        matches!(self.phase, PanelPhase::Falling | PanelPhase::Bounced)
    }

    /// Counts toward the live panel total (settled or still arriving)
    #[inline]
    pub fn is_live(&self) -> bool {
        self.phase != PanelPhase::Fading
    }

    /// Start the removal fade from whatever phase the unit is in
    pub fn begin_fade(&mut self) {
        self.phase = PanelPhase::Fading;
        self.velocity = 0.0;
    }

    pub fn advance(&mut self, dt: f32, tuning: &Tuning) -> Option<PanelEvent> {
        match self.phase {
            PanelPhase::Settled => None,
            PanelPhase::Fading => {
                if self.opacity <= 0.0 {
                    return None;
                }
                self.opacity = (self.opacity - tuning.fade_rate * dt).max(0.0);
                (self.opacity <= 0.0).then_some(PanelEvent::Faded)
            }
            PanelPhase::Falling | PanelPhase::Bounced => {
                self.airtime += dt;
                if self.airtime >= tuning.max_airtime {
                    self.pin();
                    return Some(PanelEvent::Settled);
                }

                self.velocity += tuning.gravity * dt;
                self.position.y += self.velocity * dt;

                match self.phase {
                    PanelPhase::Falling if self.position.y >= RIM_Y => {
                        self.position.y = RIM_Y;
                        self.velocity = -self.velocity * tuning.restitution;
                        self.phase = PanelPhase::Bounced;
                        Some(PanelEvent::Landed)
                    }
                    PanelPhase::Bounced if self.position.y > RIM_Y => {
                        self.pin();
                        Some(PanelEvent::Settled)
                    }
                    _ => None,
                }
            }
        }
    }

    fn pin(&mut self) {
        self.position.y = RIM_Y;
        self.velocity = 0.0;
        self.phase = PanelPhase::Settled;
    }
}
