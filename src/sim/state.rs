//! Simulation state owned by the frame orchestrator
//!
//! Everything the per-tick step mutates lives in [`SimulationState`]. The
//! render side only ever sees an immutable [`FrameSnapshot`] built from it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::beam::Beam;
use super::dip::DipOscillator;
use super::mass::{MassModel, Side};
use super::panel::{PanelPhase, PanelUnit};
use crate::answers::{AnswerId, AnswerTile};
use crate::layout::{GroupBadge, LayoutSlot};

/// Physical state of the scale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub masses: MassModel,
    pub beam: Beam,
    pub left_dip: DipOscillator,
    pub right_dip: DipOscillator,
    /// Panels in the left bowl (falling, settled and fading), in arrival order
    pub panels: Vec<PanelUnit>,
    pub settled_panel_count: usize,
    /// Tick counter
    pub time_ticks: u64,
    next_id: u32,
}

impl SimulationState {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn next_panel_id(&mut self) -> u32 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    pub fn dip_mut(&mut self, side: Side) -> &mut DipOscillator {
        match side {
            Side::Left => &mut self.left_dip,
            Side::Right => &mut self.right_dip,
        }
    }

    /// Settled plus still-arriving panels
    pub fn live_panel_count(&self) -> usize {
        self.panels.iter().filter(|p| p.is_live()).count()
    }

    pub fn recount_settled(&mut self) {
        self.settled_panel_count = self
            .panels
            .iter()
            .filter(|p| p.phase == PanelPhase::Settled)
            .count();
    }
}

/// A panel as drawn in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelSlot {
    pub id: u32,
    pub position: Vec2,
    pub phase: PanelPhase,
    pub opacity: f32,
}

/// An answer tile as drawn in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSlot {
    pub answer_id: AnswerId,
    pub question_index: u32,
    pub image_ref: Option<String>,
    pub energy_value: f32,
    pub slot: LayoutSlot,
}

impl TileSlot {
    pub fn new(tile: &AnswerTile, slot: LayoutSlot) -> Self {
        Self {
            answer_id: tile.answer_id,
            question_index: tile.question_index,
            image_ref: tile.image_ref.clone(),
            energy_value: tile.energy_value,
            slot,
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    /// Degrees, positive tilts the right bowl down
    pub beam_angle: f32,
    pub equilibrium_angle: f32,
    pub left_bowl_offset: f32,
    pub right_bowl_offset: f32,
    /// Bowl anchors in scene space, dip included
    pub left_bowl: Vec2,
    pub right_bowl: Vec2,
    pub left_slots: Vec<PanelSlot>,
    pub right_slots: Vec<TileSlot>,
    pub badges: Vec<GroupBadge>,
    pub settled_panel_count: usize,
    pub left_mass: f32,
    pub right_mass: f32,
    /// Display preferences the renderer should honor
    pub show_energy_values: bool,
    pub show_equilibrium: bool,
}

/// Consumer of frame snapshots
pub trait RenderSink {
    fn present(&mut self, frame: &FrameSnapshot);
}

impl<F: FnMut(&FrameSnapshot)> RenderSink for F {
    fn present(&mut self, frame: &FrameSnapshot) {
        self(frame)
    }
}

/// Edge-triggered notifications for the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ScaleEvent {
    AnswerAdded(AnswerTile),
    /// The user asked to remove a tile; the questionnaire decides
    RemovalRequested(AnswerId),
    DropRejected(crate::error::Rejection),
    PanelSettled(u32),
    PanelRemoved(u32),
}
