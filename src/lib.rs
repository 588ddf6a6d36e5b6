//! Energy Scale - balance scale simulation for the kids questionnaire
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (masses, beam, bowl dips, falling panels)
//! - `layout`: Deterministic tile and panel placement
//! - `answers`: Answer tiles and external input shaping
//! - `tuning`: Data-driven physics constants
//! - `settings`: User preferences
//! - `platform`: Browser bindings

pub mod answers;
pub mod error;
pub mod layout;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use answers::{AnswerId, AnswerInput, AnswerTile, DropPayload, SelectionRule};
pub use error::{Rejection, TuningError};
pub use layout::{Layout, LayoutSlot, ViewportClass};
pub use settings::Settings;
pub use sim::{ExternalUpdate, FrameSnapshot, RenderSink, Scale, ScaleEvent, Side};
pub use tuning::Tuning;

use glam::Vec2;

/// Scene geometry constants
///
/// Coordinates are in scene units with y pointing down. Bowl content
/// (tiles, panels) is expressed relative to the bowl anchor.
pub mod consts {
    /// Frame rate the default tuning was authored against
    pub const REFERENCE_HZ: f32 = 60.0;
    /// Largest step accepted by a single tick (seconds)
    pub const MAX_DT: f32 = 0.1;
    /// Largest spring integration step; longer ticks are split
    pub const SIM_DT: f32 = 1.0 / REFERENCE_HZ;
    /// Cap on spring substeps per tick
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Beam pivot in scene space
    pub const PIVOT_X: f32 = 550.0;
    pub const PIVOT_Y: f32 = 200.0;
    /// Distance from pivot to each bowl anchor
    pub const BEAM_HALF_LEN: f32 = 286.0;

    /// Resting line of bowl content, relative to the bowl anchor
    pub const RIM_Y: f32 = -70.0;
    pub const RIM_W: f32 = 220.0;
    pub const GRID_MARGIN: f32 = 8.0;

    /// Answer tiles
    pub const TILE_W: f32 = 60.0;
    pub const TILE_H: f32 = 50.0;
    pub const TILE_GAP: f32 = 4.0;
    pub const TILE_COLS: usize = 3;

    /// Solar panels
    pub const PANEL_W: f32 = 28.0;
    pub const PANEL_H: f32 = 18.0;
    pub const PANEL_GAP: f32 = 4.0;

    /// kWh represented by one panel
    pub const PANEL_UNIT: f32 = 10.0;
    /// Most panels the left bowl will hold
    pub const MAX_PANELS: usize = 500;
    /// Scale from energy to beam mass
    pub const ENERGY_TO_MASS: f32 = 7.0;

    /// Energy assumed for an answer the calculator has not priced yet
    pub const DEFAULT_ENERGY: f32 = 1.0;

    /// Viewport breakpoints (inclusive, CSS px)
    pub const NARROW_MAX_WIDTH: f32 = 537.0;
    pub const VERY_NARROW_MAX_WIDTH: f32 = 375.0;
}

/// Bowl anchor for a beam angle given in degrees
///
/// `sign` is -1 for the left bowl and +1 for the right.
#[inline]
pub fn bowl_anchor(angle_deg: f32, sign: f32, dip: f32) -> Vec2 {
    use consts::*;
    let rad = angle_deg.to_radians();
    Vec2::new(
        PIVOT_X + sign * BEAM_HALF_LEN * rad.cos(),
        PIVOT_Y + sign * BEAM_HALF_LEN * rad.sin() + dip,
    )
}
