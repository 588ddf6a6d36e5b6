//! Frame-driven simulation
//!
//! Everything that moves lives here:
//! - Variable timestep, with rates expressed per second
//! - No rendering or platform dependencies
//! - Stable iteration order (panels in arrival order)

pub mod beam;
pub mod dip;
pub mod mass;
pub mod panel;
pub mod schedule;
pub mod state;
pub mod tick;

pub use beam::Beam;
pub use dip::DipOscillator;
pub use mass::{MassModel, MassTween, Side};
pub use panel::{PanelEvent, PanelPhase, PanelUnit};
pub use schedule::{PanelTask, Scheduler};
pub use state::{FrameSnapshot, PanelSlot, RenderSink, ScaleEvent, SimulationState, TileSlot};
pub use tick::{ExternalUpdate, Scale};
