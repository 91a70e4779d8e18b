//! Game-state layer
//!
//! Everything between the rigid-body engine and the renderer lives here:
//! - Turn phases and their entry table
//! - Cursor picking and drag planes
//! - Stability monitoring
//! - The eased orbit camera
//! - The physics service contract and its Rapier implementation

pub mod camera;
pub mod physics;
pub mod selection;
pub mod stability;
pub mod state;
#[cfg(test)]
pub(crate) mod testing;
pub mod tick;
pub mod transition;
pub mod world;

pub use camera::{OrbitCamera, OrbitParams};
pub use physics::{BlockPose, TowerPhysics, canonical_pose, layer_of};
pub use selection::{
    BoundsPicker, PickHit, Picker, Ray, Resolution, SelectionResolver, Viewport, block_from_tag,
    cursor_ray, project, tag_for_block, unproject,
};
pub use stability::StabilityReport;
pub use state::{GameEvent, GamePhase, GameSession, RejectReason, Selection};
pub use tick::{TickInput, tick};
pub use transition::{Intent, Transition};
pub use world::{RapierWorld, StepClock};
