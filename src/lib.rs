//! Block Tower - a physical tower-stacking game
//!
//! Core modules:
//! - `sim`: Game-state layer (turn phases, selection, stability, camera, physics service)
//! - `renderer`: Render contract consumed by an external renderer
//! - `platform`: Normalized input events
//! - `highscores`: In-memory high score table
//! - `settings`: Configuration

pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use settings::{Settings, SettingsError, StepMode};

/// Game configuration constants
pub mod consts {
    /// Nominal physics step (60 Hz), also used for the very first frame
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 10;

    /// Number of blocks in a fresh tower
    pub const BLOCK_COUNT: usize = 54;
    /// Blocks per layer
    pub const BLOCKS_PER_LAYER: usize = 3;

    /// Gameplay height of one layer. Every placement tolerance is a multiple of this.
    pub const LAYER_RISE: f32 = 1.52;
    /// Half of a layer rise, the unit of the placement tolerance bands
    pub const HALF_RISE: f32 = LAYER_RISE / 2.0;

    /// Build spacing between layer centres
    pub const LAYER_SPACING: f32 = 1.5;
    /// Lateral spacing of the three blocks in a layer
    pub const BLOCK_SPACING: f32 = 2.5;
    /// Half extents of the base block template (x = long axis)
    pub const BLOCK_HALF_EXTENTS: [f32; 3] = [3.75, 0.75, 1.25];
    /// Height added per template so neighbouring blocks differ slightly
    pub const TEMPLATE_HEIGHT_STEP: f32 = 0.01;
    /// Number of block shape templates
    pub const TEMPLATE_COUNT: usize = 2;

    /// Block mass
    pub const BLOCK_MASS: f32 = 5.0;
    pub const BLOCK_FRICTION: f32 = 1.0;
    pub const GROUND_FRICTION: f32 = 1.5;
    pub const BLOCK_LINEAR_DAMPING: f32 = 0.15;
    pub const GRAVITY: f32 = -12.0;
    /// World-space height of the ground surface
    pub const GROUND_HEIGHT: f32 = 0.0;

    /// Horizontal half span of the play area
    pub const PLAY_HALF_SPAN: f32 = 60.0;
    /// Blocks beyond this distance on either horizontal axis get pushed back
    pub const STRAY_LIMIT: f32 = PLAY_HALF_SPAN * 1.1;

    /// Gain applied to the cursor gap when dragging a block
    pub const DRAG_GAIN: f32 = 3.0;
    /// Per-axis cap on the dragged gap
    pub const DRAG_MAX_GAP: f32 = 100.0;
    /// Gain applied to the height gap when raising a block
    pub const RAISE_GAIN: f32 = 5.0;
    /// Push/pull impulse magnitude
    pub const PUSH_IMPULSE: f32 = 15.0;
    /// Rotate torque impulse magnitude
    pub const TURN_IMPULSE: f32 = 25.0;

    /// Held block height (above the tower) that ends the raise
    pub const PLACE_CLEARANCE: f32 = 4.0;
    /// Height (above the tower) the raise aims for
    pub const RAISE_TARGET: f32 = 5.0;
    /// The drag plane must sit this far below the eye to grab a block
    pub const GRAB_EYE_CLEARANCE: f32 = 3.0;

    /// Countdown ticks
    pub const CHECK_WAIT_TICKS: u32 = 50;
    pub const MESSAGE_TICKS: u32 = 100;
    pub const GAME_OVER_TICKS: u32 = 200;

    /// Camera defaults
    pub const CAMERA_HEIGHT: f32 = 20.0;
    pub const CAMERA_DISTANCE: f32 = 40.0;
    pub const CAMERA_ANGLE_X: f32 = -45.0;
    pub const CAMERA_ANGLE_Y: f32 = 15.0;
    pub const CAMERA_PLACE_DISTANCE: f32 = 20.0;
    pub const CAMERA_PLACE_ANGLE_Y: f32 = 25.0;
    pub const CAMERA_COLLAPSE_HEIGHT: f32 = 10.0;
    pub const CAMERA_COLLAPSE_MAX_DISTANCE: f32 = 60.0;
    pub const CAMERA_ORBIT_STEP: f32 = 45.0;
}

/// Initial tower-height threshold for a tower of `block_count` blocks
#[inline]
pub fn initial_tower_height(block_count: usize) -> f32 {
    (block_count / consts::BLOCKS_PER_LAYER) as f32 * consts::LAYER_RISE
}

/// Keep an angle in degrees within (-360, 360), returning the correction applied
#[inline]
pub fn wrap_degrees(angle: f32) -> (f32, f32) {
    if angle > 360.0 {
        (angle - 360.0, -360.0)
    } else if angle < -360.0 {
        (angle + 360.0, 360.0)
    } else {
        (angle, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_tower_height() {
        assert!((initial_tower_height(54) - 27.36).abs() < 1e-4);
        assert_eq!(initial_tower_height(0), 0.0);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(370.0), (10.0, -360.0));
        assert_eq!(wrap_degrees(-365.0), (-5.0, 360.0));
        assert_eq!(wrap_degrees(90.0), (90.0, 0.0));
    }
}
