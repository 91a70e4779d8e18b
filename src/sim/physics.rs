//! Physics world service contract
//!
//! The game-state layer never talks to a rigid-body engine directly. It goes
//! through [`TowerPhysics`], which keeps the state machine testable against a
//! scripted world and lets [`super::world::RapierWorld`] do the real work.
//!
//! Every operation is total: a block index that does not exist turns a
//! mutation into a no-op and a query into a benign default.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Position and orientation of a block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl BlockPose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Height of the block origin
    #[inline]
    pub fn height(&self) -> f32 {
        self.position.y
    }

    /// Transform a world-space point into block space
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }
}

impl Default for BlockPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Layer a block belongs to, from its place in the build order
#[inline]
pub fn layer_of(index: usize) -> usize {
    index / BLOCKS_PER_LAYER
}

/// Canonical build pose of block `index`.
///
/// Layers alternate between blocks lying along x (rotation 0) and blocks
/// lying along z (rotated 90° about y).
pub fn canonical_pose(index: usize) -> BlockPose {
    let layer = layer_of(index);
    let slot = (index % BLOCKS_PER_LAYER) as f32 - 1.0;
    let y = BLOCK_HALF_EXTENTS[1] + layer as f32 * LAYER_SPACING;

    if layer % 2 == 0 {
        BlockPose::new(Vec3::new(0.0, y, BLOCK_SPACING * slot), Quat::IDENTITY)
    } else {
        BlockPose::new(
            Vec3::new(BLOCK_SPACING * slot, y, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        )
    }
}

/// Half extents of shape template `template`
pub fn template_half_extents(template: usize) -> Vec3 {
    let [x, y, z] = BLOCK_HALF_EXTENTS;
    Vec3::new(x, y + TEMPLATE_HEIGHT_STEP * template as f32, z)
}

/// The service the turn state machine drives.
pub trait TowerPhysics {
    /// Number of blocks in the world
    fn block_count(&self) -> usize;

    /// Advance the simulation by `elapsed` seconds of real time.
    ///
    /// Returns the number of engine steps taken.
    fn step_simulation(&mut self, elapsed: f32) -> u32;

    /// Current pose of a block
    fn pose(&self, index: usize) -> Option<BlockPose>;

    /// Half extents of a block's shape (zero for an invalid index)
    fn half_extents(&self, index: usize) -> Vec3;

    /// World-space height of the ground surface
    fn ground_height(&self) -> f32;

    /// Whether the engine still considers the block to be moving
    fn is_active(&self, index: usize) -> bool;

    /// Whether the block touches another block (ground contacts don't count)
    fn has_lateral_contact(&self, index: usize) -> bool;

    /// Wake the block and apply a central impulse along the horizontal part of `direction`
    fn apply_impulse(&mut self, index: usize, direction: Vec3, magnitude: f32);

    /// Wake the block and apply a torque impulse about the vertical axis
    fn apply_torque(&mut self, index: usize, magnitude: f32);

    /// Steer the block so that `origin + grab_offset` moves toward `target`,
    /// while turning it back upright
    fn set_velocity_toward_target(&mut self, index: usize, target: Vec3, grab_offset: Vec3);

    /// Steer the block vertically toward `target_height` and kill its spin
    fn raise_velocity_toward(&mut self, index: usize, target_height: f32);

    /// Zero linear and angular velocity
    fn stop(&mut self, index: usize);

    /// Nudge a stray block back toward the vertical axis through the origin
    fn recenter(&mut self, index: usize);

    /// Tear down and rebuild the ground and every block in its canonical pose
    fn reset_world(&mut self);

    /// Poses of all blocks, in index order
    fn poses(&self) -> Vec<BlockPose> {
        (0..self.block_count())
            .map(|i| self.pose(i).unwrap_or_default())
            .collect()
    }

    /// True while any block in the world is moving
    fn any_active(&self) -> bool {
        (0..self.block_count()).any(|i| self.is_active(i))
    }
}

/// Linear velocity that drags a block toward a target point.
///
/// Shared by physics backends so they all steer the same way.
pub fn drag_velocity(origin: Vec3, target: Vec3, grab_offset: Vec3) -> Vec3 {
    let gap = target - origin - grab_offset;
    gap.clamp(Vec3::splat(-DRAG_MAX_GAP), Vec3::splat(DRAG_MAX_GAP)) * DRAG_GAIN
}

/// Angular velocity that rights a tilted block, halving its spin about y
pub fn upright_angular_velocity(rotation: Quat, angular_velocity: Vec3) -> Vec3 {
    let tilt = rotation.to_scaled_axis();
    Vec3::new(-tilt.x, angular_velocity.y * 0.5, -tilt.z)
}

/// Linear velocity that raises a block toward a height
pub fn raise_velocity(origin: Vec3, target_height: f32) -> Vec3 {
    Vec3::new(0.0, (target_height - origin.y) * RAISE_GAIN, 0.0)
}

/// Horizontal unit direction for a push, or `None` if there is no horizontal component
pub fn horizontal_direction(direction: Vec3) -> Option<Vec3> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    let len = flat.length();
    (len > f32::EPSILON).then(|| flat / len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_layers_alternate() {
        let a = canonical_pose(0);
        let b = canonical_pose(3);
        assert_eq!(a.rotation, Quat::IDENTITY);
        assert!((b.rotation.to_scaled_axis().y - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!((b.position.y - a.position.y - LAYER_SPACING).abs() < 1e-5);
    }

    #[test]
    fn test_canonical_slots() {
        assert_eq!(canonical_pose(0).position, Vec3::new(0.0, 0.75, -2.5));
        assert_eq!(canonical_pose(1).position, Vec3::new(0.0, 0.75, 0.0));
        assert_eq!(canonical_pose(5).position, Vec3::new(2.5, 2.25, 0.0));
        assert_eq!(layer_of(53), 17);
    }

    #[test]
    fn test_drag_velocity_clamps_per_axis() {
        let v = drag_velocity(Vec3::ZERO, Vec3::new(500.0, -1.0, 0.0), Vec3::ZERO);
        assert_eq!(v, Vec3::new(DRAG_MAX_GAP * DRAG_GAIN, -DRAG_GAIN, 0.0));
    }

    #[test]
    fn test_drag_velocity_respects_grab_offset() {
        let v = drag_velocity(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(v, Vec3::ZERO);
    }

    #[test]
    fn test_upright_cancels_tilt_and_halves_spin() {
        let tilted = Quat::from_rotation_x(0.2);
        let w = upright_angular_velocity(tilted, Vec3::new(0.0, 2.0, 0.0));
        assert!((w.x + 0.2).abs() < 1e-5);
        assert!((w.y - 1.0).abs() < 1e-5);
        assert!(w.z.abs() < 1e-5);
    }

    #[test]
    fn test_horizontal_direction() {
        assert_eq!(horizontal_direction(Vec3::new(0.0, 3.0, 0.0)), None);
        let d = horizontal_direction(Vec3::new(3.0, 9.0, 4.0)).unwrap();
        assert!((d - Vec3::new(0.6, 0.0, 0.8)).length() < 1e-5);
    }
}
