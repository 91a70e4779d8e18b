//! Per-block instance data for GPU upload

use bytemuck::{Pod, Zeroable};

use crate::sim::physics::BlockPose;
use crate::sim::selection::tag_for_block;

/// How a block should be highlighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Highlight {
    None = 0,
    /// Under the cursor while choosing
    Candidate = 1,
    /// The block being manipulated
    Held = 2,
    /// Held while placing; the outline extends down to show where it will land
    Placing = 3,
}

impl Highlight {
    /// Outline colour, or `None` for no highlight
    pub fn color(&self) -> Option<[f32; 4]> {
        match self {
            Highlight::None => None,
            Highlight::Candidate => Some(colors::CANDIDATE),
            Highlight::Held | Highlight::Placing => Some(colors::HELD),
        }
    }

    /// Extra outline height below the block, in multiples of its half height
    pub fn extension(&self) -> f32 {
        if *self == Highlight::Placing { 3.0 } else { 0.0 }
    }
}

/// One block as the renderer draws it
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BlockInstance {
    pub translation: [f32; 3],
    /// Object tag the renderer writes for picking
    pub tag: u32,
    /// Quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    pub half_extents: [f32; 3],
    /// [`Highlight`] as u32
    pub highlight: u32,
}

impl BlockInstance {
    pub fn new(index: usize, pose: &BlockPose, half_extents: glam::Vec3, highlight: Highlight) -> Self {
        Self {
            translation: pose.position.to_array(),
            tag: tag_for_block(index),
            rotation: pose.rotation.to_array(),
            half_extents: half_extents.to_array(),
            highlight: highlight as u32,
        }
    }
}

/// Colors for scene elements
pub mod colors {
    pub const WOOD: [f32; 4] = [0.90, 0.80, 0.57, 1.0];
    pub const EDGE: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    pub const CANDIDATE: [f32; 4] = [1.0, 0.0, 0.0, 0.4];
    pub const HELD: [f32; 4] = [0.0, 1.0, 0.0, 0.4];
    pub const GROUND: [f32; 4] = [0.8, 0.8, 0.8, 1.0];
    pub const BACKGROUND: [f32; 4] = [0.0, 0.5, 1.0, 1.0];
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn test_instance_layout_is_tight() {
        assert_eq!(std::mem::size_of::<BlockInstance>(), 48);
        let instance = BlockInstance::new(
            3,
            &BlockPose::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY),
            Vec3::new(3.75, 0.75, 1.25),
            Highlight::Held,
        );
        let bytes: &[u8] = bytemuck::bytes_of(&instance);
        assert_eq!(bytes.len(), 48);
        assert_eq!(instance.tag, 5);
        assert_eq!(instance.rotation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_highlight_styles() {
        assert_eq!(Highlight::None.color(), None);
        assert_eq!(Highlight::Candidate.color(), Some(colors::CANDIDATE));
        assert_eq!(Highlight::Placing.color(), Some(colors::HELD));
        assert_eq!(Highlight::Placing.extension(), 3.0);
        assert_eq!(Highlight::Held.extension(), 0.0);
    }
}
