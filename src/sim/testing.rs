//! Scripted physics world for state-machine tests
//!
//! Blocks stay exactly where the test puts them. Every command is recorded so
//! tests can assert on what the state machine asked the engine to do.

use glam::Vec3;

use super::physics::{BlockPose, TowerPhysics, canonical_pose, template_half_extents};
use super::selection::{PickHit, Picker, Ray, tag_for_block};

/// Picker that reports whatever the test scripted, for any ray
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedPicker {
    pub hit: Option<PickHit>,
}

impl ScriptedPicker {
    pub fn block(index: usize, point: Vec3) -> Self {
        Self {
            hit: Some(PickHit {
                point,
                tag: tag_for_block(index),
            }),
        }
    }
}

impl Picker for ScriptedPicker {
    fn pick(&self, _ray: &Ray, _physics: &dyn TowerPhysics) -> Option<PickHit> {
        self.hit
    }
}

/// A command received by the scripted world
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Impulse { index: usize, direction: Vec3, magnitude: f32 },
    Torque { index: usize, magnitude: f32 },
    Drag { index: usize, target: Vec3, grab_offset: Vec3 },
    Raise { index: usize, height: f32 },
    Stop { index: usize },
    Recenter { index: usize },
}

#[derive(Debug, Clone)]
pub struct ScriptedBlock {
    pub pose: BlockPose,
    pub active: bool,
    pub contact: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedWorld {
    pub blocks: Vec<ScriptedBlock>,
    pub commands: Vec<Command>,
    pub steps: u32,
    pub resets: u32,
}

impl ScriptedWorld {
    /// An intact, settled tower in canonical poses
    pub fn tower(block_count: usize) -> Self {
        Self {
            blocks: (0..block_count)
                .map(|i| ScriptedBlock {
                    pose: canonical_pose(i),
                    active: false,
                    contact: true,
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn set_all_contacts(&mut self, contact: bool) {
        for block in &mut self.blocks {
            block.contact = contact;
        }
    }

    pub fn set_height(&mut self, index: usize, height: f32) {
        self.blocks[index].pose.position.y = height;
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    fn command(&mut self, index: usize, command: Command) {
        if index < self.blocks.len() {
            self.commands.push(command);
        }
    }
}

impl TowerPhysics for ScriptedWorld {
    fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn step_simulation(&mut self, _elapsed: f32) -> u32 {
        self.steps += 1;
        1
    }

    fn pose(&self, index: usize) -> Option<BlockPose> {
        self.blocks.get(index).map(|b| b.pose)
    }

    fn half_extents(&self, index: usize) -> Vec3 {
        if index < self.blocks.len() {
            template_half_extents(0)
        } else {
            Vec3::ZERO
        }
    }

    fn ground_height(&self) -> f32 {
        0.0
    }

    fn is_active(&self, index: usize) -> bool {
        self.blocks.get(index).is_some_and(|b| b.active)
    }

    fn has_lateral_contact(&self, index: usize) -> bool {
        self.blocks.get(index).is_some_and(|b| b.contact)
    }

    fn apply_impulse(&mut self, index: usize, direction: Vec3, magnitude: f32) {
        self.command(index, Command::Impulse { index, direction, magnitude });
    }

    fn apply_torque(&mut self, index: usize, magnitude: f32) {
        self.command(index, Command::Torque { index, magnitude });
    }

    fn set_velocity_toward_target(&mut self, index: usize, target: Vec3, grab_offset: Vec3) {
        self.command(index, Command::Drag { index, target, grab_offset });
    }

    fn raise_velocity_toward(&mut self, index: usize, height: f32) {
        self.command(index, Command::Raise { index, height });
    }

    fn stop(&mut self, index: usize) {
        self.command(index, Command::Stop { index });
    }

    fn recenter(&mut self, index: usize) {
        self.command(index, Command::Recenter { index });
    }

    fn reset_world(&mut self) {
        let count = self.blocks.len();
        *self = Self {
            resets: self.resets + 1,
            ..Self::tower(count)
        };
    }
}
