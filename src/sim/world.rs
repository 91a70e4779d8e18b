//! Rapier-backed physics world
//!
//! Owns the ground and the tower blocks and implements [`TowerPhysics`].
//! Time is fed in through a [`StepClock`] so the simulation can run on a
//! fixed step regardless of frame rate.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rapier3d::prelude::*;

use super::physics::{
    BlockPose, TowerPhysics, canonical_pose, drag_velocity, horizontal_direction, layer_of,
    raise_velocity, template_half_extents, upright_angular_velocity,
};
use crate::consts::*;
use crate::settings::StepMode;

/// Turns real elapsed time into engine steps
#[derive(Debug, Clone)]
pub struct StepClock {
    mode: StepMode,
    /// Nominal step length (seconds)
    step: f32,
    max_substeps: u32,
    accumulator: f32,
    /// No step taken since construction or the last reset
    first: bool,
}

impl StepClock {
    pub fn new(mode: StepMode, step: f32, max_substeps: u32) -> Self {
        Self {
            mode,
            step: step.max(1e-4),
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
            first: true,
        }
    }

    pub fn fixed() -> Self {
        Self::new(StepMode::Fixed, SIM_DT, MAX_SUBSTEPS)
    }

    pub fn mode(&self) -> StepMode {
        self.mode
    }

    /// Nominal step length
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Plan the engine steps for `elapsed` seconds: returns (count, dt per step).
    ///
    /// The first call after construction or [`reset`](Self::reset) always runs one
    /// nominal step, so a fresh world has contacts before anyone queries them.
    /// A non-positive `elapsed` (paused clock) also runs one nominal step.
    pub fn advance(&mut self, elapsed: f32) -> (u32, f32) {
        if self.first || !(elapsed > 0.0) {
            self.first = false;
            return (1, self.step);
        }
        match self.mode {
            StepMode::Fixed => {
                self.accumulator += elapsed;
                let mut count = 0;
                while self.accumulator >= self.step && count < self.max_substeps {
                    self.accumulator -= self.step;
                    count += 1;
                }
                if count == self.max_substeps {
                    // Drop the backlog instead of spiralling
                    self.accumulator = self.accumulator.min(self.step);
                }
                (count, self.step)
            }
            StepMode::WallClock => {
                let dt = elapsed.min(self.step * self.max_substeps as f32);
                (1, dt)
            }
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.first = true;
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::fixed()
    }
}

/// One block's engine handles and shape
#[derive(Debug, Clone, Copy)]
struct BlockBody {
    body: RigidBodyHandle,
    half_extents: Vec3,
}

/// The tower, the ground and the Rapier pipeline that simulates them
pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,

    ground_collider: ColliderHandle,
    blocks: Vec<BlockBody>,
    block_total: usize,
    rng: Pcg32,
    clock: StepClock,
}

impl RapierWorld {
    /// Build a world with `block_count` blocks, shape templates drawn from `seed`
    pub fn new(block_count: usize, seed: u64, clock: StepClock) -> Self {
        let mut world = Self {
            gravity: vector![0.0, GRAVITY, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            ground_collider: ColliderHandle::invalid(),
            blocks: Vec::with_capacity(block_count),
            block_total: block_count,
            rng: Pcg32::seed_from_u64(seed),
            clock,
        };
        world.build();
        world
    }

    /// A standard 54-block tower on a fixed 60 Hz step
    pub fn with_seed(seed: u64) -> Self {
        Self::new(BLOCK_COUNT, seed, StepClock::fixed())
    }

    pub fn clock(&self) -> &StepClock {
        &self.clock
    }

    fn build(&mut self) {
        let ground_body = RigidBodyBuilder::fixed().translation(vector![0.0, GROUND_HEIGHT, 0.0]);
        let ground_handle = self.rigid_body_set.insert(ground_body);
        let ground_collider = ColliderBuilder::halfspace(Vector::y_axis())
            .friction(GROUND_FRICTION)
            .restitution(0.0);
        self.ground_collider = self.collider_set.insert_with_parent(
            ground_collider,
            ground_handle,
            &mut self.rigid_body_set,
        );

        for index in 0..self.block_total {
            let template = self.rng.random_range(0..TEMPLATE_COUNT);
            let half_extents = template_half_extents(template);
            let pose = canonical_pose(index);
            let axis_angle = pose.rotation.to_scaled_axis();
            // Blocks lying along z spin down faster
            let angular_damping = if layer_of(index) % 2 == 0 {
                BLOCK_LINEAR_DAMPING * 2.0
            } else {
                BLOCK_LINEAR_DAMPING * 4.0
            };

            let body = RigidBodyBuilder::dynamic()
                .translation(vector![pose.position.x, pose.position.y, pose.position.z])
                .rotation(vector![axis_angle.x, axis_angle.y, axis_angle.z])
                .linear_damping(BLOCK_LINEAR_DAMPING)
                .angular_damping(angular_damping);
            let handle = self.rigid_body_set.insert(body);

            let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
                .mass(BLOCK_MASS)
                .friction(BLOCK_FRICTION)
                .restitution(0.0);
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);

            self.blocks.push(BlockBody {
                body: handle,
                half_extents,
            });
        }

        log::debug!("Built tower of {} blocks", self.blocks.len());
    }

    fn body(&self, index: usize) -> Option<&RigidBody> {
        let block = self.blocks.get(index)?;
        self.rigid_body_set.get(block.body)
    }

    fn body_mut(&mut self, index: usize) -> Option<&mut RigidBody> {
        let Some(block) = self.blocks.get(index) else {
            log::debug!("Ignoring command for unknown block {}", index);
            return None;
        };
        self.rigid_body_set.get_mut(block.body)
    }

    fn single_step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }
}

#[inline]
fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

impl TowerPhysics for RapierWorld {
    fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn step_simulation(&mut self, elapsed: f32) -> u32 {
        let (count, dt) = self.clock.advance(elapsed);
        for _ in 0..count {
            self.single_step(dt);
        }
        count
    }

    fn pose(&self, index: usize) -> Option<BlockPose> {
        let body = self.body(index)?;
        let rot = body.rotation();
        Some(BlockPose::new(
            to_vec3(body.translation()),
            Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
        ))
    }

    fn half_extents(&self, index: usize) -> Vec3 {
        self.blocks
            .get(index)
            .map(|b| b.half_extents)
            .unwrap_or(Vec3::ZERO)
    }

    fn ground_height(&self) -> f32 {
        GROUND_HEIGHT
    }

    fn is_active(&self, index: usize) -> bool {
        self.body(index).is_some_and(|b| !b.is_sleeping())
    }

    fn has_lateral_contact(&self, index: usize) -> bool {
        let Some(body) = self.body(index) else {
            return false;
        };
        body.colliders().iter().any(|&collider| {
            self.narrow_phase.contact_pairs_with(collider).any(|pair| {
                pair.collider1 != self.ground_collider
                    && pair.collider2 != self.ground_collider
                    && pair.has_any_active_contact
            })
        })
    }

    fn apply_impulse(&mut self, index: usize, direction: Vec3, magnitude: f32) {
        let Some(dir) = horizontal_direction(direction) else {
            return;
        };
        if let Some(body) = self.body_mut(index) {
            body.apply_impulse(to_vector(dir * magnitude), true);
        }
    }

    fn apply_torque(&mut self, index: usize, magnitude: f32) {
        if let Some(body) = self.body_mut(index) {
            body.apply_torque_impulse(vector![0.0, magnitude, 0.0], true);
        }
    }

    fn set_velocity_toward_target(&mut self, index: usize, target: Vec3, grab_offset: Vec3) {
        if let Some(body) = self.body_mut(index) {
            let origin = to_vec3(body.translation());
            let rot = body.rotation();
            let rotation = Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w);
            let angvel = upright_angular_velocity(rotation, to_vec3(body.angvel()));
            body.set_linvel(to_vector(drag_velocity(origin, target, grab_offset)), true);
            body.set_angvel(to_vector(angvel), true);
        }
    }

    fn raise_velocity_toward(&mut self, index: usize, target_height: f32) {
        if let Some(body) = self.body_mut(index) {
            let origin = to_vec3(body.translation());
            body.set_linvel(to_vector(raise_velocity(origin, target_height)), true);
            body.set_angvel(vector![0.0, 0.0, 0.0], true);
        }
    }

    fn stop(&mut self, index: usize) {
        if let Some(body) = self.body_mut(index) {
            body.set_linvel(vector![0.0, 0.0, 0.0], false);
            body.set_angvel(vector![0.0, 0.0, 0.0], false);
        }
    }

    fn recenter(&mut self, index: usize) {
        let step = self.clock.step();
        if let Some(body) = self.body_mut(index) {
            let origin = to_vec3(body.translation());
            let force = Vec3::new(-origin.x, 0.0, -origin.z);
            body.apply_impulse(to_vector(force * step), true);
        }
    }

    fn reset_world(&mut self) {
        self.island_manager = IslandManager::new();
        self.broad_phase = DefaultBroadPhase::new();
        self.narrow_phase = NarrowPhase::new();
        self.rigid_body_set = RigidBodySet::new();
        self.collider_set = ColliderSet::new();
        self.impulse_joint_set = ImpulseJointSet::new();
        self.multibody_joint_set = MultibodyJointSet::new();
        self.ccd_solver = CCDSolver::new();
        self.blocks.clear();
        self.clock.reset();
        self.build();
        log::info!("Physics world rebuilt");
    }
}
