//! Stability monitor
//!
//! Decides each tick whether the tower still stands. The tower stands while
//! some block near the top still touches another block. A block has fallen
//! when it has come to rest touching no other block.

use super::physics::TowerPhysics;
use crate::consts::*;

/// Outcome of one stability pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StabilityReport {
    /// Some block near the top of the tower is still in contact
    pub standing: bool,
    /// First block found lying loose, if any
    pub fallen: Option<usize>,
    /// Blocks outside the play area
    pub strays: Vec<usize>,
}

impl StabilityReport {
    pub fn collapsed(&self) -> bool {
        !self.standing || self.fallen.is_some()
    }
}

/// Inspect the world. `focus` is exempt from the fallen check.
pub fn evaluate(
    physics: &dyn TowerPhysics,
    tower_height: f32,
    focus: Option<usize>,
) -> StabilityReport {
    let mut report = StabilityReport::default();
    let top_band = tower_height - LAYER_RISE;

    for index in 0..physics.block_count() {
        let Some(pose) = physics.pose(index) else {
            continue;
        };

        if !report.standing && pose.height() > top_band && physics.has_lateral_contact(index) {
            report.standing = true;
        }

        if report.fallen.is_none()
            && Some(index) != focus
            && !physics.is_active(index)
            && !physics.has_lateral_contact(index)
        {
            report.fallen = Some(index);
        }

        if pose.position.x.abs() > STRAY_LIMIT || pose.position.z.abs() > STRAY_LIMIT {
            report.strays.push(index);
        }
    }

    report
}
