//! Phase entry table
//!
//! Entering a phase is a pure function of the phase, the tower height and the
//! countdown. It returns the intents the session must carry out, so the table
//! can be checked without a physics world.

use super::state::GamePhase;
use crate::consts::*;

/// A side effect of entering a phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    CameraHeight(f32),
    CameraDistance(f32),
    CameraAngleY(f32),
    /// Forget the active block
    ClearActive,
    /// Grab offset = cursor point - active block origin
    CaptureGrabOffset,
    /// Zero the vertical grab offset
    FlattenGrabOffset,
    /// Zero the horizontal grab offset so the block centres over the tower
    CenterGrabOffset,
    /// Move the horizontal drag plane
    PlaneHeight(f32),
}

/// Phase to enter plus everything that comes with it
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub phase: GamePhase,
    pub countdown: u32,
    pub intents: Vec<Intent>,
}

/// Build the entry transition for `phase`. Re-entering a phase always
/// asserts the same camera intent.
pub fn enter(phase: GamePhase, tower_height: f32, countdown: u32) -> Transition {
    use Intent::*;

    let standard = [
        CameraDistance(CAMERA_DISTANCE),
        CameraAngleY(CAMERA_ANGLE_Y),
    ];

    let intents = match phase {
        GamePhase::Choose => {
            let mut v = standard.to_vec();
            v.push(ClearActive);
            v
        }
        GamePhase::Select | GamePhase::Check => standard.to_vec(),
        GamePhase::Remove => {
            let mut v = standard.to_vec();
            v.push(CaptureGrabOffset);
            v
        }
        GamePhase::Raise => {
            let mut v = vec![CameraHeight(tower_height)];
            v.extend(standard);
            v.push(FlattenGrabOffset);
            v
        }
        GamePhase::Place => vec![
            CameraDistance(CAMERA_PLACE_DISTANCE),
            CameraAngleY(CAMERA_PLACE_ANGLE_Y),
            PlaneHeight(tower_height + PLACE_CLEARANCE),
            CenterGrabOffset,
        ],
        GamePhase::Collapse => vec![
            CameraHeight(CAMERA_COLLAPSE_HEIGHT),
            CameraAngleY(CAMERA_ANGLE_Y),
        ],
    };

    Transition {
        phase,
        countdown,
        intents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_is_idempotent() {
        for phase in GamePhase::ALL {
            assert_eq!(enter(phase, 27.36, 0), enter(phase, 27.36, 0));
        }
    }

    #[test]
    fn test_choose_clears_active() {
        let t = enter(GamePhase::Choose, 27.36, 100);
        assert_eq!(t.countdown, 100);
        assert!(t.intents.contains(&Intent::ClearActive));
        assert!(t.intents.contains(&Intent::CameraDistance(40.0)));
    }

    #[test]
    fn test_raise_tracks_tower() {
        let t = enter(GamePhase::Raise, 12.0, 0);
        assert_eq!(t.intents[0], Intent::CameraHeight(12.0));
        assert!(t.intents.contains(&Intent::FlattenGrabOffset));
    }

    #[test]
    fn test_place_moves_plane_above_tower() {
        let t = enter(GamePhase::Place, 12.0, 0);
        assert!(t.intents.contains(&Intent::PlaneHeight(16.0)));
        assert!(t.intents.contains(&Intent::CameraDistance(20.0)));
        assert!(t.intents.contains(&Intent::CameraAngleY(25.0)));
        assert!(t.intents.contains(&Intent::CenterGrabOffset));
    }

    #[test]
    fn test_collapse_lowers_camera() {
        let t = enter(GamePhase::Collapse, 12.0, GAME_OVER_TICKS);
        assert_eq!(t.countdown, 200);
        assert!(t.intents.contains(&Intent::CameraHeight(10.0)));
        assert!(!t.intents.iter().any(|i| matches!(i, Intent::CameraDistance(_))));
    }
}
