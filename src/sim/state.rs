//! Game session state
//!
//! Everything the turn state machine reads or writes lives in one
//! [`GameSession`], passed explicitly to [`super::tick`].

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::camera::OrbitCamera;
use super::physics::TowerPhysics;
use super::transition::{self, Intent, Transition};
use crate::consts::*;
use crate::highscores::HighScores;
use crate::initial_tower_height;
use crate::settings::Settings;

/// Current phase of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Pick a block to take out
    Choose,
    /// Block chosen, waiting for the player to grab it
    Select,
    /// Dragging the block out horizontally
    Remove,
    /// Lifting the block above the tower
    Raise,
    /// Positioning the block on top
    Place,
    /// Waiting for the tower to settle before judging the placement
    Check,
    /// Tower fell; game over until the player starts again
    Collapse,
}

impl GamePhase {
    pub const ALL: [GamePhase; 7] = [
        GamePhase::Choose,
        GamePhase::Select,
        GamePhase::Remove,
        GamePhase::Raise,
        GamePhase::Place,
        GamePhase::Check,
        GamePhase::Collapse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Choose => "Choose",
            GamePhase::Select => "Select",
            GamePhase::Remove => "Remove",
            GamePhase::Raise => "Raise",
            GamePhase::Place => "Place",
            GamePhase::Check => "Check",
            GamePhase::Collapse => "Collapse",
        }
    }

    /// Phases that always have an active block
    pub fn holds_block(&self) -> bool {
        matches!(
            self,
            GamePhase::Select
                | GamePhase::Remove
                | GamePhase::Raise
                | GamePhase::Place
                | GamePhase::Check
        )
    }

    /// Phases in which the player is steering a block with the mouse
    pub fn is_dragging(&self) -> bool {
        matches!(self, GamePhase::Remove | GamePhase::Raise | GamePhase::Place)
    }
}

/// Cursor and block selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Block under the cursor this frame
    pub hovered: Option<usize>,
    /// Block being manipulated
    pub active: Option<usize>,
    /// 3D point under the cursor
    pub cursor_point: Vec3,
    /// Cursor point relative to the active block's origin
    pub grab_offset: Vec3,
    /// Height of the horizontal drag plane
    pub plane_height: f32,
}

impl Selection {
    /// Block exempt from the fallen-block check: the held block, or the
    /// hovered one while choosing
    pub fn focus(&self, phase: GamePhase) -> Option<usize> {
        match phase {
            GamePhase::Choose => self.hovered,
            _ => self.active,
        }
    }

    /// True when the cursor is over the active block
    pub fn hovering_active(&self) -> bool {
        self.active.is_some() && self.hovered == self.active
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            hovered: None,
            active: None,
            cursor_point: Vec3::ZERO,
            grab_offset: Vec3::ZERO,
            plane_height: 0.0,
        }
    }
}

/// Why a placement was sent back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Block came to rest below the top layer
    TooLow,
    /// Block came to rest above the top layer
    TooHigh,
}

/// Game events emitted by a tick (for logging, sound, UI)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    BlockChosen { index: usize },
    TurnCommitted { turn: u32, tower_height: f32 },
    PlacementRejected { reason: RejectReason },
    Collapsed { turns: u32 },
    GameReset { high_score: u32 },
    QuitRequested,
}

/// Complete state of a game session
#[derive(Debug, Clone)]
pub struct GameSession {
    pub phase: GamePhase,
    pub camera: OrbitCamera,
    pub selection: Selection,
    /// Ticks left on the current phase's countdown
    pub countdown: u32,
    /// Turns completed this game
    pub turn: u32,
    /// Height of the highest complete layer
    pub tower_height: f32,
    pub high_scores: HighScores,
    pub help_visible: bool,
    /// Cursor position in window pixels, `None` until it enters the window
    pub cursor: Option<Vec2>,
    /// Primary button currently held
    pub button_held: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Ticks played in the current game
    pub game_ticks: u64,
    block_count: usize,
}

impl GameSession {
    pub fn new(block_count: usize) -> Self {
        Self {
            phase: GamePhase::Choose,
            camera: OrbitCamera::default(),
            selection: Selection::default(),
            countdown: 0,
            turn: 0,
            tower_height: initial_tower_height(block_count),
            high_scores: HighScores::new(),
            help_visible: true,
            cursor: None,
            button_held: false,
            time_ticks: 0,
            game_ticks: 0,
            block_count,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut session = Self::new(settings.block_count);
        session.help_visible = settings.help_visible;
        session.camera.fov = settings.field_of_view;
        session
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Score shown to the player
    pub fn score(&self) -> u32 {
        self.turn
    }

    /// Height below which a block may be taken out
    pub fn removable_below(&self) -> f32 {
        self.tower_height - LAYER_RISE
    }

    /// Whether block `index` currently sits low enough to be taken out
    pub fn is_removable(&self, index: usize, physics: &dyn TowerPhysics) -> bool {
        physics
            .pose(index)
            .is_some_and(|p| p.height() < self.removable_below())
    }

    /// Enter `phase`, carrying out its entry intents
    pub fn enter(
        &mut self,
        phase: GamePhase,
        countdown: u32,
        physics: &dyn TowerPhysics,
        events: &mut Vec<GameEvent>,
    ) {
        let from = self.phase;
        let transition = transition::enter(phase, self.tower_height, countdown);
        self.apply(&transition, physics);

        if from != phase {
            log::info!("Phase {} -> {}", from.as_str(), phase.as_str());
            events.push(GameEvent::PhaseChanged { from, to: phase });
        }

        debug_assert!(
            !phase.holds_block() || self.selection.active.is_some(),
            "{} entered without an active block",
            phase.as_str()
        );
        debug_assert!(
            phase != GamePhase::Choose || self.selection.active.is_none(),
            "Choose entered with an active block"
        );
    }

    fn apply(&mut self, transition: &Transition, physics: &dyn TowerPhysics) {
        self.phase = transition.phase;
        self.countdown = transition.countdown;

        for intent in &transition.intents {
            match *intent {
                Intent::CameraHeight(h) => self.camera.set_height(h),
                Intent::CameraDistance(d) => self.camera.set_distance(d),
                Intent::CameraAngleY(a) => self.camera.set_angle_y(a),
                Intent::ClearActive => self.selection.active = None,
                Intent::CaptureGrabOffset => {
                    if let Some(pose) = self.selection.active.and_then(|i| physics.pose(i)) {
                        self.selection.grab_offset = self.selection.cursor_point - pose.position;
                    }
                }
                Intent::FlattenGrabOffset => self.selection.grab_offset.y = 0.0,
                Intent::CenterGrabOffset => {
                    self.selection.grab_offset.x = 0.0;
                    self.selection.grab_offset.z = 0.0;
                }
                Intent::PlaneHeight(h) => self.selection.plane_height = h,
            }
        }
    }

    /// Start a new game: record the finished one, rebuild the world, and
    /// swing the camera back to the nearest quarter turn
    pub fn reset(&mut self, physics: &mut dyn TowerPhysics, events: &mut Vec<GameEvent>) {
        self.high_scores.record_game(self.turn, self.game_ticks);
        let high_score = self.high_scores.best();

        self.enter(GamePhase::Choose, 0, physics, events);
        let angle_x = self.camera.desired().angle_x;
        self.camera.set_angle_x((angle_x / 90.0).round() * 90.0);
        self.camera.set_height(CAMERA_HEIGHT);

        self.turn = 0;
        self.game_ticks = 0;
        self.tower_height = initial_tower_height(self.block_count);
        self.selection = Selection::default();

        physics.reset_world();

        log::info!("New game (high score {})", high_score);
        events.push(GameEvent::GameReset { high_score });
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(BLOCK_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::testing::ScriptedWorld;

    #[test]
    fn test_new_session() {
        let session = GameSession::default();
        assert_eq!(session.phase, GamePhase::Choose);
        assert_eq!(session.turn, 0);
        assert!((session.tower_height - 27.36).abs() < 1e-4);
        assert_eq!(session.selection.active, None);
    }

    #[test]
    fn test_enter_emits_phase_change_once() {
        let world = ScriptedWorld::tower(54);
        let mut session = GameSession::default();
        let mut events = Vec::new();
        session.selection.active = Some(3);
        session.enter(GamePhase::Select, 0, &world, &mut events);
        session.enter(GamePhase::Select, 0, &world, &mut events);
        assert_eq!(
            events,
            vec![GameEvent::PhaseChanged {
                from: GamePhase::Choose,
                to: GamePhase::Select
            }]
        );
    }

    #[test]
    fn test_remove_captures_grab_offset() {
        let world = ScriptedWorld::tower(54);
        let mut session = GameSession::default();
        let mut events = Vec::new();
        let origin = world.pose(4).map(|p| p.position).unwrap_or_default();
        session.selection.active = Some(4);
        session.selection.cursor_point = origin + Vec3::new(1.0, 0.5, -2.0);
        session.enter(GamePhase::Remove, 0, &world, &mut events);
        assert!((session.selection.grab_offset - Vec3::new(1.0, 0.5, -2.0)).length() < 1e-5);
    }

    #[test]
    fn test_reset_snaps_camera_and_rebuilds() {
        let mut world = ScriptedWorld::tower(54);
        let mut session = GameSession::default();
        let mut events = Vec::new();
        session.turn = 6;
        session.tower_height = 40.0;
        session.camera.adjust_angle_x(95.0 + 45.0);
        session.phase = GamePhase::Collapse;

        session.reset(&mut world, &mut events);

        assert_eq!(session.phase, GamePhase::Choose);
        assert_eq!(session.turn, 0);
        assert!((session.tower_height - 27.36).abs() < 1e-4);
        assert_eq!(session.high_scores.best(), 6);
        // -45 + 140 = 95, nearest quarter turn is 90
        assert_eq!(session.camera.desired().angle_x, 90.0);
        assert_eq!(session.camera.desired().height, CAMERA_HEIGHT);
        assert_eq!(world.resets, 1);
        assert!(events.contains(&GameEvent::GameReset { high_score: 6 }));
    }
}
