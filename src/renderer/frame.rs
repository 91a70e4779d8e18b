//! Render contract
//!
//! What a renderer must draw each frame: every block with its highlight,
//! the camera, and the overlay keys for the current phase.

use glam::Vec3;

use super::instance::{BlockInstance, Highlight};
use crate::sim::physics::TowerPhysics;
use crate::sim::state::{GamePhase, GameSession};

/// Help bar content for a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelpKey {
    Choose,
    Select,
    Remove,
    Raise,
    Place,
    Check,
}

impl HelpKey {
    pub fn for_phase(phase: GamePhase) -> Option<Self> {
        match phase {
            GamePhase::Choose => Some(HelpKey::Choose),
            GamePhase::Select => Some(HelpKey::Select),
            GamePhase::Remove => Some(HelpKey::Remove),
            GamePhase::Raise => Some(HelpKey::Raise),
            GamePhase::Place => Some(HelpKey::Place),
            GamePhase::Check => Some(HelpKey::Check),
            GamePhase::Collapse => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            HelpKey::Choose => "Choose a block",
            HelpKey::Select => "Select block",
            HelpKey::Remove => "Remove block",
            HelpKey::Raise => "Raise block",
            HelpKey::Place => "Place block",
            HelpKey::Check => "Checking placement",
        }
    }

    pub fn controls(&self) -> &'static str {
        match self {
            HelpKey::Choose => "W: push block; S: pull block; E: rotate camera; Space: choose block",
            HelpKey::Select => {
                "W: push block; S: pull block; E: rotate camera; Space: check placement; Use the mouse to select the block"
            }
            HelpKey::Remove => {
                "W: raise block (when removed); A/D: rotate block; Release mouse to drop block"
            }
            HelpKey::Raise => "Release mouse to drop block",
            HelpKey::Place => {
                "W: raise block; S: lower block; A/D: rotate block; E: rotate camera; Release mouse to drop block"
            }
            HelpKey::Check => "Wait for the tower to settle",
        }
    }
}

/// Transient centre-screen message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    /// Placement accepted
    Confirmed,
    /// Placement rejected
    Retry,
    Checking,
    GameOver {
        final_score: u32,
        new_record: bool,
        /// Countdown over; the player may start again
        can_restart: bool,
    },
}

impl MessageKey {
    pub fn text(&self) -> String {
        match self {
            MessageKey::Confirmed => "Okay!".to_string(),
            MessageKey::Retry => "Try again".to_string(),
            MessageKey::Checking => "Checking...".to_string(),
            MessageKey::GameOver {
                final_score,
                can_restart,
                ..
            } => {
                let mut text = format!("GAME OVER\nFinal score: {}", final_score);
                if *can_restart {
                    text.push_str("\nPress space to play again");
                }
                text
            }
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub blocks: Vec<BlockInstance>,
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Help bar for the phase (none once the tower has fallen)
    pub help: Option<HelpKey>,
    pub help_visible: bool,
    pub message: Option<MessageKey>,
    pub score: u32,
    pub high_score: u32,
}

fn highlight_for(session: &GameSession, index: usize) -> Highlight {
    let selection = &session.selection;
    match session.phase {
        GamePhase::Choose if selection.hovered == Some(index) => Highlight::Candidate,
        GamePhase::Place if selection.active == Some(index) => Highlight::Placing,
        GamePhase::Select | GamePhase::Remove | GamePhase::Raise
            if selection.active == Some(index) =>
        {
            Highlight::Held
        }
        _ => Highlight::None,
    }
}

fn message_for(session: &GameSession) -> Option<MessageKey> {
    match session.phase {
        GamePhase::Choose if session.countdown > 0 => Some(MessageKey::Confirmed),
        GamePhase::Select if session.countdown > 0 => Some(MessageKey::Retry),
        GamePhase::Check => Some(MessageKey::Checking),
        GamePhase::Collapse => Some(MessageKey::GameOver {
            final_score: session.score(),
            new_record: session.score() > session.high_scores.best(),
            can_restart: session.countdown == 0,
        }),
        _ => None,
    }
}

/// Build the frame for the current session and world
pub fn build_frame(session: &GameSession, physics: &dyn TowerPhysics) -> RenderFrame {
    let blocks = physics
        .poses()
        .iter()
        .enumerate()
        .map(|(i, pose)| {
            BlockInstance::new(i, pose, physics.half_extents(i), highlight_for(session, i))
        })
        .collect();

    RenderFrame {
        blocks,
        eye: session.camera.eye(),
        target: session.camera.target(),
        up: session.camera.up(),
        help: HelpKey::for_phase(session.phase),
        help_visible: session.help_visible,
        message: message_for(session),
        score: session.score(),
        high_score: session.high_scores.best(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::testing::ScriptedWorld;

    #[test]
    fn test_frame_has_every_block() {
        let world = ScriptedWorld::tower(54);
        let session = GameSession::default();
        let frame = build_frame(&session, &world);
        assert_eq!(frame.blocks.len(), 54);
        assert!(frame.blocks.iter().all(|b| b.highlight == Highlight::None as u32));
        assert_eq!(frame.help, Some(HelpKey::Choose));
        assert_eq!(frame.message, None);
    }

    #[test]
    fn test_frame_highlights() {
        let world = ScriptedWorld::tower(54);
        let mut session = GameSession::default();
        session.selection.hovered = Some(7);
        let frame = build_frame(&session, &world);
        assert_eq!(frame.blocks[7].highlight, Highlight::Candidate as u32);

        session.phase = GamePhase::Place;
        session.selection.active = Some(7);
        let frame = build_frame(&session, &world);
        assert_eq!(frame.blocks[7].highlight, Highlight::Placing as u32);
    }

    #[test]
    fn test_frame_messages() {
        let world = ScriptedWorld::tower(54);
        let mut session = GameSession::default();
        session.countdown = 10;
        assert_eq!(build_frame(&session, &world).message, Some(MessageKey::Confirmed));

        session.phase = GamePhase::Collapse;
        session.turn = 3;
        let frame = build_frame(&session, &world);
        assert_eq!(frame.help, None);
        let Some(message) = frame.message else {
            panic!("no game over message");
        };
        assert_eq!(
            message,
            MessageKey::GameOver {
                final_score: 3,
                new_record: true,
                can_restart: false
            }
        );
        assert!(!message.text().contains("play again"));
    }
}
