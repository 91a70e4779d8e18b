//! Normalized input events
//!
//! Window plumbing translates raw key and mouse codes into these before they
//! reach the game-state layer.

use glam::Vec2;

/// Game actions bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Choose a block, check a placement, start a new game
    Confirm,
    /// Push a block away (or lift it while placing)
    Push,
    /// Pull a block toward the cursor (or lower it while placing)
    Pull,
    RotateLeft,
    RotateRight,
    /// Orbit the camera around the tower
    OrbitCamera,
    ToggleHelp,
    Quit,
}

impl Key {
    /// Default keyboard layout
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            ' ' => Some(Key::Confirm),
            'w' => Some(Key::Push),
            's' => Some(Key::Pull),
            'a' => Some(Key::RotateLeft),
            'd' => Some(Key::RotateRight),
            'e' => Some(Key::OrbitCamera),
            'h' => Some(Key::ToggleHelp),
            '\u{1b}' => Some(Key::Quit),
            _ => None,
        }
    }
}

/// One input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key(Key),
    /// Primary mouse button pressed
    PrimaryDown,
    /// Primary mouse button released
    PrimaryUp,
    /// Cursor position in window pixels, origin top-left
    CursorMoved(Vec2),
    /// Cursor left the window
    CursorLeft,
}

impl From<Key> for InputEvent {
    fn from(key: Key) -> Self {
        InputEvent::Key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(Key::from_char(' '), Some(Key::Confirm));
        assert_eq!(Key::from_char('W'), Some(Key::Push));
        assert_eq!(Key::from_char('s'), Some(Key::Pull));
        assert_eq!(Key::from_char('a'), Some(Key::RotateLeft));
        assert_eq!(Key::from_char('d'), Some(Key::RotateRight));
        assert_eq!(Key::from_char('e'), Some(Key::OrbitCamera));
        assert_eq!(Key::from_char('h'), Some(Key::ToggleHelp));
        assert_eq!(Key::from_char('\u{1b}'), Some(Key::Quit));
        assert_eq!(Key::from_char('q'), None);
    }
}
