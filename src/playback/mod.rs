//! Slot macro playback.
//!
//! A command string such as `"wasd"` is played as direction key taps while the
//! modifier is held. Each slot plays at most one macro at a time.

pub mod player;

pub use player::{MacroPlayer, TriggerOutcome};

use crate::input::Key;

/// One step of a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// Maps a command symbol. `w a s d` (any case) and the arrow glyphs are accepted.
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            'w' | 'W' | '↑' => Some(Direction::Up),
            'a' | 'A' | '←' => Some(Direction::Left),
            's' | 'S' | '↓' => Some(Direction::Down),
            'd' | 'D' | '→' => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn arrow(self) -> char {
        match self {
            Direction::Up => '↑',
            Direction::Left => '←',
            Direction::Down => '↓',
            Direction::Right => '→',
        }
    }

    pub fn key(self) -> Key {
        match self {
            Direction::Up => Key::Up,
            Direction::Left => Key::Left,
            Direction::Down => Key::Down,
            Direction::Right => Key::Right,
        }
    }

    /// Directions of a command string in order. Unknown symbols are skipped.
    pub fn parse_command(command: &str) -> Vec<Direction> {
        command.chars().filter_map(Direction::from_symbol).collect()
    }
}
