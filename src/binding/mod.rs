//! Slot assignment for recognized items.
//!
//! This module provides:
//! - The fixed set of input slots (`SlotId`)
//! - The slot → item table shared with playback (`AssignmentTable`)
//! - The deterministic assignment policy (`assign`)
//! - Human-readable binding summaries

pub mod assign;
pub mod summary;
pub mod table;

pub use assign::{assign, Assignment, RecognizedItems};
pub use summary::binding_summary;
pub use table::{AssignmentTable, Binding};

/// One of the ten fixed input slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    Reinforce,
    Resupply,
    Area1,
    Area2,
    Area3,
    Role1,
    Role2,
    Role3,
    Role4,
    Role5,
}

impl SlotId {
    /// Every slot, in table order.
    pub const ALL: [SlotId; 10] = [
        SlotId::Reinforce,
        SlotId::Resupply,
        SlotId::Area1,
        SlotId::Area2,
        SlotId::Area3,
        SlotId::Role1,
        SlotId::Role2,
        SlotId::Role3,
        SlotId::Role4,
        SlotId::Role5,
    ];

    /// Generic area slots, filled in this order.
    pub const AREA: [SlotId; 3] = [SlotId::Area1, SlotId::Area2, SlotId::Area3];

    /// Role slots, filled in this order.
    pub const ROLE: [SlotId; 5] = [
        SlotId::Role1,
        SlotId::Role2,
        SlotId::Role3,
        SlotId::Role4,
        SlotId::Role5,
    ];

    /// Position of the slot in `ALL`.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotId::Reinforce => write!(f, "reinforce"),
            SlotId::Resupply => write!(f, "supply"),
            SlotId::Area1 => write!(f, "map1"),
            SlotId::Area2 => write!(f, "map2"),
            SlotId::Area3 => write!(f, "map3"),
            SlotId::Role1 => write!(f, "player1"),
            SlotId::Role2 => write!(f, "player2"),
            SlotId::Role3 => write!(f, "player3"),
            SlotId::Role4 => write!(f, "player4"),
            SlotId::Role5 => write!(f, "player5"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, slot) in SlotId::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
    }
}
