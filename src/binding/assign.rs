//! Deterministic slot assignment policy.
//!
//! Area items go to the reinforce/resupply slots when they are the configured
//! priority names, the rest fill the three generic area slots in recognition
//! order. Role items fill the five role slots in recognition order. Overflow
//! is dropped.

use super::{AssignmentTable, Binding, SlotId};
use crate::config::PriorityNames;
use crate::vocab::CategoryPartition;

/// Flat name → command mapping for one cycle, in first-seen order.
///
/// Inserting a name again replaces its command but keeps its position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecognizedItems {
    items: Vec<(String, String)>,
}

impl RecognizedItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, command: impl Into<String>) {
        let name = name.into();
        let command = command.into();
        if name.is_empty() {
            return;
        }
        match self.items.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = command,
            None => self.items.push((name, command)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }
}

impl<N: Into<String>, C: Into<String>> FromIterator<(N, C)> for RecognizedItems {
    fn from_iter<I: IntoIterator<Item = (N, C)>>(iter: I) -> Self {
        let mut items = RecognizedItems::new();
        for (name, command) in iter {
            items.insert(name, command);
        }
        items
    }
}

/// Output of the assignment step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    pub table: AssignmentTable,
    /// Generic area slots nothing was assigned to.
    pub open_area_slots: Vec<SlotId>,
}

/// Maps recognized items onto the fixed slots.
pub fn assign(
    recognized: &RecognizedItems,
    partition: &CategoryPartition,
    priority: &PriorityNames,
) -> Assignment {
    let mut table = AssignmentTable::new();

    let mut area_items: Vec<(&str, &str)> = recognized
        .iter()
        .filter(|(name, _)| partition.is_area(name))
        .collect();

    for (slot, priority_name) in [
        (SlotId::Reinforce, priority.reinforce.as_str()),
        (SlotId::Resupply, priority.resupply.as_str()),
    ] {
        if let Some(pos) = area_items.iter().position(|(name, _)| *name == priority_name) {
            let (name, command) = area_items.remove(pos);
            table.set(slot, Binding::new(name, command));
        }
    }

    for (slot, (name, command)) in SlotId::AREA.into_iter().zip(area_items.iter()) {
        table.set(slot, Binding::new(*name, *command));
    }
    if area_items.len() > SlotId::AREA.len() {
        for (name, _) in &area_items[SlotId::AREA.len()..] {
            crate::log(&format!("No area slot left for '{}', dropped", name));
        }
    }

    let role_items: Vec<(&str, &str)> = recognized
        .iter()
        .filter(|(name, _)| partition.is_role(name))
        .collect();

    for (slot, (name, command)) in SlotId::ROLE.into_iter().zip(role_items.iter()) {
        table.set(slot, Binding::new(*name, *command));
    }
    if role_items.len() > SlotId::ROLE.len() {
        for (name, _) in &role_items[SlotId::ROLE.len()..] {
            crate::log(&format!("No role slot left for '{}', dropped", name));
        }
    }

    let open_area_slots: Vec<SlotId> = SlotId::AREA
        .into_iter()
        .filter(|&slot| table.is_free(slot))
        .collect();
    for slot in &open_area_slots {
        crate::log(&format!("Area slot {} remains open", slot));
    }

    for (slot, binding) in table.bound() {
        crate::log(&format!(
            "Bound {} → {} ({})",
            slot, binding.name, binding.command
        ));
    }

    Assignment {
        table,
        open_area_slots,
    }
}
