use super::SlotId;

/// An item bound to a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub command: String,
}

impl Binding {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }
}

/// Slot → item table produced by one recognition cycle.
///
/// Built once per cycle and then only read; the pipeline replaces it as a whole.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignmentTable {
    slots: [Option<Binding>; SlotId::ALL.len()],
}

impl AssignmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: SlotId) -> Option<&Binding> {
        self.slots[slot.index()].as_ref()
    }

    pub fn is_free(&self, slot: SlotId) -> bool {
        self.slots[slot.index()].is_none()
    }

    pub(crate) fn set(&mut self, slot: SlotId, binding: Binding) {
        self.slots[slot.index()] = Some(binding);
    }

    /// All slots in table order, bound or not.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, Option<&Binding>)> {
        SlotId::ALL
            .into_iter()
            .zip(self.slots.iter())
            .map(|(slot, binding)| (slot, binding.as_ref()))
    }

    /// Only the bound slots, in table order.
    pub fn bound(&self) -> impl Iterator<Item = (SlotId, &Binding)> {
        self.iter()
            .filter_map(|(slot, binding)| binding.map(|b| (slot, b)))
    }

    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.bound_count() == 0
    }

    /// Slot an item name is bound to, if any.
    pub fn slot_of(&self, name: &str) -> Option<SlotId> {
        self.bound()
            .find(|(_, binding)| binding.name == name)
            .map(|(slot, _)| slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_is_empty() {
        let table = AssignmentTable::new();
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 10);
        assert!(SlotId::ALL.iter().all(|&s| table.is_free(s)));
    }

    #[test]
    fn test_set_and_lookup() {
        let mut table = AssignmentTable::new();
        table.set(SlotId::Role2, Binding::new("机枪", "saswd"));

        assert_eq!(table.bound_count(), 1);
        assert_eq!(table.get(SlotId::Role2).unwrap().command, "saswd");
        assert_eq!(table.slot_of("机枪"), Some(SlotId::Role2));
        assert_eq!(table.slot_of("增援"), None);

        let bound: Vec<SlotId> = table.bound().map(|(s, _)| s).collect();
        assert_eq!(bound, vec![SlotId::Role2]);
    }
}
