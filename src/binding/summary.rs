use super::AssignmentTable;
use crate::config::KeyConfig;
use crate::playback::Direction;

/// Renders a command string as arrows, e.g. "wsdaw" → "↑↓→←↑".
///
/// Symbols outside the direction alphabet are kept as-is.
pub fn command_arrows(command: &str) -> String {
    command
        .chars()
        .map(|c| Direction::from_symbol(c).map_or(c, Direction::arrow))
        .collect()
}

/// One line per bound slot: `name [key] (arrows)`.
pub fn binding_summary(table: &AssignmentTable, keys: &KeyConfig) -> Vec<String> {
    table
        .bound()
        .map(|(slot, binding)| {
            format!(
                "{} [{}] ({})",
                binding.name,
                keys.key_for(slot),
                command_arrows(&binding.command)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{Binding, SlotId};

    #[test]
    fn test_command_arrows() {
        assert_eq!(command_arrows("wasd"), "↑←↓→");
        assert_eq!(command_arrows("wsdaw"), "↑↓→←↑");
        assert_eq!(command_arrows("w?"), "↑?");
    }

    #[test]
    fn test_summary_lists_bound_slots_with_keys() {
        let mut table = AssignmentTable::new();
        table.set(SlotId::Reinforce, Binding::new("增援", "wsdaw"));
        table.set(SlotId::Role1, Binding::new("机枪", "saswd"));

        let lines = binding_summary(&table, &KeyConfig::default());
        assert_eq!(lines, vec!["增援 [0] (↑↓→←↑)", "机枪 [1] (↓←↓↑→)"]);
    }

    #[test]
    fn test_summary_of_empty_table() {
        assert!(binding_summary(&AssignmentTable::new(), &KeyConfig::default()).is_empty());
    }
}
