//! Area / role partition of the vocabulary.

use std::collections::HashSet;

use super::Vocabulary;

/// Vocabulary grouping. `Area` items are map-wide actions; the three role
/// groups are player-specific and flattened together for assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Area,
    RoleA,
    RoleB,
    RoleC,
}

impl Category {
    pub fn is_role(self) -> bool {
        !matches!(self, Category::Area)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Area => write!(f, "Map"),
            Category::RoleA => write!(f, "Player/R"),
            Category::RoleB => write!(f, "Player/G"),
            Category::RoleC => write!(f, "Player/B"),
        }
    }
}

/// Name sets used to decide which slot family a matched name belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryPartition {
    area: HashSet<String>,
    role: HashSet<String>,
}

impl CategoryPartition {
    pub fn from_vocabulary(vocabulary: &Vocabulary) -> Self {
        let mut partition = Self::default();
        for entry in vocabulary.entries() {
            if entry.category.is_role() {
                partition.role.insert(entry.name.clone());
            } else {
                partition.area.insert(entry.name.clone());
            }
        }
        crate::log(&format!(
            "Category partition: {} area items, {} role items",
            partition.area_len(),
            partition.role_len()
        ));
        partition
    }

    pub fn is_area(&self, name: &str) -> bool {
        self.area.contains(name)
    }

    pub fn is_role(&self, name: &str) -> bool {
        self.role.contains(name)
    }

    pub fn area_len(&self) -> usize {
        self.area.len()
    }

    pub fn role_len(&self) -> usize {
        self.role.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::tests::sample;

    #[test]
    fn test_partition_splits_area_and_roles() {
        let partition = CategoryPartition::from_vocabulary(&sample());
        assert_eq!(partition.area_len(), 4);
        assert_eq!(partition.role_len(), 4);
        assert!(partition.is_area("增援"));
        assert!(!partition.is_role("增援"));
        assert!(partition.is_role("轨道精准攻击"));
        assert!(partition.is_role("哨戒机枪"));
        assert!(partition.is_role("机枪"));
        assert!(!partition.is_area("unknown") && !partition.is_role("unknown"));
    }

    #[test]
    fn test_empty_vocabulary_gives_empty_partition() {
        let partition = CategoryPartition::from_vocabulary(&Vocabulary::default());
        assert_eq!(partition, CategoryPartition::default());
    }
}
