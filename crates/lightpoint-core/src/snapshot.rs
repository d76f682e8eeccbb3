//! Per-region active/inactive classification snapshots

use crate::region::RegionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from region id to its active flag.
///
/// A populated snapshot holds exactly one entry per region of the template it
/// was classified against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSnapshot {
    states: BTreeMap<RegionId, bool>,
}

impl ClassificationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the classification of one region.
    pub fn insert(&mut self, id: RegionId, active: bool) {
        self.states.insert(id, active);
    }

    pub fn get(&self, id: RegionId) -> Option<bool> {
        self.states.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of regions currently classified active.
    pub fn active_count(&self) -> usize {
        self.states.values().filter(|&&active| active).count()
    }

    /// Number of regions whose flag differs from `other`.
    ///
    /// Regions missing from either side are not counted.
    pub fn flipped_against(&self, other: &ClassificationSnapshot) -> usize {
        self.states
            .iter()
            .filter(|(id, active)| other.get(**id).is_some_and(|o| o != **active))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, bool)> + '_ {
        self.states.iter().map(|(id, active)| (*id, *active))
    }
}

impl FromIterator<(RegionId, bool)> for ClassificationSnapshot {
    fn from_iter<T: IntoIterator<Item = (RegionId, bool)>>(iter: T) -> Self {
        Self {
            states: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_count_and_flips() {
        let baseline: ClassificationSnapshot = [(0, true), (1, true), (2, false)].into_iter().collect();
        let current: ClassificationSnapshot = [(0, true), (1, false), (2, false)].into_iter().collect();

        assert_eq!(baseline.active_count(), 2);
        assert_eq!(current.active_count(), 1);
        assert_eq!(current.flipped_against(&baseline), 1);
        assert_eq!(baseline.flipped_against(&baseline), 0);
    }

    #[test]
    fn test_flips_ignore_unknown_regions() {
        let a: ClassificationSnapshot = [(0, true), (9, true)].into_iter().collect();
        let b: ClassificationSnapshot = [(0, false)].into_iter().collect();
        assert_eq!(a.flipped_against(&b), 1);
        assert!(ClassificationSnapshot::new().is_empty());
    }
}
