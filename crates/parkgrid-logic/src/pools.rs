//! Free-spot pools, one per size class.
//!
//! Pools hold the locations of currently unfilled spots. Removal keeps the
//! remaining order and released spots go to the back, so "first encountered"
//! tie-breaks in [`FreePools::nearest`] are stable across a run.

use serde::{Deserialize, Serialize};

use crate::spot::{Location, SpotClass};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreePools {
    handicap: Vec<Location>,
    compact: Vec<Location>,
    large: Vec<Location>,
}

impl FreePools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self, class: SpotClass) -> &[Location] {
        match class {
            SpotClass::Handicap => &self.handicap,
            SpotClass::Compact => &self.compact,
            SpotClass::Large => &self.large,
        }
    }

    fn pool_mut(&mut self, class: SpotClass) -> &mut Vec<Location> {
        match class {
            SpotClass::Handicap => &mut self.handicap,
            SpotClass::Compact => &mut self.compact,
            SpotClass::Large => &mut self.large,
        }
    }

    /// No free spot of this class remains.
    pub fn is_full(&self, class: SpotClass) -> bool {
        self.pool(class).is_empty()
    }

    pub fn free(&self, class: SpotClass) -> usize {
        self.pool(class).len()
    }

    pub fn total_free(&self) -> usize {
        self.handicap.len() + self.compact.len() + self.large.len()
    }

    pub fn contains(&self, class: SpotClass, location: Location) -> bool {
        self.pool(class).contains(&location)
    }

    pub(crate) fn push(&mut self, class: SpotClass, location: Location) {
        self.pool_mut(class).push(location);
    }

    /// Remove `location`, preserving the order of what remains.
    pub(crate) fn remove(&mut self, class: SpotClass, location: Location) -> bool {
        let pool = self.pool_mut(class);
        match pool.iter().position(|&l| l == location) {
            Some(idx) => {
                pool.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Closest free spot of `class`; ties go to the earliest in pool order.
    pub fn nearest(&self, class: SpotClass) -> Option<Location> {
        self.pool(class)
            .iter()
            .copied()
            .min_by_key(Location::distance_to_entrance)
    }
}
