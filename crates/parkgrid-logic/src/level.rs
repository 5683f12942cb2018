//! A single facility level: a fully populated, row-major grid of spots.

use serde::{Deserialize, Serialize};

use crate::layout::{LayoutError, LevelLayout};
use crate::spot::{Location, Spot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    number: u32,
    rows: u32,
    spaces: u32,
    /// Row-major; index with [`Location::grid_index`].
    spots: Vec<Spot>,
}

impl Level {
    /// Build level `number` (1-based) from its layout description.
    pub fn from_layout(number: u32, layout: &LevelLayout) -> Result<Self, LayoutError> {
        let expected = layout.rows as usize * layout.spaces as usize;
        if layout.rows == 0 || layout.spaces == 0 {
            return Err(LayoutError::EmptyLevel { level: number });
        }
        if layout.spots.len() != expected {
            return Err(LayoutError::SpotCountMismatch {
                level: number,
                expected,
                found: layout.spots.len(),
            });
        }

        let mut spots = Vec::with_capacity(expected);
        for row in 1..=layout.rows {
            for space in 1..=layout.spaces {
                let location = Location::new(number, row, space);
                let class = layout.spots[location.grid_index(layout.spaces)];
                spots.push(Spot::new(class, location));
            }
        }

        Ok(Self {
            number,
            rows: layout.rows,
            spaces: layout.spaces,
            spots,
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn spaces(&self) -> u32 {
        self.spaces
    }

    pub fn capacity(&self) -> usize {
        self.spots.len()
    }

    /// Whether (row, space) lies inside this level's grid.
    pub fn contains(&self, row: u32, space: u32) -> bool {
        (1..=self.rows).contains(&row) && (1..=self.spaces).contains(&space)
    }

    pub fn spot(&self, row: u32, space: u32) -> Option<&Spot> {
        if !self.contains(row, space) {
            return None;
        }
        self.spots
            .get(Location::new(self.number, row, space).grid_index(self.spaces))
    }

    pub(crate) fn spot_mut(&mut self, row: u32, space: u32) -> Option<&mut Spot> {
        if !self.contains(row, space) {
            return None;
        }
        let idx = Location::new(self.number, row, space).grid_index(self.spaces);
        self.spots.get_mut(idx)
    }

    /// All spots in row-major order.
    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    pub fn filled_count(&self) -> usize {
        self.spots.iter().filter(|s| s.is_filled()).count()
    }
}
