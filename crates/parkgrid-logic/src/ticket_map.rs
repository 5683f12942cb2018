//! Occupancy mirror used for reporting: one grid per level, each cell holding
//! the id of the ticket currently parked there.

use serde::{Deserialize, Serialize};

use crate::level::Level;
use crate::spot::Location;
use crate::ticket::TicketId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketGrid {
    pub level: u32,
    pub rows: u32,
    pub spaces: u32,
    /// Row-major, same shape as the level's spot grid.
    pub cells: Vec<Option<TicketId>>,
}

impl TicketGrid {
    pub fn cell(&self, row: u32, space: u32) -> Option<TicketId> {
        if row == 0 || space == 0 || row > self.rows || space > self.spaces {
            return None;
        }
        let idx = Location::new(self.level, row, space).grid_index(self.spaces);
        self.cells.get(idx).copied().flatten()
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketMap {
    levels: Vec<TicketGrid>,
}

impl TicketMap {
    /// Empty map with the same shape as `levels`.
    pub fn for_levels(levels: &[Level]) -> Self {
        Self {
            levels: levels
                .iter()
                .map(|l| TicketGrid {
                    level: l.number(),
                    rows: l.rows(),
                    spaces: l.spaces(),
                    cells: vec![None; l.capacity()],
                })
                .collect(),
        }
    }

    pub fn levels(&self) -> &[TicketGrid] {
        &self.levels
    }

    fn slot(&mut self, location: Location) -> Option<&mut Option<TicketId>> {
        let grid = self.levels.get_mut(location.level.checked_sub(1)? as usize)?;
        if location.row == 0 || location.space == 0 {
            return None;
        }
        if location.row > grid.rows || location.space > grid.spaces {
            return None;
        }
        let idx = location.grid_index(grid.spaces);
        grid.cells.get_mut(idx)
    }

    pub fn get(&self, location: Location) -> Option<TicketId> {
        self.levels
            .get(location.level.checked_sub(1)? as usize)?
            .cell(location.row, location.space)
    }

    /// Write a cell, returning what it held before.
    pub(crate) fn set(&mut self, location: Location, ticket: Option<TicketId>) -> Option<TicketId> {
        match self.slot(location) {
            Some(cell) => std::mem::replace(cell, ticket),
            None => None,
        }
    }

    pub fn occupied(&self) -> usize {
        self.levels.iter().map(TicketGrid::occupied).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LevelLayout;
    use crate::spot::SpotClass;

    fn map() -> TicketMap {
        let levels = vec![
            Level::from_layout(1, &LevelLayout::banded(3, &[(2, SpotClass::Compact)])).unwrap(),
            Level::from_layout(2, &LevelLayout::banded(1, &[(4, SpotClass::Large)])).unwrap(),
        ];
        TicketMap::for_levels(&levels)
    }

    #[test]
    fn mirrors_level_shapes() {
        let map = map();
        assert_eq!(map.levels().len(), 2);
        assert_eq!(map.levels()[0].cells.len(), 6);
        assert_eq!(map.levels()[1].rows, 4);
        assert_eq!(map.occupied(), 0);
    }

    #[test]
    fn set_and_clear() {
        let mut map = map();
        let loc = Location::new(1, 2, 3);
        assert_eq!(map.set(loc, Some(TicketId(7))), None);
        assert_eq!(map.get(loc), Some(TicketId(7)));
        assert_eq!(map.occupied(), 1);
        assert_eq!(map.set(loc, None), Some(TicketId(7)));
        assert_eq!(map.get(loc), None);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut map = map();
        for loc in [
            Location::new(0, 1, 1),
            Location::new(3, 1, 1),
            Location::new(1, 3, 1),
            Location::new(2, 1, 2),
        ] {
            assert_eq!(map.set(loc, Some(TicketId(1))), None);
            assert_eq!(map.get(loc), None);
        }
        assert_eq!(map.occupied(), 0);
    }

    #[test]
    fn short_deserialized_grid_reads_as_free() {
        let grid: TicketGrid =
            serde_json::from_str(r#"{"level": 1, "rows": 2, "spaces": 2, "cells": [7]}"#).unwrap();
        assert_eq!(grid.cell(1, 1), Some(TicketId(7)));
        assert_eq!(grid.cell(1, 2), None);
        assert_eq!(grid.cell(2, 2), None);
        assert_eq!(grid.occupied(), 1);
    }
}
