//! Spot data model: size classes, locations and the entrance-distance metric.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Physical size class of a parking spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotClass {
    Handicap,
    Compact,
    Large,
}

impl SpotClass {
    pub fn all() -> [SpotClass; 3] {
        [SpotClass::Handicap, SpotClass::Compact, SpotClass::Large]
    }

    pub fn name(self) -> &'static str {
        match self {
            SpotClass::Handicap => "handicap",
            SpotClass::Compact => "compact",
            SpotClass::Large => "large",
        }
    }
}

impl fmt::Display for SpotClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpotClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "handicap" => Ok(SpotClass::Handicap),
            "compact" => Ok(SpotClass::Compact),
            "large" => Ok(SpotClass::Large),
            other => Err(other.to_string()),
        }
    }
}

/// Address of a spot inside the facility. All components are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub level: u32,
    pub row: u32,
    pub space: u32,
}

impl Location {
    pub fn new(level: u32, row: u32, space: u32) -> Self {
        Self { level, row, space }
    }

    /// Synthetic walking distance from the entrance at (1,1,1).
    ///
    /// Not Euclidean: every step along a level, row or space costs one unit,
    /// so lower values are closer to the entrance.
    pub fn distance_to_entrance(&self) -> u32 {
        self.level + self.row + self.space
    }

    /// Zero-based (row, space) index into a level grid.
    pub(crate) fn grid_index(&self, spaces: u32) -> usize {
        (self.row - 1) as usize * spaces as usize + (self.space - 1) as usize
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Level:{}   Row:{}   Space:{}",
            self.level, self.row, self.space
        )
    }
}

impl From<Location> for (u32, u32, u32) {
    fn from(loc: Location) -> Self {
        (loc.level, loc.row, loc.space)
    }
}

/// One physical parking space. Owned by its [`Level`](crate::level::Level).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spot {
    class: SpotClass,
    location: Location,
    filled: bool,
    distance_to_entrance: u32,
}

impl Spot {
    pub fn new(class: SpotClass, location: Location) -> Self {
        Self {
            class,
            location,
            filled: false,
            distance_to_entrance: location.distance_to_entrance(),
        }
    }

    pub fn class(&self) -> SpotClass {
        self.class
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn distance_to_entrance(&self) -> u32 {
        self.distance_to_entrance
    }

    pub(crate) fn set_filled(&mut self, filled: bool) {
        self.filled = filled;
    }
}
