//! Customers and the occupancy labels derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Detected vehicle size at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarSize {
    CompactCar,
    LargeCar,
}

impl CarSize {
    pub fn name(self) -> &'static str {
        match self {
            CarSize::CompactCar => "compact_car",
            CarSize::LargeCar => "large_car",
        }
    }
}

impl fmt::Display for CarSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CarSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compact_car" => Ok(CarSize::CompactCar),
            "large_car" => Ok(CarSize::LargeCar),
            other => Err(other.to_string()),
        }
    }
}

/// Snapshot of who is parking. Only lives as long as the ticket that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub size: CarSize,
    /// Holds an accessibility placard.
    pub accessible: bool,
}

impl Customer {
    pub fn new(size: CarSize, accessible: bool) -> Self {
        Self { size, accessible }
    }

    pub fn label(&self) -> OccupancyLabel {
        OccupancyLabel::for_customer(self)
    }
}

/// Short code printed in occupied cells of the occupancy map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccupancyLabel {
    /// Accessible compact car.
    #[serde(rename = "HC")]
    HandicapCompact,
    /// Accessible large car.
    #[serde(rename = "LHC")]
    HandicapLarge,
    #[serde(rename = "COM")]
    Compact,
    #[serde(rename = "LAR")]
    Large,
}

impl OccupancyLabel {
    pub fn for_customer(customer: &Customer) -> Self {
        match (customer.accessible, customer.size) {
            (true, CarSize::CompactCar) => OccupancyLabel::HandicapCompact,
            (true, CarSize::LargeCar) => OccupancyLabel::HandicapLarge,
            (false, CarSize::CompactCar) => OccupancyLabel::Compact,
            (false, CarSize::LargeCar) => OccupancyLabel::Large,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            OccupancyLabel::HandicapCompact => "HC",
            OccupancyLabel::HandicapLarge => "LHC",
            OccupancyLabel::Compact => "COM",
            OccupancyLabel::Large => "LAR",
        }
    }
}

impl fmt::Display for OccupancyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
