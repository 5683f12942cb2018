//! Boundary validation for park/unpark requests.
//!
//! Requests arrive loosely typed (JSON values from whatever front end drives
//! the desk) and leave as a [`Customer`] or a bounds-checked, occupied
//! [`Location`]. A rejected request never touches facility state.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::customer::{CarSize, Customer};
use crate::facility::Facility;
use crate::spot::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Park,
    Unpark,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Park => "park",
            Operation::Unpark => "unpark",
        })
    }
}

/// Why a request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("'size' is not a string")]
    SizeNotString,
    #[error("'accessible' is not a boolean")]
    AccessibleNotBool,
    #[error("'size' {0:?} is not one of compact_car, large_car")]
    UnknownSize(String),
    #[error("'location' is not a (level, row, space) triple")]
    LocationNotTriple,
    #[error("'location' has a non-integer component")]
    LocationNotInteger,
    #[error("'location' has a component below 1")]
    LocationBelowBounds,
    #[error("level {level} is above the facility's {levels} levels")]
    LevelAboveBounds { level: u32, levels: u32 },
    #[error("row {row} is above level {level}'s {rows} rows")]
    RowAboveBounds { level: u32, row: u32, rows: u32 },
    #[error("space {space} is above level {level}'s {spaces} spaces")]
    SpaceAboveBounds { level: u32, space: u32, spaces: u32 },
    #[error("no vehicle is parked at ({}, {}, {})", .0.level, .0.row, .0.space)]
    LocationEmpty(Location),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParkError {
    #[error("invalid input to {operation}(): {reason} (given {given})")]
    InvalidInput {
        operation: Operation,
        given: String,
        #[source]
        reason: InvalidInput,
    },
}

impl ParkError {
    pub fn invalid(operation: Operation, given: impl Into<String>, reason: InvalidInput) -> Self {
        ParkError::InvalidInput {
            operation,
            given: given.into(),
            reason,
        }
    }

    pub fn reason(&self) -> &InvalidInput {
        match self {
            ParkError::InvalidInput { reason, .. } => reason,
        }
    }
}

/// Validate park arguments: `size` must be the string `"compact_car"` or
/// `"large_car"`, `accessible` a boolean.
pub fn validate_park_request(size: &Value, accessible: &Value) -> Result<Customer, ParkError> {
    let invalid = |reason| ParkError::invalid(Operation::Park, format!("({size}, {accessible})"), reason);

    let Value::String(name) = size else {
        return Err(invalid(InvalidInput::SizeNotString));
    };
    let Value::Bool(flag) = accessible else {
        return Err(invalid(InvalidInput::AccessibleNotBool));
    };
    let car = name
        .parse::<CarSize>()
        .map_err(|name| invalid(InvalidInput::UnknownSize(name)))?;

    Ok(Customer::new(car, *flag))
}

fn integer_component(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) if n.is_i64() => n.as_i64(),
        // Integers past i64::MAX are still integers, just out of bounds.
        Value::Number(n) if n.is_u64() => Some(i64::MAX),
        _ => None,
    }
}

/// Validate an unpark location given as a JSON `[level, row, space]` array.
pub fn validate_unpark_request(facility: &Facility, location: &Value) -> Result<Location, ParkError> {
    let invalid = |reason| ParkError::invalid(Operation::Unpark, location.to_string(), reason);

    let parts = match location {
        Value::Array(items) if items.len() == 3 => items,
        _ => return Err(invalid(InvalidInput::LocationNotTriple)),
    };

    let mut components = [0i64; 3];
    for (slot, value) in components.iter_mut().zip(parts) {
        *slot = integer_component(value).ok_or_else(|| invalid(InvalidInput::LocationNotInteger))?;
    }
    if components.iter().any(|&c| c < 1) {
        return Err(invalid(InvalidInput::LocationBelowBounds));
    }

    let [level, row, space] = components.map(|c| u32::try_from(c).unwrap_or(u32::MAX));
    check_unpark_location(facility, Location::new(level, row, space)).map_err(invalid)
}

/// Typed half of unpark validation: bounds against the addressed level, then
/// occupancy.
pub fn check_unpark_location(facility: &Facility, location: Location) -> Result<Location, InvalidInput> {
    if location.level == 0 || location.row == 0 || location.space == 0 {
        return Err(InvalidInput::LocationBelowBounds);
    }

    let levels = facility.levels().len() as u32;
    let level = facility
        .level(location.level)
        .ok_or(InvalidInput::LevelAboveBounds {
            level: location.level,
            levels,
        })?;

    if location.row > level.rows() {
        return Err(InvalidInput::RowAboveBounds {
            level: location.level,
            row: location.row,
            rows: level.rows(),
        });
    }
    if location.space > level.spaces() {
        return Err(InvalidInput::SpaceAboveBounds {
            level: location.level,
            space: location.space,
            spaces: level.spaces(),
        });
    }

    match level.spot(location.row, location.space) {
        Some(spot) if spot.is_filled() => Ok(location),
        _ => Err(InvalidInput::LocationEmpty(location)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FacilityLayout, LevelLayout};
    use crate::spot::SpotClass;
    use serde_json::json;
    use std::time::SystemTime;

    fn facility() -> Facility {
        Facility::from_layout(&FacilityLayout {
            name: "Oak".into(),
            levels: vec![
                LevelLayout::banded(10, &[(2, SpotClass::Handicap)]),
                LevelLayout::banded(4, &[(3, SpotClass::Compact), (2, SpotClass::Large)]),
            ],
        })
        .unwrap()
    }

    #[test]
    fn valid_park_requests() {
        assert_eq!(
            validate_park_request(&json!("compact_car"), &json!(true)),
            Ok(Customer::new(CarSize::CompactCar, true))
        );
        assert_eq!(
            validate_park_request(&json!("large_car"), &json!(false)),
            Ok(Customer::new(CarSize::LargeCar, false))
        );
    }

    #[test]
    fn park_size_must_be_string() {
        let err = validate_park_request(&json!(12), &json!("nonboolean")).unwrap_err();
        assert_eq!(err.reason(), &InvalidInput::SizeNotString);
    }

    #[test]
    fn park_flag_must_be_bool() {
        let err = validate_park_request(&json!("compact_car"), &json!("nonbool")).unwrap_err();
        assert_eq!(err.reason(), &InvalidInput::AccessibleNotBool);
    }

    #[test]
    fn park_size_must_be_known() {
        let err = validate_park_request(&json!("eletric_car"), &json!(true)).unwrap_err();
        assert_eq!(err.reason(), &InvalidInput::UnknownSize("eletric_car".into()));
        assert_eq!(
            err.to_string(),
            "invalid input to park(): 'size' \"eletric_car\" is not one of compact_car, large_car (given (\"eletric_car\", true))"
        );
    }

    #[test]
    fn unpark_shape_errors() {
        let f = facility();
        let reason = |v: Value| validate_unpark_request(&f, &v).unwrap_err().reason().clone();
        assert_eq!(reason(json!([1])), InvalidInput::LocationNotTriple);
        assert_eq!(reason(json!({"level": 1, "row": 1, "space": 1})), InvalidInput::LocationNotTriple);
        assert_eq!(reason(json!("1,1,1")), InvalidInput::LocationNotTriple);
        assert_eq!(reason(json!(["str", true, 1])), InvalidInput::LocationNotInteger);
        assert_eq!(reason(json!([1.0, 1, 1])), InvalidInput::LocationNotInteger);
        assert_eq!(reason(json!([-2, 0, -1])), InvalidInput::LocationBelowBounds);
    }

    #[test]
    fn unpark_bounds_use_the_addressed_level() {
        let f = facility();
        let reason = |v: Value| validate_unpark_request(&f, &v).unwrap_err().reason().clone();
        assert_eq!(
            reason(json!([23, 1, 2])),
            InvalidInput::LevelAboveBounds { level: 23, levels: 2 }
        );
        assert_eq!(
            reason(json!([1, 14, 3])),
            InvalidInput::RowAboveBounds { level: 1, row: 14, rows: 2 }
        );
        assert_eq!(
            reason(json!([1, 1, 45])),
            InvalidInput::SpaceAboveBounds { level: 1, space: 45, spaces: 10 }
        );
        // Row 5 exists on level 2 but not on level 1.
        assert_eq!(
            reason(json!([1, 5, 1])),
            InvalidInput::RowAboveBounds { level: 1, row: 5, rows: 2 }
        );
        // Space 8 exists on level 1 but not on level 2.
        assert_eq!(
            reason(json!([2, 1, 8])),
            InvalidInput::SpaceAboveBounds { level: 2, space: 8, spaces: 4 }
        );
        assert_eq!(
            reason(json!([u64::MAX, 1, 1])),
            InvalidInput::LevelAboveBounds { level: u32::MAX, levels: 2 }
        );
    }

    #[test]
    fn unpark_empty_spot() {
        let f = facility();
        let err = validate_unpark_request(&f, &json!([1, 1, 1])).unwrap_err();
        assert_eq!(err.reason(), &InvalidInput::LocationEmpty(Location::new(1, 1, 1)));
    }

    #[test]
    fn unpark_occupied_spot_passes() {
        let mut f = facility();
        let loc = f
            .park_customer(Customer::new(CarSize::CompactCar, true), SystemTime::now())
            .map(|t| t.location())
            .unwrap();
        assert_eq!(
            validate_unpark_request(&f, &json!([loc.level, loc.row, loc.space])),
            Ok(loc)
        );
    }
}
