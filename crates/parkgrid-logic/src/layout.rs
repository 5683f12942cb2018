//! Facility layout descriptions and the loaders that produce them.
//!
//! A layout is the build-time shape of a facility: its name and, per level,
//! the grid dimensions plus a row-major list of spot classes. Layouts come
//! from the line-oriented text format or from JSON.
//!
//! # Text format
//!
//! ```text
//! Redwood,2          <- name, level count
//! 1,2                <- level 1: rows, spaces
//! handicap           <- level 1 spots, row-major (rows × spaces lines)
//! compact
//! 2,1                <- level 2: rows, spaces
//! large
//! large
//! ```
//!
//! ```
//! use parkgrid_logic::layout::parse_layout;
//! use parkgrid_logic::spot::SpotClass;
//!
//! let layout = parse_layout("Redwood,1\n1,2\nhandicap\ncompact\n").unwrap();
//! assert_eq!(layout.name, "Redwood");
//! assert_eq!(layout.count(SpotClass::Compact), 1);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spot::SpotClass;

/// Build-time description of a whole facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityLayout {
    pub name: String,
    pub levels: Vec<LevelLayout>,
}

/// Build-time description of one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub rows: u32,
    pub spaces: u32,
    /// Row-major, length `rows * spaces`.
    pub spots: Vec<SpotClass>,
}

impl LevelLayout {
    /// Level whose rows are filled in bands: `(row_count, class)` pairs from the
    /// entrance-side row outward.
    pub fn banded(spaces: u32, bands: &[(u32, SpotClass)]) -> Self {
        let rows = bands.iter().map(|(n, _)| n).sum();
        let spots = bands
            .iter()
            .flat_map(|&(n, class)| {
                (0..n).flat_map(move |_| std::iter::repeat(class).take(spaces as usize))
            })
            .collect();
        Self {
            rows,
            spaces,
            spots,
        }
    }
}

impl FacilityLayout {
    pub fn capacity(&self) -> usize {
        self.levels.iter().map(|l| l.spots.len()).sum()
    }

    /// Number of spots of `class` across all levels.
    pub fn count(&self, class: SpotClass) -> usize {
        self.levels
            .iter()
            .flat_map(|l| l.spots.iter())
            .filter(|&&c| c == class)
            .count()
    }
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("cannot read layout {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("layout is empty: expected a '<name>,<levels>' header")]
    MissingHeader,

    #[error("line {line}: expected two comma-separated fields, found {text:?}")]
    MalformedPair { line: usize, text: String },

    #[error("line {line}: {text:?} is not a non-negative integer")]
    MalformedNumber { line: usize, text: String },

    #[error("line {line}: unknown spot class {text:?} (expected handicap, compact or large)")]
    UnknownSpotClass { line: usize, text: String },

    #[error("layout ends before level {level} is complete")]
    Truncated { level: u32 },

    #[error("line {line}: unexpected content after the last level")]
    TrailingContent { line: usize },

    #[error("invalid JSON layout: {0}")]
    Json(#[from] serde_json::Error),

    #[error("facility name is empty")]
    EmptyName,

    #[error("facility has no levels")]
    NoLevels,

    #[error("level {level} has zero rows or zero spaces")]
    EmptyLevel { level: u32 },

    #[error("level {level} lists {found} spots, expected {expected}")]
    SpotCountMismatch {
        level: u32,
        expected: usize,
        found: usize,
    },
}

/// Check a layout's structure, returning every problem found.
pub fn validate_layout(layout: &FacilityLayout) -> Vec<LayoutError> {
    let mut errors = Vec::new();

    if layout.name.trim().is_empty() {
        errors.push(LayoutError::EmptyName);
    }
    if layout.levels.is_empty() {
        errors.push(LayoutError::NoLevels);
    }

    for (i, level) in layout.levels.iter().enumerate() {
        let number = i as u32 + 1;
        if level.rows == 0 || level.spaces == 0 {
            errors.push(LayoutError::EmptyLevel { level: number });
            continue;
        }
        let expected = level.rows as usize * level.spaces as usize;
        if level.spots.len() != expected {
            errors.push(LayoutError::SpotCountMismatch {
                level: number,
                expected,
                found: level.spots.len(),
            });
        }
    }

    errors
}

fn first_error(layout: FacilityLayout) -> Result<FacilityLayout, LayoutError> {
    match validate_layout(&layout).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(layout),
    }
}

fn split_pair(line: usize, text: &str) -> Result<(&str, &str), LayoutError> {
    text.split_once(',')
        .map(|(a, b)| (a.trim(), b.trim()))
        .ok_or_else(|| LayoutError::MalformedPair {
            line,
            text: text.to_string(),
        })
}

fn parse_number(line: usize, text: &str) -> Result<u32, LayoutError> {
    text.parse().map_err(|_| LayoutError::MalformedNumber {
        line,
        text: text.to_string(),
    })
}

/// Parse the line-oriented text format.
pub fn parse_layout(text: &str) -> Result<FacilityLayout, LayoutError> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));

    let (line, header) = lines
        .next()
        .filter(|(_, l)| !l.is_empty())
        .ok_or(LayoutError::MissingHeader)?;
    let (name, count) = split_pair(line, header)?;
    let level_count = parse_number(line, count)?;

    // Counts come from the file, so vectors grow with the lines actually read.
    let mut levels = Vec::new();
    for level in 1..=level_count {
        let (line, dims) = lines.next().ok_or(LayoutError::Truncated { level })?;
        let (rows, spaces) = split_pair(line, dims)?;
        let rows = parse_number(line, rows)?;
        let spaces = parse_number(line, spaces)?;

        let total = u64::from(rows) * u64::from(spaces);
        let mut spots = Vec::new();
        for _ in 0..total {
            let (line, text) = lines.next().ok_or(LayoutError::Truncated { level })?;
            let class = text
                .parse::<SpotClass>()
                .map_err(|text| LayoutError::UnknownSpotClass { line, text })?;
            spots.push(class);
        }
        levels.push(LevelLayout {
            rows,
            spaces,
            spots,
        });
    }

    if let Some((line, _)) = lines.find(|(_, l)| !l.is_empty()) {
        return Err(LayoutError::TrailingContent { line });
    }

    first_error(FacilityLayout {
        name: name.to_string(),
        levels,
    })
}

/// Parse a JSON layout (`{"name": .., "levels": [{"rows", "spaces", "spots"}]}`).
pub fn layout_from_json(text: &str) -> Result<FacilityLayout, LayoutError> {
    let layout: FacilityLayout = serde_json::from_str(text)?;
    first_error(layout)
}

/// Load a layout file; a `.json` extension selects the JSON format.
pub fn load_layout(path: impl AsRef<Path>) -> Result<FacilityLayout, LayoutError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        layout_from_json(&text)
    } else {
        parse_layout(&text)
    }
}
