//! Text rendering for attendants: occupancy maps, park tickets, receipts.
//!
//! Rendering works from an [`OccupancySnapshot`] rather than the live
//! facility, so a caller holding a lock can capture, release, then format.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::customer::OccupancyLabel;
use crate::facility::Facility;
use crate::spot::Location;
use crate::ticket::Ticket;

/// Width of one map cell; fits the longest marker.
const CELL_WIDTH: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub level: u32,
    pub rows: u32,
    pub spaces: u32,
    /// Row-major occupancy labels, `None` for a free spot.
    pub cells: Vec<Option<OccupancyLabel>>,
}

impl LevelSnapshot {
    pub fn cell(&self, row: u32, space: u32) -> Option<OccupancyLabel> {
        if row == 0 || space == 0 || row > self.rows || space > self.spaces {
            return None;
        }
        let idx = Location::new(self.level, row, space).grid_index(self.spaces);
        self.cells.get(idx).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    pub name: String,
    pub levels: Vec<LevelSnapshot>,
}

impl OccupancySnapshot {
    pub fn capture(facility: &Facility) -> Self {
        let levels = facility
            .ticket_map()
            .levels()
            .iter()
            .map(|grid| LevelSnapshot {
                level: grid.level,
                rows: grid.rows,
                spaces: grid.spaces,
                cells: grid
                    .cells
                    .iter()
                    .map(|cell| cell.and_then(|id| facility.ticket(id)).map(Ticket::label))
                    .collect(),
            })
            .collect();

        Self {
            name: facility.name().to_string(),
            levels,
        }
    }

    pub fn occupied(&self) -> usize {
        self.levels
            .iter()
            .flat_map(|l| l.cells.iter())
            .filter(|c| c.is_some())
            .count()
    }
}

/// Highlight for the cell an operation just touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMarker {
    Park(Location),
    Unpark(Location),
}

impl MapMarker {
    fn location(self) -> Location {
        match self {
            MapMarker::Park(l) | MapMarker::Unpark(l) => l,
        }
    }

    fn text(self) -> &'static str {
        match self {
            MapMarker::Park(_) => "Park",
            MapMarker::Unpark(_) => "unparking",
        }
    }
}

/// One grid per level: `S1..Sn` across, `R1..Rn` down, `0` for a free spot.
pub fn render_occupancy_map(snapshot: &OccupancySnapshot, marker: Option<MapMarker>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", snapshot.name);

    for level in &snapshot.levels {
        let _ = writeln!(out, "Level {}", level.level);

        let _ = write!(out, "{:<5}", "");
        for space in 1..=level.spaces {
            let _ = write!(out, "{:>CELL_WIDTH$}", format!("S{space}"));
        }
        out.push('\n');

        for row in 1..=level.rows {
            let _ = write!(out, "{:<5}", format!("R{row}"));
            for space in 1..=level.spaces {
                let here = Location::new(level.level, row, space);
                let text = match (marker, level.cell(row, space)) {
                    (Some(m), _) if m.location() == here => m.text(),
                    (_, Some(label)) => label.code(),
                    (_, None) => "0",
                };
                let _ = write!(out, "{text:>CELL_WIDTH$}");
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// `$5.00`
pub fn format_charge(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Whole seconds as `h:mm:ss`.
pub fn format_elapsed(secs: f64) -> String {
    let total = secs.max(0.0).floor() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

fn epoch_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn ticket_header(out: &mut String, name: &str, ticket: &Ticket) {
    let customer = ticket.customer();
    let _ = writeln!(out, "{name}");
    let _ = writeln!(out, "Ticket:   {}", ticket.id());
    let _ = writeln!(
        out,
        "Car:      {}{}",
        customer.size,
        if customer.accessible { " (placard)" } else { "" }
    );
    let _ = writeln!(out, "Location: {}", ticket.location());
    let _ = writeln!(out, "Start:    {}", epoch_secs(ticket.start()));
}

/// Slip handed over at the entrance.
pub fn render_park_ticket(name: &str, ticket: &Ticket) -> String {
    let mut out = String::new();
    ticket_header(&mut out, name, ticket);
    out
}

/// Slip handed over at the exit. An open ticket renders with its billing
/// lines marked pending.
pub fn render_receipt(name: &str, ticket: &Ticket) -> String {
    let mut out = String::new();
    ticket_header(&mut out, name, ticket);
    match (ticket.end(), ticket.elapsed_secs(), ticket.charge()) {
        (Some(end), Some(elapsed), Some(charge)) => {
            let _ = writeln!(out, "Finish:   {}", epoch_secs(end));
            let _ = writeln!(out, "Elapsed:  {}", format_elapsed(elapsed));
            let _ = writeln!(out, "Charge:   {}", format_charge(charge));
        }
        _ => {
            let _ = writeln!(out, "Charge:   pending");
        }
    }
    out
}
