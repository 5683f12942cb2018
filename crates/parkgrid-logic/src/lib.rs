//! Pure parking-facility logic for Parkgrid.
//!
//! This crate contains the whole allocation and billing engine, independent
//! of any lock, clock or front end. Time-dependent operations take `now` as a
//! parameter, so everything here is unit-testable and deterministic.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`billing`] | Rate card, interval rounding, charge computation |
//! | [`customer`] | Car sizes, customers, occupancy labels |
//! | [`facility`] | Spot inventory, park/unpark engine, invariant audit |
//! | [`layout`] | Layout descriptions, text/JSON loaders, validation |
//! | [`level`] | One level's row-major spot grid |
//! | [`pools`] | Per-class free-spot pools with stable ordering |
//! | [`report`] | Occupancy snapshots, maps, tickets and receipts |
//! | [`selection`] | Availability rules and the three-slot best-spot cache |
//! | [`spot`] | Spot classes, locations, entrance distance |
//! | [`ticket`] | Ticket lifecycle and closing |
//! | [`ticket_map`] | Per-level grid of open ticket ids |
//! | [`validation`] | Park/unpark request validation and errors |

pub mod billing;
pub mod customer;
pub mod facility;
pub mod layout;
pub mod level;
pub mod pools;
pub mod report;
pub mod selection;
pub mod spot;
pub mod ticket;
pub mod ticket_map;
pub mod validation;
