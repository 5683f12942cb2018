//! The dispatch desk: every park and unpark runs inside one critical section.
//!
//! The lock covers ticket-id assignment, allocation or deallocation, and the
//! best-spot cache refresh. Nothing inside it blocks on I/O. Callers that want
//! to print a map or receipt ask for the `_ticketed` variants, which hand back
//! a snapshot captured under the lock so rendering happens after release.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use parkgrid_logic::customer::{CarSize, Customer};
use parkgrid_logic::facility::Facility;
use parkgrid_logic::report::OccupancySnapshot;
use parkgrid_logic::spot::Location;
use parkgrid_logic::ticket::Ticket;
use parkgrid_logic::validation::{validate_park_request, validate_unpark_request, ParkError};

use crate::clock::{Clock, SystemClock};

/// A freshly issued ticket and the occupancy right after it was issued.
#[derive(Debug, Clone)]
pub struct ParkReceipt {
    pub ticket: Ticket,
    pub snapshot: OccupancySnapshot,
}

/// A closed ticket and the occupancy right after its spot was released.
#[derive(Debug, Clone)]
pub struct UnparkReceipt {
    pub ticket: Ticket,
    pub snapshot: OccupancySnapshot,
}

impl UnparkReceipt {
    pub fn charge(&self) -> f64 {
        self.ticket.charge().unwrap_or_default()
    }
}

pub struct ParkingDesk {
    facility: Mutex<Facility>,
    clock: Arc<dyn Clock>,
}

impl ParkingDesk {
    pub fn new(facility: Facility) -> Self {
        Self::with_clock(facility, Arc::new(SystemClock))
    }

    pub fn with_clock(facility: Facility, clock: Arc<dyn Clock>) -> Self {
        Self {
            facility: Mutex::new(facility),
            clock,
        }
    }

    /// Park from loosely typed arguments. `Ok(None)` means no eligible spot.
    pub fn park(&self, size: &Value, accessible: &Value) -> Result<Option<Location>, ParkError> {
        let customer = validate_park_request(size, accessible).inspect_err(log_rejected)?;
        Ok(self.park_vehicle(customer.size, customer.accessible))
    }

    /// Unpark from a loosely typed `[level, row, space]`, returning the charge.
    pub fn unpark(&self, location: &Value) -> Result<f64, ParkError> {
        self.unpark_ticketed(location).map(|receipt| receipt.charge())
    }

    pub fn park_vehicle(&self, size: CarSize, accessible: bool) -> Option<Location> {
        let mut facility = self.facility.lock();
        let now = self.clock.now();
        facility
            .park_customer(Customer::new(size, accessible), now)
            .map(Ticket::location)
    }

    pub fn unpark_at(&self, location: Location) -> Result<f64, ParkError> {
        let mut facility = self.facility.lock();
        let now = self.clock.now();
        facility
            .unpark_customer(location, now)
            .map(|t| t.charge().unwrap_or_default())
            .inspect_err(log_rejected)
    }

    /// Like [`ParkingDesk::park`], also returning the ticket and a snapshot.
    pub fn park_ticketed(&self, size: &Value, accessible: &Value) -> Result<Option<ParkReceipt>, ParkError> {
        let customer = validate_park_request(size, accessible).inspect_err(log_rejected)?;

        let mut facility = self.facility.lock();
        let now = self.clock.now();
        let Some(ticket) = facility.park_customer(customer, now).cloned() else {
            return Ok(None);
        };
        Ok(Some(ParkReceipt {
            ticket,
            snapshot: facility.occupancy_snapshot(),
        }))
    }

    /// Like [`ParkingDesk::unpark`], also returning the closed ticket and a
    /// snapshot.
    pub fn unpark_ticketed(&self, location: &Value) -> Result<UnparkReceipt, ParkError> {
        let mut facility = self.facility.lock();
        let location = validate_unpark_request(&facility, location).inspect_err(log_rejected)?;
        let now = self.clock.now();
        let ticket = facility
            .unpark_customer(location, now)
            .cloned()
            .inspect_err(log_rejected)?;
        Ok(UnparkReceipt {
            ticket,
            snapshot: facility.occupancy_snapshot(),
        })
    }

    /// Read the facility under the lock.
    pub fn inspect<R>(&self, f: impl FnOnce(&Facility) -> R) -> R {
        f(&*self.facility.lock())
    }

    pub fn snapshot(&self) -> OccupancySnapshot {
        self.inspect(Facility::occupancy_snapshot)
    }

    pub fn into_inner(self) -> Facility {
        self.facility.into_inner()
    }
}

fn log_rejected(err: &ParkError) {
    log::warn!("Rejected request: {}", err);
}
