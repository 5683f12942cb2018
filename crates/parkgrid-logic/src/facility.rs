//! The facility: spot inventory, free-pool bookkeeping and the park/unpark engine.
//!
//! A [`Facility`] owns every level and spot, the three free pools, the ticket
//! map and every ticket ever issued. All mutation goes through
//! [`Facility::park_customer`] and [`Facility::unpark_customer`], each of which
//! assigns/closes the ticket, moves the spot between pool and "filled", and
//! refreshes the best-spot cache before returning. Callers sharing a facility
//! across threads wrap it in one lock so that whole sequence is atomic.
//!
//! ```
//! use parkgrid_logic::customer::{CarSize, Customer};
//! use parkgrid_logic::facility::Facility;
//! use parkgrid_logic::layout::parse_layout;
//! use parkgrid_logic::spot::Location;
//! use std::time::SystemTime;
//!
//! let layout = parse_layout("Oak,1\n1,2\nhandicap\nlarge\n").unwrap();
//! let mut facility = Facility::from_layout(&layout).unwrap();
//! let now = SystemTime::now();
//!
//! let ticket = facility
//!     .park_customer(Customer::new(CarSize::LargeCar, false), now)
//!     .unwrap();
//! assert_eq!(ticket.location(), Location::new(1, 1, 2));
//!
//! let closed = facility.unpark_customer(Location::new(1, 1, 2), now).unwrap();
//! assert_eq!(closed.charge(), Some(7.5));
//! ```

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::billing::{validate_rate_card, RateCard, RateCardError};
use crate::customer::{CarSize, Customer};
use crate::layout::{validate_layout, FacilityLayout, LayoutError};
use crate::level::Level;
use crate::pools::FreePools;
use crate::report::OccupancySnapshot;
use crate::selection::{self, BestSpots};
use crate::spot::{Location, Spot, SpotClass};
use crate::ticket::{Ticket, TicketId};
use crate::ticket_map::TicketMap;
use crate::validation::{check_unpark_location, InvalidInput, Operation, ParkError};

#[derive(Debug, Error)]
pub enum FacilityError {
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("invalid rate card: {0}")]
    RateCard(#[from] RateCardError),
}

/// A broken bookkeeping invariant. Any of these is a bug in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("spot {0:?} is filled but still in a free pool")]
    FilledAndFree(Location),
    #[error("spot {0:?} is neither filled nor in a free pool")]
    Lost(Location),
    #[error("spot {location:?} of class {class} sits in the {pool} pool")]
    WrongPool {
        location: Location,
        class: SpotClass,
        pool: SpotClass,
    },
    #[error("spot {0:?} appears more than once in the free pools")]
    DuplicateInPool(Location),
    #[error("pool entry {0:?} does not address a spot")]
    UnknownPoolEntry(Location),
    #[error("ticket map at {location:?} disagrees with filled={filled}")]
    TicketMapMismatch { location: Location, filled: bool },
    #[error("ticket map at {location:?} holds ticket {ticket} which is not its open occupant")]
    StaleTicket { location: Location, ticket: TicketId },
    #[error("open ticket {0} is missing from the ticket map")]
    OrphanedTicket(TicketId),
    #[error("ticket at position {index} has id {id}, expected {expected}")]
    TicketSequence {
        index: usize,
        id: TicketId,
        expected: TicketId,
    },
    #[error("best-spot cache is stale")]
    StaleCache,
}

/// Headline counts for dashboards and the harness summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyStats {
    pub capacity: usize,
    pub occupied: usize,
    pub free_handicap: usize,
    pub free_compact: usize,
    pub free_large: usize,
    pub tickets_issued: usize,
    pub open_tickets: usize,
}

#[derive(Debug, Clone)]
pub struct Facility {
    name: String,
    levels: Vec<Level>,
    pools: FreePools,
    ticket_map: TicketMap,
    /// Every ticket ever issued; `tickets[i]` has id `i + 1`.
    tickets: Vec<Ticket>,
    ticket_count: u32,
    best_spots: BestSpots,
    rates: RateCard,
}

impl Facility {
    /// Build a facility with the default rate card.
    pub fn from_layout(layout: &FacilityLayout) -> Result<Self, FacilityError> {
        Self::with_rate_card(layout, RateCard::default())
    }

    pub fn with_rate_card(layout: &FacilityLayout, rates: RateCard) -> Result<Self, FacilityError> {
        if let Some(err) = validate_layout(layout).into_iter().next() {
            return Err(err.into());
        }
        if let Some(err) = validate_rate_card(&rates).into_iter().next() {
            return Err(err.into());
        }

        let levels = layout
            .levels
            .iter()
            .enumerate()
            .map(|(i, l)| Level::from_layout(i as u32 + 1, l))
            .collect::<Result<Vec<_>, _>>()?;

        let mut pools = FreePools::new();
        for spot in levels.iter().flat_map(Level::spots) {
            pools.push(spot.class(), spot.location());
        }

        let ticket_map = TicketMap::for_levels(&levels);
        let best_spots = BestSpots::compute(&pools);

        log::info!(
            "Facility '{}' ready: {} levels, {} handicap / {} compact / {} large spots",
            layout.name,
            levels.len(),
            pools.free(SpotClass::Handicap),
            pools.free(SpotClass::Compact),
            pools.free(SpotClass::Large),
        );

        Ok(Self {
            name: layout.name.clone(),
            levels,
            pools,
            ticket_map,
            tickets: Vec::new(),
            ticket_count: 0,
            best_spots,
            rates,
        })
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Level by 1-based number.
    pub fn level(&self, number: u32) -> Option<&Level> {
        self.levels.get(number.checked_sub(1)? as usize)
    }

    pub fn spot(&self, location: Location) -> Option<&Spot> {
        self.level(location.level)?
            .spot(location.row, location.space)
    }

    fn spot_mut(&mut self, location: Location) -> Option<&mut Spot> {
        self.levels
            .get_mut(location.level.checked_sub(1)? as usize)?
            .spot_mut(location.row, location.space)
    }

    pub fn pools(&self) -> &FreePools {
        &self.pools
    }

    pub fn best_spots(&self) -> &BestSpots {
        &self.best_spots
    }

    pub fn ticket_map(&self) -> &TicketMap {
        &self.ticket_map
    }

    pub fn rate_card(&self) -> &RateCard {
        &self.rates
    }

    /// Every ticket issued so far, open and closed, in id order.
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn ticket(&self, id: TicketId) -> Option<&Ticket> {
        self.tickets.get(id.0.checked_sub(1)? as usize)
    }

    /// The open ticket parked at `location`, if any.
    pub fn ticket_at(&self, location: Location) -> Option<&Ticket> {
        self.ticket(self.ticket_map.get(location)?)
    }

    pub fn capacity(&self) -> usize {
        self.levels.iter().map(Level::capacity).sum()
    }

    pub fn stats(&self) -> OccupancyStats {
        OccupancyStats {
            capacity: self.capacity(),
            occupied: self.capacity() - self.pools.total_free(),
            free_handicap: self.pools.free(SpotClass::Handicap),
            free_compact: self.pools.free(SpotClass::Compact),
            free_large: self.pools.free(SpotClass::Large),
            tickets_issued: self.tickets.len(),
            open_tickets: self.tickets.iter().filter(|t| t.is_open()).count(),
        }
    }

    /// Cheap copy of the ticket map's labels for rendering outside a lock.
    pub fn occupancy_snapshot(&self) -> OccupancySnapshot {
        OccupancySnapshot::capture(self)
    }

    // ── Selection ───────────────────────────────────────────────────────

    pub fn is_spot_available(&self, size: CarSize, accessible: bool) -> bool {
        selection::is_spot_available(&self.pools, size, accessible)
    }

    /// Best spot for this customer according to the cache.
    pub fn select_best_spot(&self, customer: &Customer) -> Option<Location> {
        self.best_spots
            .get(selection::priority_for(&self.pools, customer))
    }

    // ── Mutation ────────────────────────────────────────────────────────

    /// Park a customer at the best eligible spot.
    ///
    /// Returns `None` when nothing fits; that is a normal outcome, and no state
    /// changes.
    pub fn park_customer(&mut self, customer: Customer, now: SystemTime) -> Option<&Ticket> {
        if !self.is_spot_available(customer.size, customer.accessible) {
            log::warn!(
                "No spot available for {} (placard: {})",
                customer.size,
                customer.accessible
            );
            return None;
        }

        let location = self.select_best_spot(&customer);
        debug_assert!(
            location.is_some(),
            "availability and best-spot cache disagree for {customer:?}"
        );
        let location = location?;
        let class = self.spot(location)?.class();

        self.ticket_count += 1;
        let ticket = Ticket::open(TicketId(self.ticket_count), location, class, customer, now);
        let id = self.allocate(ticket);

        log::info!(
            "Ticket {} issued: {} ({}) at {}",
            id,
            customer.size,
            customer.label(),
            location
        );
        self.ticket(id)
    }

    /// Close the ticket parked at `location` and release its spot.
    ///
    /// Fails with `InvalidInput` when the location is out of bounds or empty;
    /// the facility is untouched in that case.
    pub fn unpark_customer(&mut self, location: Location, now: SystemTime) -> Result<&Ticket, ParkError> {
        let invalid = |reason| {
            ParkError::invalid(
                Operation::Unpark,
                format!("({}, {}, {})", location.level, location.row, location.space),
                reason,
            )
        };
        check_unpark_location(self, location).map_err(invalid)?;

        let id = self.ticket_map.get(location);
        debug_assert!(id.is_some(), "filled spot {location:?} has no ticket map entry");
        let Some(idx) = id.and_then(|id| id.0.checked_sub(1)).map(|i| i as usize) else {
            return Err(invalid(InvalidInput::LocationEmpty(location)));
        };

        let charge = self.tickets[idx].close(now, &self.rates);
        let id = self.tickets[idx].id();
        self.deallocate(idx);

        log::info!("Ticket {} closed at {}: charge {:.2}", id, location, charge);
        Ok(&self.tickets[idx])
    }

    /// Move the ticket's spot from its free pool to filled, record the ticket,
    /// then refresh the cache.
    fn allocate(&mut self, ticket: Ticket) -> TicketId {
        let id = ticket.id();
        let location = ticket.location();
        let class = ticket.spot_class();

        let removed = self.pools.remove(class, location);
        debug_assert!(removed, "allocating {location:?} which is not free");
        if let Some(spot) = self.spot_mut(location) {
            debug_assert!(!spot.is_filled());
            spot.set_filled(true);
        }
        let previous = self.ticket_map.set(location, Some(id));
        debug_assert!(previous.is_none(), "ticket map at {location:?} already held {previous:?}");

        self.tickets.push(ticket);
        self.refresh_best_spots();
        id
    }

    /// Reverse of [`Facility::allocate`] for the ticket at `idx`.
    fn deallocate(&mut self, idx: usize) {
        let id = self.tickets[idx].id();
        let location = self.tickets[idx].location();
        let class = self.tickets[idx].spot_class();

        let previous = self.ticket_map.set(location, None);
        debug_assert_eq!(previous, Some(id));
        if let Some(spot) = self.spot_mut(location) {
            debug_assert!(spot.is_filled());
            spot.set_filled(false);
        }
        self.pools.push(class, location);
        self.refresh_best_spots();
    }

    fn refresh_best_spots(&mut self) {
        self.best_spots = BestSpots::compute(&self.pools);
        log::debug!("Best spots refreshed: {:?}", self.best_spots.slots());
    }

    // ── Invariants ──────────────────────────────────────────────────────

    /// Check every bookkeeping invariant, returning all violations found.
    pub fn audit(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        let mut seen = std::collections::HashSet::new();
        for pool in SpotClass::all() {
            for &location in self.pools.pool(pool) {
                if !seen.insert(location) {
                    violations.push(InvariantViolation::DuplicateInPool(location));
                }
                match self.spot(location) {
                    None => violations.push(InvariantViolation::UnknownPoolEntry(location)),
                    Some(spot) if spot.class() != pool => {
                        violations.push(InvariantViolation::WrongPool {
                            location,
                            class: spot.class(),
                            pool,
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        for spot in self.levels.iter().flat_map(Level::spots) {
            let location = spot.location();
            let free = seen.contains(&location);
            match (spot.is_filled(), free) {
                (true, true) => violations.push(InvariantViolation::FilledAndFree(location)),
                (false, false) => violations.push(InvariantViolation::Lost(location)),
                _ => {}
            }

            match self.ticket_map.get(location) {
                Some(id) if spot.is_filled() => {
                    let occupant = self
                        .ticket(id)
                        .filter(|t| t.is_open() && t.location() == location);
                    if occupant.is_none() {
                        violations.push(InvariantViolation::StaleTicket { location, ticket: id });
                    }
                }
                None if !spot.is_filled() => {}
                _ => violations.push(InvariantViolation::TicketMapMismatch {
                    location,
                    filled: spot.is_filled(),
                }),
            }
        }

        for (index, ticket) in self.tickets.iter().enumerate() {
            let expected = TicketId(index as u32 + 1);
            if ticket.id() != expected {
                violations.push(InvariantViolation::TicketSequence {
                    index,
                    id: ticket.id(),
                    expected,
                });
            }
            if ticket.is_open() && self.ticket_map.get(ticket.location()) != Some(ticket.id()) {
                violations.push(InvariantViolation::OrphanedTicket(ticket.id()));
            }
        }

        if self.best_spots != BestSpots::compute(&self.pools) {
            violations.push(InvariantViolation::StaleCache);
        }

        violations
    }
}
