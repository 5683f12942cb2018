//! Tickets: the allocation record for one stay, open until closed on exit.

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::billing::{compute_charge, rate_for, RateCard};
use crate::customer::{Customer, OccupancyLabel};
use crate::spot::{Location, SpotClass};

/// Facility-scoped ticket number, 1-based in issuance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TicketId(pub u32);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    id: TicketId,
    location: Location,
    /// Class of the spot actually occupied, which may differ from the car size.
    spot_class: SpotClass,
    customer: Customer,
    label: OccupancyLabel,
    start: SystemTime,
    end: Option<SystemTime>,
    elapsed_secs: Option<f64>,
    charge: Option<f64>,
}

impl Ticket {
    pub fn open(
        id: TicketId,
        location: Location,
        spot_class: SpotClass,
        customer: Customer,
        now: SystemTime,
    ) -> Self {
        Self {
            id,
            location,
            spot_class,
            customer,
            label: customer.label(),
            start: now,
            end: None,
            elapsed_secs: None,
            charge: None,
        }
    }

    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn spot_class(&self) -> SpotClass {
        self.spot_class
    }

    pub fn customer(&self) -> Customer {
        self.customer
    }

    pub fn label(&self) -> OccupancyLabel {
        self.label
    }

    pub fn start(&self) -> SystemTime {
        self.start
    }

    pub fn end(&self) -> Option<SystemTime> {
        self.end
    }

    pub fn elapsed_secs(&self) -> Option<f64> {
        self.elapsed_secs
    }

    pub fn charge(&self) -> Option<f64> {
        self.charge
    }

    pub fn state(&self) -> TicketState {
        if self.end.is_some() {
            TicketState::Closed
        } else {
            TicketState::Open
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == TicketState::Open
    }

    /// Per-interval rate this stay is billed at.
    pub fn rate(&self, card: &RateCard) -> f64 {
        rate_for(self.customer.accessible, self.spot_class, card)
    }

    /// Stamp the end time and compute the charge. Closing is terminal; a
    /// second call leaves the ticket untouched and returns the first charge.
    pub fn close(&mut self, now: SystemTime, card: &RateCard) -> f64 {
        if let Some(charge) = self.charge {
            log::warn!("Ticket {} already closed, keeping charge {:.2}", self.id, charge);
            return charge;
        }

        debug_assert!(
            now >= self.start,
            "clock moved backwards while ticket {} was open",
            self.id
        );
        let elapsed = now.duration_since(self.start).unwrap_or_else(|e| {
            log::error!(
                "Ticket {} closed {:?} before it opened; billing zero elapsed",
                self.id,
                e.duration()
            );
            Duration::ZERO
        });

        let elapsed_secs = elapsed.as_secs_f64();
        let charge = compute_charge(elapsed_secs, self.rate(card), card);
        self.end = Some(now);
        self.elapsed_secs = Some(elapsed_secs);
        self.charge = Some(charge);
        charge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::CarSize;

    fn t0() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn ticket(size: CarSize, accessible: bool, class: SpotClass) -> Ticket {
        Ticket::open(
            TicketId(1),
            Location::new(1, 1, 1),
            class,
            Customer::new(size, accessible),
            t0(),
        )
    }

    #[test]
    fn open_ticket_has_no_billing_fields() {
        let t = ticket(CarSize::CompactCar, true, SpotClass::Handicap);
        assert!(t.is_open());
        assert_eq!(t.end(), None);
        assert_eq!(t.elapsed_secs(), None);
        assert_eq!(t.charge(), None);
        assert_eq!(t.label(), OccupancyLabel::HandicapCompact);
    }

    #[test]
    fn close_stamps_end_and_charge() {
        let card = RateCard::default();
        let mut t = ticket(CarSize::LargeCar, false, SpotClass::Large);
        let end = t0() + Duration::from_secs(40 * 60);
        let charge = t.close(end, &card);
        assert_eq!(charge, 22.5);
        assert_eq!(t.state(), TicketState::Closed);
        assert_eq!(t.end(), Some(end));
        assert_eq!(t.elapsed_secs(), Some(2400.0));
        assert_eq!(t.charge(), Some(22.5));
    }

    #[test]
    fn closing_twice_keeps_first_charge() {
        let card = RateCard::default();
        let mut t = ticket(CarSize::LargeCar, false, SpotClass::Large);
        let first = t.close(t0() + Duration::from_secs(60), &card);
        let second = t.close(t0() + Duration::from_secs(86_400), &card);
        assert_eq!(first, 7.5);
        assert_eq!(second, 7.5);
        assert_eq!(t.end(), Some(t0() + Duration::from_secs(60)));
    }

    #[test]
    fn compact_car_in_large_spot_pays_standard_rate() {
        let card = RateCard::default();
        let mut t = ticket(CarSize::CompactCar, false, SpotClass::Large);
        assert_eq!(t.close(t0(), &card), 7.5);
    }

    #[test]
    fn placard_in_large_spot_pays_reduced_rate() {
        let card = RateCard::default();
        let mut t = ticket(CarSize::LargeCar, true, SpotClass::Large);
        assert_eq!(t.close(t0(), &card), 5.0);
    }

    #[test]
    fn day_long_stays() {
        let card = RateCard::default();
        let day = t0() + Duration::from_secs(24 * 3600);

        let mut accessible = ticket(CarSize::LargeCar, true, SpotClass::Handicap);
        assert_eq!(accessible.close(day, &card), 480.0);

        let mut standard = ticket(CarSize::LargeCar, false, SpotClass::Large);
        assert_eq!(standard.close(day, &card), 720.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "clock moved backwards")]
    fn closing_before_opening_is_a_defect() {
        let mut t = ticket(CarSize::CompactCar, false, SpotClass::Compact);
        t.close(t0() - Duration::from_secs(1), &RateCard::default());
    }
}
