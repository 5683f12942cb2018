//! Pure billing logic: rate selection, interval counting and charge rounding.
//!
//! Charges are a step function of elapsed time: anything under the minimum
//! stay costs one rate unit, after that every started interval is billed.
//! Only whole elapsed minutes count toward intervals, so 15m59s bills the
//! same as 15m00s.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spot::SpotClass;

/// Stays shorter than this are billed one flat rate unit.
pub const MINIMUM_PARKING_INTERVAL_SECONDS: u64 = 15 * 60;

/// Pricing parameters for a facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    /// Per-interval rate for placard holders and compact spots.
    pub reduced_rate: f64,
    /// Per-interval rate for everything else.
    pub standard_rate: f64,
    pub minimum_seconds: u64,
    pub interval_minutes: u64,
}

impl Default for RateCard {
    fn default() -> Self {
        Self {
            reduced_rate: 5.00,
            standard_rate: 7.50,
            minimum_seconds: MINIMUM_PARKING_INTERVAL_SECONDS,
            interval_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateCardError {
    #[error("reduced rate must be positive, got {0}")]
    NonPositiveReducedRate(f64),
    #[error("standard rate must be positive, got {0}")]
    NonPositiveStandardRate(f64),
    #[error("billing interval must be at least one minute")]
    ZeroInterval,
    #[error("minimum stay of {minimum_seconds}s is shorter than the {interval_seconds}s billing interval")]
    MinimumBelowInterval {
        minimum_seconds: u64,
        interval_seconds: u64,
    },
}

/// Validate a rate card, returning all errors found.
pub fn validate_rate_card(card: &RateCard) -> Vec<RateCardError> {
    let mut errors = Vec::new();
    if !(card.reduced_rate > 0.0) {
        errors.push(RateCardError::NonPositiveReducedRate(card.reduced_rate));
    }
    if !(card.standard_rate > 0.0) {
        errors.push(RateCardError::NonPositiveStandardRate(card.standard_rate));
    }
    let interval_seconds = card.interval_minutes.saturating_mul(60);
    if card.interval_minutes == 0 {
        errors.push(RateCardError::ZeroInterval);
    } else if card.minimum_seconds < interval_seconds {
        errors.push(RateCardError::MinimumBelowInterval {
            minimum_seconds: card.minimum_seconds,
            interval_seconds,
        });
    }
    errors
}

/// Per-interval rate for a stay.
///
/// Keyed on the placard and on the class of the spot actually occupied, not
/// the requested car size: a compact car pushed into a large spot pays the
/// standard rate, a placard holder in a large spot pays the reduced one.
pub fn rate_for(accessible: bool, occupied: SpotClass, card: &RateCard) -> f64 {
    if accessible || occupied == SpotClass::Compact {
        card.reduced_rate
    } else {
        card.standard_rate
    }
}

/// Number of started intervals in `elapsed_secs`, counting whole minutes only.
pub fn billable_intervals(elapsed_secs: f64, card: &RateCard) -> u64 {
    let minutes = (elapsed_secs.max(0.0) / 60.0).floor() as u64;
    minutes.div_ceil(card.interval_minutes.max(1))
}

/// Round to cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Charge for a stay of `elapsed_secs` at `rate` per interval. Never less
/// than one rate unit, whatever the card says.
pub fn compute_charge(elapsed_secs: f64, rate: f64, card: &RateCard) -> f64 {
    if elapsed_secs < card.minimum_seconds as f64 {
        return rate;
    }
    let intervals = billable_intervals(elapsed_secs, card).max(1);
    round_cents(rate * intervals as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: f64 = 3600.0;

    #[test]
    fn default_card_is_valid() {
        assert!(validate_rate_card(&RateCard::default()).is_empty());
    }

    #[test]
    fn invalid_card_reports_everything() {
        let card = RateCard {
            reduced_rate: 0.0,
            standard_rate: -1.0,
            minimum_seconds: 0,
            interval_minutes: 0,
        };
        assert_eq!(validate_rate_card(&card).len(), 3);
        assert!(validate_rate_card(&card).contains(&RateCardError::ZeroInterval));
    }

    #[test]
    fn minimum_shorter_than_interval_is_invalid() {
        let card = RateCard {
            minimum_seconds: 0,
            ..RateCard::default()
        };
        assert_eq!(
            validate_rate_card(&card),
            vec![RateCardError::MinimumBelowInterval {
                minimum_seconds: 0,
                interval_seconds: 900,
            }]
        );

        let card = RateCard {
            minimum_seconds: 3600,
            interval_minutes: 60,
            ..RateCard::default()
        };
        assert!(validate_rate_card(&card).is_empty());
    }

    #[test]
    fn zero_minimum_still_charges_one_unit() {
        let card = RateCard {
            minimum_seconds: 0,
            ..RateCard::default()
        };
        assert_eq!(compute_charge(10.0, 7.5, &card), 7.5);
        assert_eq!(compute_charge(0.0, 5.0, &card), 5.0);
        assert_eq!(compute_charge(16.0 * 60.0, 5.0, &card), 10.0);
    }

    #[test]
    fn nan_rate_is_invalid() {
        let card = RateCard {
            standard_rate: f64::NAN,
            ..RateCard::default()
        };
        assert_eq!(validate_rate_card(&card).len(), 1);
    }

    #[test]
    fn rate_selection() {
        let card = RateCard::default();
        assert_eq!(rate_for(true, SpotClass::Handicap, &card), 5.0);
        assert_eq!(rate_for(true, SpotClass::Large, &card), 5.0);
        assert_eq!(rate_for(false, SpotClass::Compact, &card), 5.0);
        assert_eq!(rate_for(false, SpotClass::Large, &card), 7.5);
    }

    #[test]
    fn short_stays_pay_one_unit() {
        let card = RateCard::default();
        assert_eq!(compute_charge(0.0, 7.5, &card), 7.5);
        assert_eq!(compute_charge(899.9, 7.5, &card), 7.5);
        assert_eq!(compute_charge(0.0, 5.0, &card), 5.0);
    }

    #[test]
    fn partial_intervals_round_up_on_whole_minutes() {
        let card = RateCard::default();
        assert_eq!(billable_intervals(900.0, &card), 1);
        assert_eq!(billable_intervals(959.0, &card), 1);
        assert_eq!(billable_intervals(960.0, &card), 2);
        assert_eq!(billable_intervals(30.0 * 60.0, &card), 2);
        assert_eq!(billable_intervals(31.0 * 60.0, &card), 3);
    }

    #[test]
    fn full_day() {
        let card = RateCard::default();
        assert_eq!(billable_intervals(24.0 * HOUR, &card), 96);
        assert_eq!(compute_charge(24.0 * HOUR, 7.5, &card), 720.0);
        assert_eq!(compute_charge(24.0 * HOUR, 5.0, &card), 480.0);
    }

    #[test]
    fn charge_rounds_to_cents() {
        let card = RateCard {
            reduced_rate: 1.333,
            ..RateCard::default()
        };
        assert_eq!(compute_charge(HOUR, card.reduced_rate, &card), 5.33);
    }

    #[test]
    fn custom_interval() {
        let card = RateCard {
            interval_minutes: 60,
            ..RateCard::default()
        };
        assert_eq!(billable_intervals(61.0 * 60.0, &card), 2);
        assert_eq!(compute_charge(2.0 * HOUR, 7.5, &card), 15.0);
    }
}
