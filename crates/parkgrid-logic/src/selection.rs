//! Best-spot selection: availability rules and the three-slot nearest-spot cache.
//!
//! The cache keeps one precomputed answer per allocation intent:
//!
//! | Slot | Intent | Fallback chain |
//! |------|--------|----------------|
//! | 0 | [`CachePriority::Handicap`] | handicap → compact → large |
//! | 1 | [`CachePriority::Compact`] | compact → large |
//! | 2 | [`CachePriority::Large`] | large |
//!
//! Each slot holds the nearest spot of the first class in its chain whose pool
//! still has a free spot. [`BestSpots::compute`] rebuilds all three from the
//! pools; the facility calls it after every allocation and deallocation.

use serde::{Deserialize, Serialize};

use crate::customer::{CarSize, Customer};
use crate::pools::FreePools;
use crate::spot::{Location, SpotClass};

/// Allocation intent, doubling as the cache slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CachePriority {
    Handicap = 0,
    Compact = 1,
    Large = 2,
}

impl CachePriority {
    pub fn all() -> [CachePriority; 3] {
        [
            CachePriority::Handicap,
            CachePriority::Compact,
            CachePriority::Large,
        ]
    }

    /// Spot classes tried in order for this intent.
    pub fn fallback_chain(self) -> &'static [SpotClass] {
        match self {
            CachePriority::Handicap => &[SpotClass::Handicap, SpotClass::Compact, SpotClass::Large],
            CachePriority::Compact => &[SpotClass::Compact, SpotClass::Large],
            CachePriority::Large => &[SpotClass::Large],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestSpots {
    slots: [Option<Location>; 3],
}

impl BestSpots {
    /// Recompute every slot from the current pools.
    pub fn compute(pools: &FreePools) -> Self {
        let mut slots = [None; 3];
        for priority in CachePriority::all() {
            slots[priority as usize] = priority
                .fallback_chain()
                .iter()
                .find(|&&class| !pools.is_full(class))
                .and_then(|&class| pools.nearest(class));
        }
        Self { slots }
    }

    pub fn get(&self, priority: CachePriority) -> Option<Location> {
        self.slots[priority as usize]
    }

    pub fn slots(&self) -> [Option<Location>; 3] {
        self.slots
    }
}

/// Whether a spot exists that this customer may use.
///
/// Rules apply in order: everything full; placard + large needs a handicap or
/// large spot; compact without placard needs a compact or large spot; large
/// without placard needs a large spot.
pub fn is_spot_available(pools: &FreePools, size: CarSize, accessible: bool) -> bool {
    let h_full = pools.is_full(SpotClass::Handicap);
    let c_full = pools.is_full(SpotClass::Compact);
    let l_full = pools.is_full(SpotClass::Large);

    if h_full && c_full && l_full {
        return false;
    }
    match (accessible, size) {
        (true, CarSize::LargeCar) if h_full && l_full => false,
        (false, CarSize::CompactCar) if c_full && l_full => false,
        (false, CarSize::LargeCar) if l_full => false,
        _ => true,
    }
}

/// Which cache slot serves this customer.
pub fn priority_for(pools: &FreePools, customer: &Customer) -> CachePriority {
    match (customer.accessible, customer.size) {
        (true, CarSize::LargeCar) if pools.is_full(SpotClass::Handicap) => CachePriority::Large,
        (true, _) => CachePriority::Handicap,
        (false, CarSize::CompactCar) => CachePriority::Compact,
        (false, CarSize::LargeCar) => CachePriority::Large,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pools(h: &[(u32, u32, u32)], c: &[(u32, u32, u32)], l: &[(u32, u32, u32)]) -> FreePools {
        let mut pools = FreePools::new();
        for (class, locs) in [
            (SpotClass::Handicap, h),
            (SpotClass::Compact, c),
            (SpotClass::Large, l),
        ] {
            for &(lv, r, s) in locs {
                pools.push(class, Location::new(lv, r, s));
            }
        }
        pools
    }

    #[test]
    fn slots_follow_fallback_chains() {
        let p = pools(&[(1, 1, 2)], &[(2, 1, 1)], &[(2, 5, 1)]);
        let best = BestSpots::compute(&p);
        assert_eq!(best.get(CachePriority::Handicap), Some(Location::new(1, 1, 2)));
        assert_eq!(best.get(CachePriority::Compact), Some(Location::new(2, 1, 1)));
        assert_eq!(best.get(CachePriority::Large), Some(Location::new(2, 5, 1)));
    }

    #[test]
    fn handicap_slot_falls_back_to_compact_then_large() {
        let p = pools(&[], &[(2, 1, 1)], &[(1, 1, 1)]);
        // Large spot is closer, but compact comes first in the chain.
        assert_eq!(
            BestSpots::compute(&p).get(CachePriority::Handicap),
            Some(Location::new(2, 1, 1))
        );

        let p = pools(&[], &[], &[(2, 5, 1)]);
        let best = BestSpots::compute(&p);
        assert_eq!(best.get(CachePriority::Handicap), Some(Location::new(2, 5, 1)));
        assert_eq!(best.get(CachePriority::Compact), Some(Location::new(2, 5, 1)));
    }

    #[test]
    fn empty_pools_empty_slots() {
        let best = BestSpots::compute(&FreePools::new());
        assert_eq!(best.slots(), [None, None, None]);

        let p = pools(&[(1, 1, 1)], &[], &[]);
        let best = BestSpots::compute(&p);
        assert_eq!(best.get(CachePriority::Compact), None);
        assert_eq!(best.get(CachePriority::Large), None);
    }

    #[test]
    fn availability_everything_full() {
        let p = FreePools::new();
        for size in [CarSize::CompactCar, CarSize::LargeCar] {
            for accessible in [true, false] {
                assert!(!is_spot_available(&p, size, accessible));
            }
        }
    }

    #[test]
    fn availability_large_placard_never_uses_compact() {
        let p = pools(&[], &[(2, 1, 1)], &[]);
        assert!(!is_spot_available(&p, CarSize::LargeCar, true));
        assert!(is_spot_available(&p, CarSize::CompactCar, true));
    }

    #[test]
    fn availability_compact_without_placard_never_uses_handicap() {
        let p = pools(&[(1, 1, 1)], &[], &[]);
        assert!(!is_spot_available(&p, CarSize::CompactCar, false));
        assert!(is_spot_available(&p, CarSize::CompactCar, true));
    }

    #[test]
    fn availability_large_without_placard_needs_large() {
        let p = pools(&[(1, 1, 1)], &[(2, 1, 1)], &[]);
        assert!(!is_spot_available(&p, CarSize::LargeCar, false));
        let p = pools(&[], &[], &[(2, 5, 1)]);
        assert!(is_spot_available(&p, CarSize::LargeCar, false));
    }

    #[test]
    fn priority_routing() {
        let with_handicap = pools(&[(1, 1, 1)], &[(2, 1, 1)], &[(2, 5, 1)]);
        let no_handicap = pools(&[], &[(2, 1, 1)], &[(2, 5, 1)]);

        let placard_large = Customer::new(CarSize::LargeCar, true);
        assert_eq!(priority_for(&with_handicap, &placard_large), CachePriority::Handicap);
        assert_eq!(priority_for(&no_handicap, &placard_large), CachePriority::Large);

        let placard_compact = Customer::new(CarSize::CompactCar, true);
        assert_eq!(priority_for(&no_handicap, &placard_compact), CachePriority::Handicap);

        assert_eq!(
            priority_for(&with_handicap, &Customer::new(CarSize::CompactCar, false)),
            CachePriority::Compact
        );
        assert_eq!(
            priority_for(&with_handicap, &Customer::new(CarSize::LargeCar, false)),
            CachePriority::Large
        );
    }
}
