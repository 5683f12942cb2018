//! Park/unpark dispatch desk for Parkgrid.
//!
//! Wraps a [`parkgrid_logic::facility::Facility`] in a single mutex so that
//! ticket numbering, allocation and the best-spot cache refresh happen as one
//! atomic step, and reads time from an injectable [`clock::Clock`].
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`clock`] | Wall clock and a manually advanced clock for tests |
//! | [`desk`] | `ParkingDesk`: validated park/unpark under one lock |

pub mod clock;
pub mod desk;

pub use clock::{Clock, ManualClock, SystemClock};
pub use desk::{ParkReceipt, ParkingDesk, UnparkReceipt};
