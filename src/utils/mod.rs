//! Project-specific utilities live here.

pub mod clock;

pub use clock::{Clock, FixedClock, SystemClock};
