pub mod clock;
pub mod services;

pub use clock::{Clock, FixedClock, SystemClock};
