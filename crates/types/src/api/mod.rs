pub mod bookings;
pub mod common;
pub mod queue;

pub use bookings::*;
pub use common::*;
pub use queue::*;
