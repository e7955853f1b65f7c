//! Domain models for provider availability and booking.

mod appointment;
mod availability;
mod booking;

pub use appointment::*;
pub use availability::*;
pub use booking::*;
