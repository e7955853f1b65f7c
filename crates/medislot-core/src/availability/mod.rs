//! Slot evaluation against a provider's weekly availability.
//!
//! Pure functions only: no I/O, no shared state. Safe to call from any
//! thread or UI context.

mod evaluator;

pub use evaluator::*;
