//! Domain Events
//!
//! Return types from character mutations, plus the history record written
//! for every accepted change.

pub mod character_events;

pub use character_events::*;
