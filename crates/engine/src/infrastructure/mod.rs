//! Infrastructure implementations.
//!
//! Port traits plus the in-memory adapters, clock and settings loader.

pub mod clock;
pub mod memory;
pub mod ports;
pub mod settings;
