//! Use cases - User story orchestration.
//!
//! Use cases load from the ports, run the domain rules and persist the
//! accepted result.

pub mod character_progression;

pub use character_progression::{
    CharacterProgressionError, CharacterProgressionUseCases, CreateResult, HistoryStatus,
};
