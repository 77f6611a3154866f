//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Character persistence (compare-and-swap on version)
//! - Reference data (heritages, playbook abilities)
//! - History records
//! - Clock (for testing)

mod error;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{CharacterRepo, HistorySink, ReferenceCatalog};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Errors
// =============================================================================
pub use error::RepoError;

// =============================================================================
// Mocks (test only)
// =============================================================================
#[cfg(test)]
pub use repos::{MockCharacterRepo, MockHistorySink, MockReferenceCatalog};

#[cfg(test)]
pub use testing::MockClockPort;
