//! Reference-data entities read from the external catalog.
//!
//! The rules engine treats these as immutable inputs; characters refer to
//! them only by identifier.

mod ability;
mod heritage;

pub use ability::{Ability, AbilityTier, PlaybookAbility, PlaybookAbilityRef};
pub use heritage::{Benefit, Detriment, Heritage};
