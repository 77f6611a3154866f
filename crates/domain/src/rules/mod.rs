//! Character creation and progression rules.
//!
//! Everything here is pure: rule tables and reference data come in as
//! arguments, verdicts and diffs go out as return values.

pub mod derived;
pub mod eligibility;
pub mod field_lock;
pub mod update;
pub mod validation;

pub use derived::{DerivedStats, DerivedStatsCalculator, StandDerived};
pub use eligibility::{eligible_abilities, unlocked_tiers};
pub use field_lock::{check_update, guard_creation, guard_update, Editor};
pub use update::apply_update;
pub use validation::{
    CharacterValidator, ValidationContext, ValidationMode, ValidationStrategy,
};
