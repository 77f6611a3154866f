//! Character creation and progression rules for 1-800-Bizarre.
//!
//! Pure and synchronous: no I/O, no logging, no clocks. Rule tables and
//! reference data are passed in; verdicts, outcomes and diffs come back.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod rules;
pub mod value_objects;

pub use aggregates::{Character, CharacterSnapshot, GmControls};

pub use entities::{
    Ability, AbilityTier, Benefit, Detriment, Heritage, PlaybookAbility, PlaybookAbilityRef,
};

pub use error::{DomainError, ErrorKind, RuleViolation, RuleViolations};

pub use events::{
    CharacterDiff, FieldChange, FieldLockOutcome, FieldUnlockOutcome, GmToggleOutcome,
    HistoryRecord, XpGained, XpSpent,
};

// Re-export ID types
pub use ids::{
    AbilityId, BenefitId, CampaignId, CharacterId, DetrimentId, HamonAbilityId, HeritageId,
    SpinAbilityId, UserId, ViceId,
};

pub use rules::{
    apply_update, eligible_abilities, CharacterValidator, DerivedStats, DerivedStatsCalculator,
    Editor, StandDerived, ValidationContext, ValidationMode, ValidationStrategy,
};

// Re-export value objects (explicit list in value_objects/mod.rs)
pub use value_objects::{
    Action, ActionCategory, ActionRatings, Advancement, AdvancementCosts, CharacterField,
    CharacterName, CoinStat, CoinStats, CreationBudget, CustomAbility, CustomAbilityMode, Grade,
    GradeTable, HarmLevel, HarmSlot, HarmTrack, HealingClock, Playbook, Purchase, RuleTables,
    TraumaCondition, XpLedger, XpTrack,
};
