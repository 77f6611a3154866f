//! Value objects - Immutable objects defined by their attributes

mod actions;
mod coin_stats;
mod condition;
mod fields;
mod grade;
mod names;
mod playbook;
pub mod rule_tables;
mod xp;

pub use actions::{Action, ActionCategory, ActionRatings};
pub use coin_stats::{CoinStat, CoinStats};
pub use condition::{HarmLevel, HarmSlot, HarmTrack, HealingClock, TraumaCondition};
pub use fields::CharacterField;
pub use grade::Grade;
pub use names::CharacterName;
pub use playbook::{CustomAbility, CustomAbilityMode, Playbook};
pub use rule_tables::{AdvancementCosts, CreationBudget, GradeTable, RuleTables};
pub use xp::{Advancement, Purchase, XpLedger, XpTrack};
