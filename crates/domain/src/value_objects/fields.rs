//! Closed set of character field identifiers used for GM locks and history diffs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// A named, individually comparable field of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterField {
    TrueName,
    Alias,
    Background,
    Heritage,
    SelectedBenefits,
    SelectedDetriments,
    Playbook,
    ActionDots,
    CoinStats,
    Stress,
    Trauma,
    Harm,
    HealingClock,
    StandardAbilities,
    CustomAbility,
    HamonAbilities,
    SpinAbilities,
    ExtraCustomAbilities,
    Vice,
    XpClocks,
    TotalXpSpent,
    Level,
    HeritagePointsGained,
    StandCoinPointsGained,
    ActionDiceGained,
    GmCharacterLocked,
    GmLockedFields,
    GmCanHaveSRankStandStats,
}

impl CharacterField {
    pub const ALL: [CharacterField; 28] = [
        CharacterField::TrueName,
        CharacterField::Alias,
        CharacterField::Background,
        CharacterField::Heritage,
        CharacterField::SelectedBenefits,
        CharacterField::SelectedDetriments,
        CharacterField::Playbook,
        CharacterField::ActionDots,
        CharacterField::CoinStats,
        CharacterField::Stress,
        CharacterField::Trauma,
        CharacterField::Harm,
        CharacterField::HealingClock,
        CharacterField::StandardAbilities,
        CharacterField::CustomAbility,
        CharacterField::HamonAbilities,
        CharacterField::SpinAbilities,
        CharacterField::ExtraCustomAbilities,
        CharacterField::Vice,
        CharacterField::XpClocks,
        CharacterField::TotalXpSpent,
        CharacterField::Level,
        CharacterField::HeritagePointsGained,
        CharacterField::StandCoinPointsGained,
        CharacterField::ActionDiceGained,
        CharacterField::GmCharacterLocked,
        CharacterField::GmLockedFields,
        CharacterField::GmCanHaveSRankStandStats,
    ];

    /// Fields touched by an XP spend.
    pub const LEDGER: [CharacterField; 6] = [
        CharacterField::XpClocks,
        CharacterField::TotalXpSpent,
        CharacterField::Level,
        CharacterField::HeritagePointsGained,
        CharacterField::StandCoinPointsGained,
        CharacterField::ActionDiceGained,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterField::TrueName => "true_name",
            CharacterField::Alias => "alias",
            CharacterField::Background => "background",
            CharacterField::Heritage => "heritage",
            CharacterField::SelectedBenefits => "selected_benefits",
            CharacterField::SelectedDetriments => "selected_detriments",
            CharacterField::Playbook => "playbook",
            CharacterField::ActionDots => "action_dots",
            CharacterField::CoinStats => "coin_stats",
            CharacterField::Stress => "stress",
            CharacterField::Trauma => "trauma",
            CharacterField::Harm => "harm",
            CharacterField::HealingClock => "healing_clock",
            CharacterField::StandardAbilities => "standard_abilities",
            CharacterField::CustomAbility => "custom_ability",
            CharacterField::HamonAbilities => "hamon_abilities",
            CharacterField::SpinAbilities => "spin_abilities",
            CharacterField::ExtraCustomAbilities => "extra_custom_abilities",
            CharacterField::Vice => "vice",
            CharacterField::XpClocks => "xp_clocks",
            CharacterField::TotalXpSpent => "total_xp_spent",
            CharacterField::Level => "level",
            CharacterField::HeritagePointsGained => "heritage_points_gained",
            CharacterField::StandCoinPointsGained => "stand_coin_points_gained",
            CharacterField::ActionDiceGained => "action_dice_gained",
            CharacterField::GmCharacterLocked => "gm_character_locked",
            CharacterField::GmLockedFields => "gm_locked_fields",
            CharacterField::GmCanHaveSRankStandStats => "gm_can_have_s_rank_stand_stats",
        }
    }

    /// GM-only controls. Never editable by players, lock or no lock.
    pub fn is_gm_control(&self) -> bool {
        matches!(
            self,
            CharacterField::GmCharacterLocked
                | CharacterField::GmLockedFields
                | CharacterField::GmCanHaveSRankStandStats
        )
    }
}

impl fmt::Display for CharacterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharacterField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CharacterField::ALL
            .into_iter()
            .find(|field| field.as_str() == wanted)
            .ok_or_else(|| DomainError::parse(format!("Unknown character field: {}", s)))
    }
}
