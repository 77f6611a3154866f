//! XP ledger - banked experience per track and the advancements bought with it.
//!
//! Experience is credited to a named track and later converted into permanent
//! advancement units at the fixed rates in [`AdvancementCosts`]. A spend either
//! applies completely (clock debit, `total_xp_spent`, matching `*_gained`
//! counter) or leaves the ledger untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::rule_tables::AdvancementCosts;
use crate::error::{DomainError, ErrorKind, RuleViolation};
use crate::events::{XpGained, XpSpent};

/// A bucket of banked experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XpTrack {
    Insight,
    Prowess,
    Resolve,
    Heritage,
    Playbook,
}

impl XpTrack {
    pub const ALL: [XpTrack; 5] = [
        XpTrack::Insight,
        XpTrack::Prowess,
        XpTrack::Resolve,
        XpTrack::Heritage,
        XpTrack::Playbook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            XpTrack::Insight => "insight",
            XpTrack::Prowess => "prowess",
            XpTrack::Resolve => "resolve",
            XpTrack::Heritage => "heritage",
            XpTrack::Playbook => "playbook",
        }
    }
}

impl fmt::Display for XpTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XpTrack {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        XpTrack::ALL
            .into_iter()
            .find(|track| track.as_str() == wanted)
            .ok_or_else(|| DomainError::parse(format!("Unknown XP track: {}", s)))
    }
}

/// A permanent advancement unit bought with XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advancement {
    ActionDie,
    StandCoinPoint,
    HeritagePoint,
}

impl Advancement {
    pub fn cost(&self, costs: &AdvancementCosts) -> i32 {
        match self {
            Advancement::ActionDie => costs.action_die,
            Advancement::StandCoinPoint => costs.stand_coin_point,
            Advancement::HeritagePoint => costs.heritage_point,
        }
    }
}

/// `count` units of one advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub advancement: Advancement,
    pub count: i32,
}

impl Purchase {
    pub fn new(advancement: Advancement, count: i32) -> Self {
        Self { advancement, count }
    }
}

/// Banked XP per track plus the spent/gained bookkeeping counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpLedger {
    #[serde(default)]
    xp_clocks: BTreeMap<XpTrack, i32>,
    #[serde(default)]
    total_xp_spent: i32,
    #[serde(default)]
    heritage_points_gained: i32,
    #[serde(default)]
    stand_coin_points_gained: i32,
    #[serde(default)]
    action_dice_gained: i32,
}

impl XpLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a ledger exactly as stored. No consistency checks are made
    /// here; the Validation Engine reports inconsistent counters.
    pub fn from_parts(
        xp_clocks: BTreeMap<XpTrack, i32>,
        total_xp_spent: i32,
        heritage_points_gained: i32,
        stand_coin_points_gained: i32,
        action_dice_gained: i32,
    ) -> Self {
        Self {
            xp_clocks,
            total_xp_spent,
            heritage_points_gained,
            stand_coin_points_gained,
            action_dice_gained,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn banked(&self, track: XpTrack) -> i32 {
        self.xp_clocks.get(&track).copied().unwrap_or(0)
    }

    pub fn xp_clocks(&self) -> &BTreeMap<XpTrack, i32> {
        &self.xp_clocks
    }

    pub fn total_xp_spent(&self) -> i32 {
        self.total_xp_spent
    }

    pub fn heritage_points_gained(&self) -> i32 {
        self.heritage_points_gained
    }

    pub fn stand_coin_points_gained(&self) -> i32 {
        self.stand_coin_points_gained
    }

    pub fn action_dice_gained(&self) -> i32 {
        self.action_dice_gained
    }

    pub fn gained(&self, advancement: Advancement) -> i32 {
        match advancement {
            Advancement::ActionDie => self.action_dice_gained,
            Advancement::StandCoinPoint => self.stand_coin_points_gained,
            Advancement::HeritagePoint => self.heritage_points_gained,
        }
    }

    /// `1 + total_xp_spent / xp_per_level`. Never stored.
    ///
    /// A zero level step (an unvalidated rule table) pins the level at 1.
    pub fn level(&self, costs: &AdvancementCosts) -> i32 {
        1 + self
            .total_xp_spent
            .max(0)
            .checked_div(costs.xp_per_level)
            .unwrap_or(0)
    }

    /// What `total_xp_spent` must equal given the gained counters.
    pub fn expected_spent(&self, costs: &AdvancementCosts) -> i64 {
        i64::from(self.heritage_points_gained) * i64::from(costs.heritage_point)
            + i64::from(self.stand_coin_points_gained) * i64::from(costs.stand_coin_point)
            + i64::from(self.action_dice_gained) * i64::from(costs.action_die)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Credit `amount` XP to a track.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount` is not positive or the track would overflow.
    pub fn gain(&mut self, track: XpTrack, amount: i32) -> Result<XpGained, RuleViolation> {
        if amount <= 0 {
            return Err(RuleViolation::new(
                "xp_clocks",
                ErrorKind::InvalidAmount,
                format!("XP amount must be positive, got {}", amount),
            ));
        }
        let banked = self.banked(track).checked_add(amount).ok_or_else(|| {
            RuleViolation::new(
                "xp_clocks",
                ErrorKind::InvalidAmount,
                format!("{} XP track cannot hold {} more XP", track, amount),
            )
        })?;
        self.xp_clocks.insert(track, banked);
        Ok(XpGained {
            track,
            amount,
            banked,
        })
    }

    pub fn spend_for_action_dice(
        &mut self,
        track: XpTrack,
        count: i32,
        costs: &AdvancementCosts,
    ) -> Result<XpSpent, RuleViolation> {
        self.spend(track, &[Purchase::new(Advancement::ActionDie, count)], costs)
    }

    pub fn spend_for_stand_coin(
        &mut self,
        track: XpTrack,
        count: i32,
        costs: &AdvancementCosts,
    ) -> Result<XpSpent, RuleViolation> {
        self.spend(
            track,
            &[Purchase::new(Advancement::StandCoinPoint, count)],
            costs,
        )
    }

    pub fn spend_for_heritage_point(
        &mut self,
        track: XpTrack,
        count: i32,
        costs: &AdvancementCosts,
    ) -> Result<XpSpent, RuleViolation> {
        self.spend(
            track,
            &[Purchase::new(Advancement::HeritagePoint, count)],
            costs,
        )
    }

    /// Buy one or more advancements from a single track as one atomic step.
    ///
    /// All new values are computed before anything is written, so a failure
    /// leaves the ledger exactly as it was.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for an empty purchase list, a non-positive count, or arithmetic overflow
    /// - `InsufficientXp` if the track holds less than the combined cost
    pub fn spend(
        &mut self,
        track: XpTrack,
        purchases: &[Purchase],
        costs: &AdvancementCosts,
    ) -> Result<XpSpent, RuleViolation> {
        if purchases.is_empty() {
            return Err(RuleViolation::new(
                "xp_clocks",
                ErrorKind::InvalidAmount,
                "At least one advancement must be purchased",
            ));
        }

        let overflow = || {
            RuleViolation::new(
                "total_xp_spent",
                ErrorKind::InvalidAmount,
                "Advancement cost overflows the XP ledger",
            )
        };

        let mut cost: i32 = 0;
        let mut gained = [
            self.action_dice_gained,
            self.stand_coin_points_gained,
            self.heritage_points_gained,
        ];
        for purchase in purchases {
            if purchase.count <= 0 {
                return Err(RuleViolation::new(
                    "xp_clocks",
                    ErrorKind::InvalidAmount,
                    format!("Advancement count must be positive, got {}", purchase.count),
                ));
            }
            let line = purchase
                .advancement
                .cost(costs)
                .checked_mul(purchase.count)
                .ok_or_else(overflow)?;
            cost = cost.checked_add(line).ok_or_else(overflow)?;
            let slot = match purchase.advancement {
                Advancement::ActionDie => &mut gained[0],
                Advancement::StandCoinPoint => &mut gained[1],
                Advancement::HeritagePoint => &mut gained[2],
            };
            *slot = slot.checked_add(purchase.count).ok_or_else(overflow)?;
        }

        let available = self.banked(track);
        if available < cost {
            return Err(RuleViolation::new(
                "xp_clocks",
                ErrorKind::InsufficientXp,
                format!(
                    "Insufficient {} XP. Have {}, need {}",
                    track, available, cost
                ),
            ));
        }
        let total_xp_spent = self.total_xp_spent.checked_add(cost).ok_or_else(overflow)?;

        let level_before = self.level(costs);
        self.xp_clocks.insert(track, available - cost);
        self.total_xp_spent = total_xp_spent;
        self.action_dice_gained = gained[0];
        self.stand_coin_points_gained = gained[1];
        self.heritage_points_gained = gained[2];

        Ok(XpSpent {
            track,
            cost,
            remaining: available - cost,
            purchases: purchases.to_vec(),
            level_before,
            level_after: self.level(costs),
        })
    }
}
