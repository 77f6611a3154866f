//! Rule tables - the numeric configuration of the character rules.
//!
//! Every table the Validation Engine, XP Ledger and Derived Stats Calculator
//! read comes from one immutable [`RuleTables`] value that callers inject.
//! [`RuleTables::default`] carries the canonical ruleset; alternate rulesets
//! deserialize from JSON with missing keys falling back to the defaults.

use serde::{Deserialize, Serialize};

use super::grade::Grade;
use crate::error::DomainError;

// ============================================================================
// Canonical tables
// ============================================================================

/// Coin-point cost of each grade.
pub const GRADE_POINTS: GradeTable = GradeTable::new(5, 4, 3, 2, 1, 0);

/// Stress capacity by Durability grade.
pub const STRESS_BY_DURABILITY: GradeTable = GradeTable::new(13, 12, 11, 10, 9, 8);

/// Harm clock segments by Durability grade.
pub const HARM_CLOCK_BY_DURABILITY: GradeTable = GradeTable::new(6, 6, 5, 4, 3, 2);

/// Vulnerability clock segments by Durability grade.
pub const VULNERABILITY_CLOCK_BY_DURABILITY: GradeTable = GradeTable::new(6, 6, 5, 4, 3, 2);

/// Armor charges by Durability grade.
pub const ARMOR_CHARGES_BY_DURABILITY: GradeTable = GradeTable::new(3, 3, 2, 1, 1, 0);

/// Movement speed in feet by Speed grade.
pub const MOVEMENT_BY_SPEED: GradeTable = GradeTable::new(40, 40, 35, 30, 25, 20);

pub const CREATION_ACTION_DOTS: u32 = 7;
pub const CREATION_MAX_DOTS_PER_ACTION: u8 = 2;
pub const MAX_DOTS_PER_ACTION: u8 = 4;
pub const CREATION_COIN_POINTS: i32 = 10;
pub const STARTING_ABILITIES: usize = 3;
pub const ABILITIES_PER_A_GRADE: usize = 2;

pub const ACTION_DIE_XP_COST: i32 = 5;
pub const STAND_COIN_XP_COST: i32 = 10;
pub const HERITAGE_POINT_XP_COST: i32 = 5;
pub const XP_PER_LEVEL: i32 = 10;

// ============================================================================
// GradeTable
// ============================================================================

/// A lookup from each letter grade to an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct GradeTable {
    s: i32,
    a: i32,
    b: i32,
    c: i32,
    d: i32,
    f: i32,
}

impl GradeTable {
    pub const fn new(s: i32, a: i32, b: i32, c: i32, d: i32, f: i32) -> Self {
        Self { s, a, b, c, d, f }
    }

    pub fn get(&self, grade: Grade) -> i32 {
        match grade {
            Grade::S => self.s,
            Grade::A => self.a,
            Grade::B => self.b,
            Grade::C => self.c,
            Grade::D => self.d,
            Grade::F => self.f,
        }
    }

    /// True when values never decrease going from F up to S.
    pub fn is_monotonic(&self) -> bool {
        let ascending = [self.f, self.d, self.c, self.b, self.a, self.s];
        ascending.windows(2).all(|w| w[0] <= w[1])
    }
}

// ============================================================================
// Budgets and costs
// ============================================================================

/// Creation-time budgets and the post-creation action ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreationBudget {
    pub action_dots: u32,
    pub max_dots_per_action: u8,
    pub max_dots_after_creation: u8,
    pub coin_points: i32,
    pub starting_abilities: usize,
    pub abilities_per_a_grade: usize,
}

impl Default for CreationBudget {
    fn default() -> Self {
        Self {
            action_dots: CREATION_ACTION_DOTS,
            max_dots_per_action: CREATION_MAX_DOTS_PER_ACTION,
            max_dots_after_creation: MAX_DOTS_PER_ACTION,
            coin_points: CREATION_COIN_POINTS,
            starting_abilities: STARTING_ABILITIES,
            abilities_per_a_grade: ABILITIES_PER_A_GRADE,
        }
    }
}

/// XP exchange rates for each advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancementCosts {
    pub action_die: i32,
    pub stand_coin_point: i32,
    pub heritage_point: i32,
    pub xp_per_level: i32,
}

impl Default for AdvancementCosts {
    fn default() -> Self {
        Self {
            action_die: ACTION_DIE_XP_COST,
            stand_coin_point: STAND_COIN_XP_COST,
            heritage_point: HERITAGE_POINT_XP_COST,
            xp_per_level: XP_PER_LEVEL,
        }
    }
}

// ============================================================================
// RuleTables
// ============================================================================

/// The complete numeric ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTables {
    pub grade_points: GradeTable,
    pub stress_by_durability: GradeTable,
    pub harm_clock_by_durability: GradeTable,
    pub vulnerability_clock_by_durability: GradeTable,
    pub armor_charges_by_durability: GradeTable,
    pub movement_by_speed: GradeTable,
    pub creation: CreationBudget,
    pub advancement: AdvancementCosts,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            grade_points: GRADE_POINTS,
            stress_by_durability: STRESS_BY_DURABILITY,
            harm_clock_by_durability: HARM_CLOCK_BY_DURABILITY,
            vulnerability_clock_by_durability: VULNERABILITY_CLOCK_BY_DURABILITY,
            armor_charges_by_durability: ARMOR_CHARGES_BY_DURABILITY,
            movement_by_speed: MOVEMENT_BY_SPEED,
            creation: CreationBudget::default(),
            advancement: AdvancementCosts::default(),
        }
    }
}

impl RuleTables {
    /// Check that a loaded ruleset is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if any grade table decreases from
    /// F towards S, or an XP cost or the level step is not positive.
    pub fn validate(&self) -> Result<(), DomainError> {
        let tables = [
            ("grade_points", &self.grade_points),
            ("stress_by_durability", &self.stress_by_durability),
            ("harm_clock_by_durability", &self.harm_clock_by_durability),
            (
                "vulnerability_clock_by_durability",
                &self.vulnerability_clock_by_durability,
            ),
            (
                "armor_charges_by_durability",
                &self.armor_charges_by_durability,
            ),
            ("movement_by_speed", &self.movement_by_speed),
        ];
        for (name, table) in tables {
            if !table.is_monotonic() {
                return Err(DomainError::validation(format!(
                    "Rule table '{}' must not decrease from F to S",
                    name
                )));
            }
        }

        let costs = &self.advancement;
        if costs.action_die <= 0
            || costs.stand_coin_point <= 0
            || costs.heritage_point <= 0
            || costs.xp_per_level <= 0
        {
            return Err(DomainError::validation(
                "Advancement costs and XP per level must be positive",
            ));
        }
        Ok(())
    }

    /// Character level derived from spent XP.
    pub fn level_for(&self, total_xp_spent: i32) -> i32 {
        1 + total_xp_spent
            .max(0)
            .checked_div(self.advancement.xp_per_level)
            .unwrap_or(0)
    }
}
