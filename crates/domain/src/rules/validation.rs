//! Character validation - the invariant battery run before a character is
//! accepted as created or updated.
//!
//! Checks run in a fixed order:
//!
//! 1. heritage presence, menu membership and HP budget
//! 2. required benefits/detriments
//! 3. action dot total (creation) and per-action ceiling
//! 4. Stand coin grades: S-rank permission and point total (creation)
//! 5. stress vs. durability (creation)
//! 6. ability count == starting abilities (creation)
//! 7. ability count vs. A grades (whenever a Stand exists)
//! 8. XP ledger arithmetic and non-negative counters
//! 9. Hamon/Spin ability eligibility
//!
//! Each check is a free function taking only the fields it needs, so it can
//! be exercised on its own. Creation-only checks take an explicit
//! `is_creation` flag; nothing is inferred from the derived level.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::aggregates::Character;
use crate::entities::{Heritage, PlaybookAbility, PlaybookAbilityRef};
use crate::error::{DomainError, ErrorKind, RuleViolation, RuleViolations};
use crate::ids::{BenefitId, DetrimentId, HamonAbilityId, HeritageId, SpinAbilityId};
use crate::value_objects::{
    ActionRatings, AdvancementCosts, CoinStats, CreationBudget, GradeTable, Playbook, RuleTables,
    XpLedger, XpTrack,
};

// =============================================================================
// Modes and Context
// =============================================================================

/// Which invariant set applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// First insert of a character
    Creation,
    /// Any later update
    SteadyState,
}

impl ValidationMode {
    pub fn is_creation(&self) -> bool {
        matches!(self, ValidationMode::Creation)
    }
}

/// Stop at the first failing check, or run every check and report all failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStrategy {
    #[default]
    FailFast,
    CollectAll,
}

impl ValidationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStrategy::FailFast => "fail_fast",
            ValidationStrategy::CollectAll => "collect_all",
        }
    }
}

impl fmt::Display for ValidationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" => Ok(ValidationStrategy::FailFast),
            "collect_all" => Ok(ValidationStrategy::CollectAll),
            _ => Err(DomainError::parse(format!("Unknown validation strategy: {}", s))),
        }
    }
}

/// Reference data resolved from the catalog for one validation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    /// The character's chosen heritage, if it was found
    pub heritage: Option<&'a Heritage>,
    /// Hamon and Spin techniques known to the catalog
    pub playbook_abilities: &'a [PlaybookAbility],
}

impl<'a> ValidationContext<'a> {
    pub fn new(heritage: Option<&'a Heritage>, playbook_abilities: &'a [PlaybookAbility]) -> Self {
        Self {
            heritage,
            playbook_abilities,
        }
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Runs the check battery against an injected ruleset.
#[derive(Debug, Clone, Default)]
pub struct CharacterValidator {
    tables: RuleTables,
    strategy: ValidationStrategy,
}

type Check<'c> = &'c dyn Fn() -> Result<(), RuleViolation>;

impl CharacterValidator {
    pub fn new(tables: RuleTables) -> Self {
        Self {
            tables,
            strategy: ValidationStrategy::default(),
        }
    }

    /// Like [`CharacterValidator::new`], but refuses an inconsistent table.
    ///
    /// # Errors
    ///
    /// See [`RuleTables::validate`].
    pub fn try_new(tables: RuleTables) -> Result<Self, DomainError> {
        tables.validate()?;
        Ok(Self::new(tables))
    }

    pub fn with_strategy(mut self, strategy: ValidationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    pub fn strategy(&self) -> ValidationStrategy {
        self.strategy
    }

    /// Accept or reject `character` under the configured strategy.
    ///
    /// # Errors
    ///
    /// The first failure (fail-fast) or every failure (collect-all).
    pub fn validate(
        &self,
        character: &Character,
        ctx: &ValidationContext<'_>,
        mode: ValidationMode,
    ) -> Result<(), RuleViolations> {
        let stop_early = self.strategy == ValidationStrategy::FailFast;
        match RuleViolations::from_vec(self.run(character, ctx, mode, stop_early)) {
            Some(violations) => Err(violations),
            None => Ok(()),
        }
    }

    /// Every failing check, in check order, regardless of strategy.
    pub fn collect_violations(
        &self,
        character: &Character,
        ctx: &ValidationContext<'_>,
        mode: ValidationMode,
    ) -> Vec<RuleViolation> {
        self.run(character, ctx, mode, false)
    }

    fn run(
        &self,
        character: &Character,
        ctx: &ValidationContext<'_>,
        mode: ValidationMode,
        stop_early: bool,
    ) -> Vec<RuleViolation> {
        let is_creation = mode.is_creation();
        let tables = &self.tables;
        let coin_stats = character.coin_stats();

        let checks: [Check<'_>; 9] = [
            &|| {
                check_heritage(
                    character.heritage_id(),
                    ctx.heritage,
                    character.selected_benefits(),
                    character.selected_detriments(),
                    character.bonus_hp_from_xp(),
                )
            },
            &|| {
                check_required_selections(
                    ctx.heritage,
                    character.selected_benefits(),
                    character.selected_detriments(),
                )
            },
            &|| check_action_dots(character.action_dots(), &tables.creation, is_creation),
            &|| {
                check_coin_stats(
                    coin_stats,
                    character.gm().can_have_s_rank_stand_stats(),
                    &tables.grade_points,
                    &tables.creation,
                    is_creation,
                )
            },
            &|| {
                check_creation_stress(
                    character.stress(),
                    coin_stats,
                    &tables.stress_by_durability,
                    is_creation,
                )
            },
            &|| {
                check_creation_ability_count(
                    character.base_ability_count(),
                    &tables.creation,
                    is_creation,
                )
            },
            &|| check_ability_count(character.total_ability_count(), coin_stats, &tables.creation),
            &|| check_xp_ledger(character.xp(), &tables.advancement),
            &|| {
                check_playbook_abilities(
                    character.playbook(),
                    character.hamon_abilities(),
                    character.spin_abilities(),
                    character.a_grade_count(),
                    ctx.playbook_abilities,
                )
            },
        ];

        let mut violations = Vec::new();
        for check in checks {
            if let Err(violation) = check() {
                violations.push(violation);
                if stop_early {
                    break;
                }
            }
        }
        violations
    }
}

// =============================================================================
// Check 1: Heritage and HP budget
// =============================================================================

/// `base_hp + bonus_hp + Σ detriment.hp_value >= Σ benefit.hp_cost`, with
/// every selection drawn from the heritage's own menu.
pub fn check_heritage(
    heritage_id: Option<HeritageId>,
    heritage: Option<&Heritage>,
    benefits: &BTreeSet<BenefitId>,
    detriments: &BTreeSet<DetrimentId>,
    bonus_hp: i32,
) -> Result<(), RuleViolation> {
    let Some(heritage_id) = heritage_id else {
        return Err(RuleViolation::new(
            "heritage",
            ErrorKind::MissingHeritage,
            "A heritage must be selected.",
        ));
    };
    let heritage = match heritage {
        Some(h) if h.id == heritage_id => h,
        _ => {
            return Err(RuleViolation::new(
                "heritage",
                ErrorKind::MissingHeritage,
                format!("Heritage {} could not be found.", heritage_id),
            ))
        }
    };

    let mut benefit_cost = 0;
    for id in benefits {
        let benefit = heritage.benefit(*id).ok_or_else(|| {
            RuleViolation::new(
                "selected_benefits",
                ErrorKind::UnknownSelection,
                format!("Benefit {} is not offered by heritage '{}'.", id, heritage.name),
            )
        })?;
        benefit_cost += benefit.hp_cost;
    }

    let mut detriment_value = 0;
    for id in detriments {
        let detriment = heritage.detriment(*id).ok_or_else(|| {
            RuleViolation::new(
                "selected_detriments",
                ErrorKind::UnknownSelection,
                format!("Detriment {} is not offered by heritage '{}'.", id, heritage.name),
            )
        })?;
        detriment_value += detriment.hp_value;
    }

    let available = heritage.base_hp + bonus_hp + detriment_value;
    if benefit_cost > available {
        return Err(RuleViolation::new(
            "selected_benefits",
            ErrorKind::BudgetExceeded,
            format!(
                "Selected benefits cost {} HP but only {} HP is available (base {} + bonus {} + detriments {}).",
                benefit_cost, available, heritage.base_hp, bonus_hp, detriment_value
            ),
        ));
    }
    Ok(())
}

// =============================================================================
// Check 2: Required selections
// =============================================================================

/// Every `required` benefit and detriment of the heritage is selected.
/// Without a resolved heritage there is nothing to require.
pub fn check_required_selections(
    heritage: Option<&Heritage>,
    benefits: &BTreeSet<BenefitId>,
    detriments: &BTreeSet<DetrimentId>,
) -> Result<(), RuleViolation> {
    let Some(heritage) = heritage else {
        return Ok(());
    };
    if let Some(missing) = heritage
        .required_benefits()
        .find(|b| !benefits.contains(&b.id))
    {
        return Err(RuleViolation::new(
            "selected_benefits",
            ErrorKind::MissingRequiredChoice,
            format!("Required benefit '{}' must be selected.", missing.name),
        ));
    }
    if let Some(missing) = heritage
        .required_detriments()
        .find(|d| !detriments.contains(&d.id))
    {
        return Err(RuleViolation::new(
            "selected_detriments",
            ErrorKind::MissingRequiredChoice,
            format!("Required detriment '{}' must be selected.", missing.name),
        ));
    }
    Ok(())
}

// =============================================================================
// Check 3: Action dots
// =============================================================================

/// At creation: exact dot total and the creation ceiling per action.
/// Afterwards: only the permanent ceiling.
pub fn check_action_dots(
    dots: &ActionRatings,
    budget: &CreationBudget,
    is_creation: bool,
) -> Result<(), RuleViolation> {
    if is_creation && dots.total() != budget.action_dots {
        return Err(RuleViolation::new(
            "action_dots",
            ErrorKind::DotCountInvalid,
            format!(
                "Action dots must total {} at creation, got {}.",
                budget.action_dots,
                dots.total()
            ),
        ));
    }

    let ceiling = if is_creation {
        budget.max_dots_per_action
    } else {
        budget.max_dots_after_creation
    };
    if let Some((action, rating)) = dots.iter().find(|&(_, rating)| rating > ceiling) {
        return Err(RuleViolation::new(
            format!("action_dots.{}", action),
            ErrorKind::DotCountInvalid,
            format!(
                "'{}' has {} dots; at most {} allowed{}.",
                action,
                rating,
                ceiling,
                if is_creation { " at creation" } else { "" }
            ),
        ));
    }
    Ok(())
}

// =============================================================================
// Check 4: Stand coin grades
// =============================================================================

/// S grades need the GM allowance at all times; the point total is fixed at creation.
pub fn check_coin_stats(
    coin_stats: Option<&CoinStats>,
    s_rank_allowed: bool,
    points: &GradeTable,
    budget: &CreationBudget,
    is_creation: bool,
) -> Result<(), RuleViolation> {
    let Some(stats) = coin_stats else {
        if is_creation {
            return Err(RuleViolation::new(
                "coin_stats",
                ErrorKind::MissingRequiredChoice,
                "Stand coin grades must be chosen at creation.",
            ));
        }
        return Ok(());
    };

    if !s_rank_allowed {
        if let Some(stat) = stats.s_rank_stats().first() {
            return Err(RuleViolation::new(
                stat.field_path(),
                ErrorKind::GradeNotPermitted,
                format!("S grade for '{}' requires GM permission.", stat),
            ));
        }
    }

    if is_creation {
        let total = stats.total_points(points);
        if total != budget.coin_points {
            return Err(RuleViolation::new(
                "coin_stats",
                ErrorKind::BudgetExceeded,
                format!(
                    "Stand coin grades must total exactly {} points, got {}.",
                    budget.coin_points, total
                ),
            ));
        }
    }
    Ok(())
}

// =============================================================================
// Check 5: Stress
// =============================================================================

/// A fresh character starts at the stress capacity of its durability grade.
/// Later edits may legitimately leave stress stale.
pub fn check_creation_stress(
    stress: i32,
    coin_stats: Option<&CoinStats>,
    stress_table: &GradeTable,
    is_creation: bool,
) -> Result<(), RuleViolation> {
    let Some(stats) = coin_stats.filter(|_| is_creation) else {
        return Ok(());
    };
    let expected = stress_table.get(stats.durability);
    if stress != expected {
        return Err(RuleViolation::new(
            "stress",
            ErrorKind::StressMismatch,
            format!(
                "Stress must be {} for durability {} at creation, got {}.",
                expected, stats.durability, stress
            ),
        ));
    }
    Ok(())
}

// =============================================================================
// Checks 6 & 7: Ability counts
// =============================================================================

/// Standard + custom + Hamon + Spin must equal the starting allotment.
pub fn check_creation_ability_count(
    base_count: usize,
    budget: &CreationBudget,
    is_creation: bool,
) -> Result<(), RuleViolation> {
    if is_creation && base_count != budget.starting_abilities {
        return Err(RuleViolation::new(
            "abilities",
            ErrorKind::AbilityCountMismatch,
            format!(
                "A new character must have exactly {} abilities, got {}.",
                budget.starting_abilities, base_count
            ),
        ));
    }
    Ok(())
}

/// With a Stand, total abilities (extras included) must equal
/// `starting_abilities + abilities_per_a_grade × A-grade count`.
pub fn check_ability_count(
    total_count: usize,
    coin_stats: Option<&CoinStats>,
    budget: &CreationBudget,
) -> Result<(), RuleViolation> {
    let Some(stats) = coin_stats else {
        return Ok(());
    };
    let a_grades = stats.a_grade_count();
    let expected = budget.starting_abilities + budget.abilities_per_a_grade * a_grades;
    if total_count != expected {
        return Err(RuleViolation::new(
            "abilities",
            ErrorKind::AbilityCountMismatch,
            format!(
                "Expected {} abilities ({} + {} per A-grade stat, {} A grade(s)), got {}.",
                expected, budget.starting_abilities, budget.abilities_per_a_grade, a_grades, total_count
            ),
        ));
    }
    Ok(())
}

// =============================================================================
// Check 8: XP ledger
// =============================================================================

/// Counters are non-negative, `total_xp_spent` is a whole number of levels
/// and equals the cost of everything bought.
pub fn check_xp_ledger(ledger: &XpLedger, costs: &AdvancementCosts) -> Result<(), RuleViolation> {
    let counters = [
        ("total_xp_spent", ledger.total_xp_spent()),
        ("heritage_points_gained", ledger.heritage_points_gained()),
        ("stand_coin_points_gained", ledger.stand_coin_points_gained()),
        ("action_dice_gained", ledger.action_dice_gained()),
    ];
    for (name, value) in counters {
        if value < 0 {
            return Err(RuleViolation::new(
                name,
                ErrorKind::NegativeCounter,
                format!("'{}' cannot be negative, got {}.", name, value),
            ));
        }
    }
    for track in XpTrack::ALL {
        let banked = ledger.banked(track);
        if banked < 0 {
            return Err(RuleViolation::new(
                format!("xp_clocks.{}", track),
                ErrorKind::NegativeCounter,
                format!("{} XP cannot be negative, got {}.", track, banked),
            ));
        }
    }

    let spent = ledger.total_xp_spent();
    let Some(remainder) = spent.checked_rem(costs.xp_per_level) else {
        return Err(RuleViolation::new(
            "total_xp_spent",
            ErrorKind::InvalidAmount,
            format!(
                "XP per level must be positive, got {}.",
                costs.xp_per_level
            ),
        ));
    };
    if remainder != 0 {
        return Err(RuleViolation::new(
            "total_xp_spent",
            ErrorKind::XpArithmeticMismatch,
            format!(
                "Total XP spent ({}) must be a multiple of {}.",
                spent, costs.xp_per_level
            ),
        ));
    }
    let expected = ledger.expected_spent(costs);
    if i64::from(spent) != expected {
        return Err(RuleViolation::new(
            "total_xp_spent",
            ErrorKind::XpArithmeticMismatch,
            format!(
                "Total XP spent ({}) does not match advancements bought ({}).",
                spent, expected
            ),
        ));
    }
    Ok(())
}

// =============================================================================
// Check 9: Playbook ability eligibility
// =============================================================================

/// Each Hamon/Spin technique matches the playbook and is unlocked at the
/// current A-grade count.
pub fn check_playbook_abilities(
    playbook: Playbook,
    hamon: &BTreeSet<HamonAbilityId>,
    spin: &BTreeSet<SpinAbilityId>,
    a_grade_count: usize,
    catalog: &[PlaybookAbility],
) -> Result<(), RuleViolation> {
    let selected = hamon
        .iter()
        .map(|id| ("hamon_abilities", PlaybookAbilityRef::Hamon(*id)))
        .chain(
            spin.iter()
                .map(|id| ("spin_abilities", PlaybookAbilityRef::Spin(*id))),
        );

    for (field, reference) in selected {
        let required = reference.playbook();
        if playbook != required {
            return Err(RuleViolation::new(
                field,
                ErrorKind::AbilityNotEligible,
                format!(
                    "{} abilities require the {} playbook, character is {}.",
                    required, required, playbook
                ),
            ));
        }
        let ability = catalog.iter().find(|a| a.id == reference).ok_or_else(|| {
            RuleViolation::new(
                field,
                ErrorKind::UnknownSelection,
                format!("{} ability is not in the catalog.", required),
            )
        })?;
        if !ability.tier.is_unlocked(a_grade_count) {
            return Err(RuleViolation::new(
                field,
                ErrorKind::AbilityNotEligible,
                format!(
                    "'{}' requires {} A-grade stat(s), character has {}.",
                    ability.name,
                    ability.tier.required_a_grades(),
                    a_grade_count
                ),
            ));
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
