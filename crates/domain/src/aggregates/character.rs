//! Character aggregate - one player character and its rules-relevant state
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: all state is reached through accessors and mutators
//! - **Newtypes**: `CharacterName`, `Grade`, `HealingClock` are valid by construction
//! - **Owned selections**: benefits, detriments and abilities are sets of
//!   reference-data identifiers, resolved against the catalog only when needed
//! - **Domain events**: mutations return outcome types (`XpSpent`, `FieldLockOutcome`, ...)
//! - **Derived, never stored**: `level` and `bonus_hp_from_xp` are computed from the ledger
//!
//! Cross-field rules (budgets, ability counts, ledger arithmetic) are not
//! enforced here; the validator in [`crate::rules`] decides whether a
//! candidate character may be persisted.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, RuleViolation};
use crate::events::{
    CharacterDiff, FieldLockOutcome, FieldUnlockOutcome, GmToggleOutcome, XpGained, XpSpent,
};
use crate::ids::{
    AbilityId, BenefitId, CampaignId, CharacterId, DetrimentId, HamonAbilityId, HeritageId,
    SpinAbilityId, UserId, ViceId,
};
use crate::value_objects::{
    Action, ActionRatings, AdvancementCosts, CharacterField, CharacterName, CoinStats,
    CustomAbility, HarmLevel, HarmTrack, HealingClock, Playbook, Purchase, TraumaCondition,
    XpLedger, XpTrack,
};

// ============================================================================
// GM Controls
// ============================================================================

/// Game-master switches attached to a character.
///
/// Only a GM may change these; players see them as permanently locked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmControls {
    #[serde(default)]
    character_locked: bool,
    #[serde(default)]
    locked_fields: BTreeSet<CharacterField>,
    #[serde(default)]
    can_have_s_rank_stand_stats: bool,
}

impl GmControls {
    pub fn character_locked(&self) -> bool {
        self.character_locked
    }

    pub fn locked_fields(&self) -> &BTreeSet<CharacterField> {
        &self.locked_fields
    }

    pub fn is_locked(&self, field: CharacterField) -> bool {
        self.locked_fields.contains(&field)
    }

    pub fn can_have_s_rank_stand_stats(&self) -> bool {
        self.can_have_s_rank_stand_stats
    }
}

// ============================================================================
// Field Snapshot
// ============================================================================

/// JSON rendering of every [`CharacterField`] at one point in time.
///
/// Used both by the field lock guard (did a locked field change?) and to
/// build history diffs.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterSnapshot(BTreeMap<CharacterField, serde_json::Value>);

impl CharacterSnapshot {
    pub fn get(&self, field: CharacterField) -> &serde_json::Value {
        self.0.get(&field).unwrap_or(&serde_json::Value::Null)
    }

    pub fn differs(&self, other: &CharacterSnapshot, field: CharacterField) -> bool {
        self.get(field) != other.get(field)
    }

    /// Fields whose values differ, in canonical field order.
    pub fn changed_fields(&self, other: &CharacterSnapshot) -> Vec<CharacterField> {
        CharacterField::ALL
            .into_iter()
            .filter(|&field| self.differs(other, field))
            .collect()
    }

    /// Per-field `{old, new}` for everything that changed from `self` to `other`.
    pub fn diff(&self, other: &CharacterSnapshot) -> CharacterDiff {
        let mut diff = CharacterDiff::new();
        for field in self.changed_fields(other) {
            diff.record(field, self.get(field).clone(), other.get(field).clone());
        }
        diff
    }

    /// Every field as newly set, for the first history record of a character.
    pub fn as_creation_diff(&self) -> CharacterDiff {
        let mut diff = CharacterDiff::new();
        for (field, value) in &self.0 {
            diff.record(*field, serde_json::Value::Null, value.clone());
        }
        diff
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

// ============================================================================
// Character Aggregate
// ============================================================================

/// A player character.
///
/// # Invariants held by construction
///
/// - `true_name` is non-empty and at most 100 characters (`CharacterName`)
/// - the healing clock never overfills (`HealingClock`)
/// - trauma conditions are unique
/// - `level` is always `1 + total_xp_spent / xp_per_level`
///
/// # Example
///
/// ```
/// use bizarre_domain::aggregates::Character;
/// use bizarre_domain::value_objects::{AdvancementCosts, CharacterName, Playbook};
/// use bizarre_domain::UserId;
///
/// let name = CharacterName::new("Jonathan Joestar").unwrap();
/// let character = Character::new(UserId::new(), name).with_playbook(Playbook::Hamon);
///
/// assert_eq!(character.playbook(), Playbook::Hamon);
/// assert_eq!(character.level(&AdvancementCosts::default()), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    // Identity
    id: CharacterId,
    #[serde(default)]
    version: u64,
    owner: UserId,
    #[serde(default)]
    campaign_id: Option<CampaignId>,

    true_name: CharacterName,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    background: String,

    // Heritage
    #[serde(default)]
    heritage_id: Option<HeritageId>,
    #[serde(default)]
    selected_benefits: BTreeSet<BenefitId>,
    #[serde(default)]
    selected_detriments: BTreeSet<DetrimentId>,

    #[serde(default)]
    playbook: Playbook,
    #[serde(default)]
    action_dots: ActionRatings,
    #[serde(default)]
    coin_stats: Option<CoinStats>,

    // Condition
    #[serde(default)]
    stress: i32,
    #[serde(default)]
    trauma: Vec<TraumaCondition>,
    #[serde(default)]
    harm: HarmTrack,
    #[serde(default)]
    healing_clock: HealingClock,

    // Abilities
    #[serde(default)]
    standard_abilities: BTreeSet<AbilityId>,
    #[serde(default)]
    custom_ability: Option<CustomAbility>,
    #[serde(default)]
    hamon_abilities: BTreeSet<HamonAbilityId>,
    #[serde(default)]
    spin_abilities: BTreeSet<SpinAbilityId>,
    #[serde(default)]
    extra_custom_abilities: Vec<String>,

    #[serde(default)]
    vice: Option<ViceId>,

    #[serde(default)]
    xp: XpLedger,
    #[serde(default)]
    gm: GmControls,
}

impl Character {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// A blank character owned by `owner`. Everything else starts empty and
    /// is filled in through the builder methods before creation validation.
    pub fn new(owner: UserId, true_name: CharacterName) -> Self {
        Self {
            id: CharacterId::new(),
            version: 0,
            owner,
            campaign_id: None,
            true_name,
            alias: None,
            background: String::new(),
            heritage_id: None,
            selected_benefits: BTreeSet::new(),
            selected_detriments: BTreeSet::new(),
            playbook: Playbook::default(),
            action_dots: ActionRatings::new(),
            coin_stats: None,
            stress: 0,
            trauma: Vec::new(),
            harm: HarmTrack::new(),
            healing_clock: HealingClock::default(),
            standard_abilities: BTreeSet::new(),
            custom_ability: None,
            hamon_abilities: BTreeSet::new(),
            spin_abilities: BTreeSet::new(),
            extra_custom_abilities: Vec::new(),
            vice: None,
            xp: XpLedger::new(),
            gm: GmControls::default(),
        }
    }

    // =========================================================================
    // Identity Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> CharacterId {
        self.id
    }

    /// Persistence version; 0 until first saved.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn owner(&self) -> UserId {
        self.owner
    }

    #[inline]
    pub fn campaign_id(&self) -> Option<CampaignId> {
        self.campaign_id
    }

    #[inline]
    pub fn true_name(&self) -> &CharacterName {
        &self.true_name
    }

    #[inline]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[inline]
    pub fn background(&self) -> &str {
        &self.background
    }

    // =========================================================================
    // Sheet Accessors
    // =========================================================================

    pub fn heritage_id(&self) -> Option<HeritageId> {
        self.heritage_id
    }

    pub fn selected_benefits(&self) -> &BTreeSet<BenefitId> {
        &self.selected_benefits
    }

    pub fn selected_detriments(&self) -> &BTreeSet<DetrimentId> {
        &self.selected_detriments
    }

    pub fn playbook(&self) -> Playbook {
        self.playbook
    }

    pub fn action_dots(&self) -> &ActionRatings {
        &self.action_dots
    }

    pub fn coin_stats(&self) -> Option<&CoinStats> {
        self.coin_stats.as_ref()
    }

    pub fn stress(&self) -> i32 {
        self.stress
    }

    pub fn trauma(&self) -> &[TraumaCondition] {
        &self.trauma
    }

    pub fn harm(&self) -> &HarmTrack {
        &self.harm
    }

    pub fn healing_clock(&self) -> HealingClock {
        self.healing_clock
    }

    pub fn standard_abilities(&self) -> &BTreeSet<AbilityId> {
        &self.standard_abilities
    }

    pub fn custom_ability(&self) -> Option<&CustomAbility> {
        self.custom_ability.as_ref()
    }

    pub fn hamon_abilities(&self) -> &BTreeSet<HamonAbilityId> {
        &self.hamon_abilities
    }

    pub fn spin_abilities(&self) -> &BTreeSet<SpinAbilityId> {
        &self.spin_abilities
    }

    pub fn extra_custom_abilities(&self) -> &[String] {
        &self.extra_custom_abilities
    }

    pub fn vice(&self) -> Option<ViceId> {
        self.vice
    }

    pub fn xp(&self) -> &XpLedger {
        &self.xp
    }

    pub fn gm(&self) -> &GmControls {
        &self.gm
    }

    // =========================================================================
    // Derived Values
    // =========================================================================

    pub fn level(&self, costs: &AdvancementCosts) -> i32 {
        self.xp.level(costs)
    }

    /// One bonus heritage HP per heritage point bought with XP.
    pub fn bonus_hp_from_xp(&self) -> i32 {
        self.xp.heritage_points_gained()
    }

    /// A-grade Stand stats, zero without a Stand.
    pub fn a_grade_count(&self) -> usize {
        self.coin_stats
            .as_ref()
            .map(CoinStats::a_grade_count)
            .unwrap_or(0)
    }

    /// Standard + custom + Hamon + Spin selections.
    pub fn base_ability_count(&self) -> usize {
        self.standard_abilities.len()
            + usize::from(self.custom_ability.is_some())
            + self.hamon_abilities.len()
            + self.spin_abilities.len()
    }

    /// Base selections plus the extra abilities unlocked by A grades.
    pub fn total_ability_count(&self) -> usize {
        self.base_ability_count() + self.extra_custom_abilities.len()
    }

    /// Current JSON value of one field.
    pub fn field_value(&self, field: CharacterField, costs: &AdvancementCosts) -> serde_json::Value {
        match field {
            CharacterField::TrueName => to_json(&self.true_name),
            CharacterField::Alias => to_json(&self.alias),
            CharacterField::Background => to_json(&self.background),
            CharacterField::Heritage => to_json(&self.heritage_id),
            CharacterField::SelectedBenefits => to_json(&self.selected_benefits),
            CharacterField::SelectedDetriments => to_json(&self.selected_detriments),
            CharacterField::Playbook => to_json(&self.playbook),
            CharacterField::ActionDots => to_json(&self.action_dots),
            CharacterField::CoinStats => to_json(&self.coin_stats),
            CharacterField::Stress => to_json(&self.stress),
            CharacterField::Trauma => to_json(&self.trauma),
            CharacterField::Harm => to_json(&self.harm),
            CharacterField::HealingClock => to_json(&self.healing_clock),
            CharacterField::StandardAbilities => to_json(&self.standard_abilities),
            CharacterField::CustomAbility => to_json(&self.custom_ability),
            CharacterField::HamonAbilities => to_json(&self.hamon_abilities),
            CharacterField::SpinAbilities => to_json(&self.spin_abilities),
            CharacterField::ExtraCustomAbilities => to_json(&self.extra_custom_abilities),
            CharacterField::Vice => to_json(&self.vice),
            CharacterField::XpClocks => to_json(self.xp.xp_clocks()),
            CharacterField::TotalXpSpent => to_json(&self.xp.total_xp_spent()),
            CharacterField::Level => to_json(&self.level(costs)),
            CharacterField::HeritagePointsGained => to_json(&self.xp.heritage_points_gained()),
            CharacterField::StandCoinPointsGained => to_json(&self.xp.stand_coin_points_gained()),
            CharacterField::ActionDiceGained => to_json(&self.xp.action_dice_gained()),
            CharacterField::GmCharacterLocked => to_json(&self.gm.character_locked),
            CharacterField::GmLockedFields => to_json(&self.gm.locked_fields),
            CharacterField::GmCanHaveSRankStandStats => {
                to_json(&self.gm.can_have_s_rank_stand_stats)
            }
        }
    }

    pub fn snapshot(&self, costs: &AdvancementCosts) -> CharacterSnapshot {
        CharacterSnapshot(
            CharacterField::ALL
                .into_iter()
                .map(|field| (field, self.field_value(field, costs)))
                .collect(),
        )
    }

    // =========================================================================
    // Builder Methods (for construction)
    // =========================================================================

    pub fn with_id(mut self, id: CharacterId) -> Self {
        self.id = id;
        self
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn with_campaign(mut self, campaign_id: CampaignId) -> Self {
        self.campaign_id = Some(campaign_id);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    pub fn with_heritage(mut self, heritage_id: HeritageId) -> Self {
        self.heritage_id = Some(heritage_id);
        self
    }

    pub fn with_benefit(mut self, benefit_id: BenefitId) -> Self {
        self.selected_benefits.insert(benefit_id);
        self
    }

    pub fn with_detriment(mut self, detriment_id: DetrimentId) -> Self {
        self.selected_detriments.insert(detriment_id);
        self
    }

    pub fn with_playbook(mut self, playbook: Playbook) -> Self {
        self.playbook = playbook;
        self
    }

    pub fn with_action_dots(mut self, dots: ActionRatings) -> Self {
        self.action_dots = dots;
        self
    }

    pub fn with_coin_stats(mut self, coin_stats: CoinStats) -> Self {
        self.coin_stats = Some(coin_stats);
        self
    }

    pub fn with_stress(mut self, stress: i32) -> Self {
        self.stress = stress;
        self
    }

    pub fn with_standard_ability(mut self, ability_id: AbilityId) -> Self {
        self.standard_abilities.insert(ability_id);
        self
    }

    pub fn with_custom_ability(mut self, ability: CustomAbility) -> Self {
        self.custom_ability = Some(ability);
        self
    }

    pub fn with_hamon_ability(mut self, ability_id: HamonAbilityId) -> Self {
        self.hamon_abilities.insert(ability_id);
        self
    }

    pub fn with_spin_ability(mut self, ability_id: SpinAbilityId) -> Self {
        self.spin_abilities.insert(ability_id);
        self
    }

    pub fn with_extra_custom_ability(mut self, description: impl Into<String>) -> Self {
        self.extra_custom_abilities.push(description.into());
        self
    }

    pub fn with_vice(mut self, vice_id: ViceId) -> Self {
        self.vice = Some(vice_id);
        self
    }

    pub fn with_xp(mut self, xp: XpLedger) -> Self {
        self.xp = xp;
        self
    }

    pub fn with_s_rank_permission(mut self, allowed: bool) -> Self {
        self.gm.can_have_s_rank_stand_stats = allowed;
        self
    }

    pub fn with_locked_field(mut self, field: CharacterField) -> Self {
        self.gm.locked_fields.insert(field);
        self
    }

    pub fn with_character_locked(mut self, locked: bool) -> Self {
        self.gm.character_locked = locked;
        self
    }

    // =========================================================================
    // Identity Mutations
    // =========================================================================

    pub fn set_true_name(&mut self, name: CharacterName) {
        self.true_name = name;
    }

    /// Blank aliases are stored as `None`.
    pub fn set_alias(&mut self, alias: Option<String>) {
        self.alias = alias
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
    }

    pub fn set_background(&mut self, background: impl Into<String>) {
        self.background = background.into();
    }

    // =========================================================================
    // Heritage Mutations
    // =========================================================================

    /// Switch heritage. Benefit and detriment picks belong to the old
    /// heritage's menu, so they are cleared.
    pub fn choose_heritage(&mut self, heritage_id: HeritageId) {
        if self.heritage_id != Some(heritage_id) {
            self.selected_benefits.clear();
            self.selected_detriments.clear();
        }
        self.heritage_id = Some(heritage_id);
    }

    pub fn select_benefit(&mut self, benefit_id: BenefitId) -> bool {
        self.selected_benefits.insert(benefit_id)
    }

    pub fn deselect_benefit(&mut self, benefit_id: BenefitId) -> bool {
        self.selected_benefits.remove(&benefit_id)
    }

    pub fn select_detriment(&mut self, detriment_id: DetrimentId) -> bool {
        self.selected_detriments.insert(detriment_id)
    }

    pub fn deselect_detriment(&mut self, detriment_id: DetrimentId) -> bool {
        self.selected_detriments.remove(&detriment_id)
    }

    // =========================================================================
    // Sheet Mutations
    // =========================================================================

    pub fn set_playbook(&mut self, playbook: Playbook) {
        self.playbook = playbook;
    }

    pub fn set_action(&mut self, action: Action, dots: u8) {
        self.action_dots.set(action, dots);
    }

    pub fn set_coin_stats(&mut self, coin_stats: CoinStats) {
        self.coin_stats = Some(coin_stats);
    }

    /// Stress is not clamped here; stale or out-of-band values are a
    /// validation concern.
    pub fn set_stress(&mut self, stress: i32) {
        self.stress = stress;
    }

    /// Returns `false` if the condition was already present.
    pub fn add_trauma(&mut self, condition: TraumaCondition) -> bool {
        if self.trauma.contains(&condition) {
            return false;
        }
        self.trauma.push(condition);
        true
    }

    pub fn mark_harm(&mut self, level: HarmLevel, name: impl Into<String>) {
        self.harm.mark(level, name);
    }

    pub fn clear_harm(&mut self, level: HarmLevel) {
        self.harm.clear(level);
    }

    pub fn tick_healing(&mut self, amount: u8) {
        self.healing_clock.tick(amount);
    }

    pub fn set_healing_clock(&mut self, clock: HealingClock) {
        self.healing_clock = clock;
    }

    pub fn set_vice(&mut self, vice_id: Option<ViceId>) {
        self.vice = vice_id;
    }

    // =========================================================================
    // Ability Mutations
    // =========================================================================

    pub fn add_standard_ability(&mut self, ability_id: AbilityId) -> bool {
        self.standard_abilities.insert(ability_id)
    }

    pub fn remove_standard_ability(&mut self, ability_id: AbilityId) -> bool {
        self.standard_abilities.remove(&ability_id)
    }

    pub fn set_custom_ability(&mut self, ability: Option<CustomAbility>) {
        self.custom_ability = ability;
    }

    pub fn add_hamon_ability(&mut self, ability_id: HamonAbilityId) -> bool {
        self.hamon_abilities.insert(ability_id)
    }

    pub fn remove_hamon_ability(&mut self, ability_id: HamonAbilityId) -> bool {
        self.hamon_abilities.remove(&ability_id)
    }

    pub fn add_spin_ability(&mut self, ability_id: SpinAbilityId) -> bool {
        self.spin_abilities.insert(ability_id)
    }

    pub fn remove_spin_ability(&mut self, ability_id: SpinAbilityId) -> bool {
        self.spin_abilities.remove(&ability_id)
    }

    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank description.
    pub fn add_extra_custom_ability(&mut self, description: impl Into<String>) -> Result<(), DomainError> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(DomainError::validation(
                "Extra custom ability description cannot be empty",
            ));
        }
        self.extra_custom_abilities.push(description);
        Ok(())
    }

    // =========================================================================
    // Experience
    // =========================================================================

    /// # Errors
    ///
    /// See [`XpLedger::gain`].
    pub fn gain_xp(&mut self, track: XpTrack, amount: i32) -> Result<XpGained, RuleViolation> {
        self.xp.gain(track, amount)
    }

    /// Atomic spend of one or more advancements from `track`.
    ///
    /// # Errors
    ///
    /// See [`XpLedger::spend`]. The character is unchanged on error.
    pub fn spend_xp(
        &mut self,
        track: XpTrack,
        purchases: &[Purchase],
        costs: &AdvancementCosts,
    ) -> Result<XpSpent, RuleViolation> {
        self.xp.spend(track, purchases, costs)
    }

    // =========================================================================
    // GM Controls
    // =========================================================================

    /// Idempotent: locking an already-locked field changes nothing.
    pub fn lock_field(&mut self, field: CharacterField) -> FieldLockOutcome {
        if self.gm.locked_fields.insert(field) {
            FieldLockOutcome::Locked(field)
        } else {
            FieldLockOutcome::AlreadyLocked(field)
        }
    }

    /// Unlocking a field that was never locked is a no-op.
    pub fn unlock_field(&mut self, field: CharacterField) -> FieldUnlockOutcome {
        if self.gm.locked_fields.remove(&field) {
            FieldUnlockOutcome::Unlocked(field)
        } else {
            FieldUnlockOutcome::NotLocked(field)
        }
    }

    pub fn set_character_locked(&mut self, locked: bool) -> GmToggleOutcome {
        let outcome = GmToggleOutcome::between(self.gm.character_locked, locked);
        self.gm.character_locked = locked;
        outcome
    }

    pub fn set_s_rank_permission(&mut self, allowed: bool) -> GmToggleOutcome {
        let outcome = GmToggleOutcome::between(self.gm.can_have_s_rank_stand_stats, allowed);
        self.gm.can_have_s_rank_stand_stats = allowed;
        outcome
    }

    /// Back to no locks and no S-rank permission.
    pub fn reset_gm_controls(&mut self) {
        self.gm = GmControls::default();
    }

    // =========================================================================
    // Persistence Bookkeeping
    // =========================================================================

    /// Carry identity and persistence metadata over from the stored version,
    /// so an edited copy cannot move the character to another owner or id.
    pub fn adopt_identity_of(&mut self, stored: &Character) {
        self.id = stored.id;
        self.version = stored.version;
        self.owner = stored.owner;
        self.campaign_id = stored.campaign_id;
    }
}

// ============================================================================
// Tests
// ============================================================================
