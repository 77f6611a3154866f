//! Character progression use cases.
//!
//! Binds the rules engine to storage: creation, edits, XP gain and spend,
//! GM lock controls, and the read-only derived views. Every accepted change
//! is saved with compare-and-swap and then leaves one history record. A
//! history append that fails after the save is reported on the result, not
//! as an error, since the change itself is already stored.

mod error;

pub use error::CharacterProgressionError;

use std::sync::Arc;

use bizarre_domain::{
    apply_update, eligible_abilities,
    rules::{guard_creation, guard_update},
    AdvancementCosts, Character,
    CharacterDiff, CharacterField, CharacterId, CharacterValidator, DerivedStats,
    DerivedStatsCalculator, Editor, FieldLockOutcome, FieldUnlockOutcome, GmToggleOutcome,
    Heritage, HistoryRecord, PlaybookAbility, Purchase, RuleViolations, ValidationContext,
    ValidationMode, XpGained, XpSpent, XpTrack,
};

use crate::infrastructure::ports::{
    CharacterRepo, ClockPort, HistorySink, ReferenceCatalog, RepoError,
};
use crate::infrastructure::settings::EngineSettings;

// =============================================================================
// Result Types
// =============================================================================

/// What happened to the history record of a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStatus {
    Recorded,
    /// Nothing changed, so nothing was saved or recorded.
    Unchanged,
    /// The change was saved but the history sink refused the record.
    Failed(String),
}

impl HistoryStatus {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct CreateResult {
    pub character: Character,
    pub history: HistoryStatus,
}

/// An accepted edit and the fields it changed.
#[derive(Debug, Clone)]
pub struct UpdateResult {
    pub character: Character,
    pub diff: CharacterDiff,
    pub history: HistoryStatus,
}

#[derive(Debug, Clone)]
pub struct XpGainResult {
    pub character: Character,
    pub gained: XpGained,
    pub history: HistoryStatus,
}

#[derive(Debug, Clone)]
pub struct XpSpendResult {
    pub character: Character,
    pub spent: XpSpent,
    pub history: HistoryStatus,
}

#[derive(Debug, Clone)]
pub struct LockFieldsResult {
    pub character: Character,
    pub outcomes: Vec<FieldLockOutcome>,
    pub history: HistoryStatus,
}

#[derive(Debug, Clone)]
pub struct UnlockFieldsResult {
    pub character: Character,
    pub outcomes: Vec<FieldUnlockOutcome>,
    pub history: HistoryStatus,
}

#[derive(Debug, Clone)]
pub struct GmToggleResult {
    pub character: Character,
    pub outcome: GmToggleOutcome,
    pub history: HistoryStatus,
}

// =============================================================================
// Use Cases
// =============================================================================

/// Container for character progression use cases.
pub struct CharacterProgressionUseCases {
    characters: Arc<dyn CharacterRepo>,
    catalog: Arc<dyn ReferenceCatalog>,
    history: Arc<dyn HistorySink>,
    clock: Arc<dyn ClockPort>,
    validator: CharacterValidator,
    playbook_xp_cap: i32,
}

impl CharacterProgressionUseCases {
    pub fn new(
        characters: Arc<dyn CharacterRepo>,
        catalog: Arc<dyn ReferenceCatalog>,
        history: Arc<dyn HistorySink>,
        clock: Arc<dyn ClockPort>,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            characters,
            catalog,
            history,
            clock,
            validator: settings.validator(),
            playbook_xp_cap: settings.playbook_xp_cap,
        }
    }

    // =========================================================================
    // Creation and Edits
    // =========================================================================

    /// Validate a brand-new character against the creation rules and store
    /// it at version 1. The history record lists every field as new.
    ///
    /// Only a GM may create a character with GM controls already set.
    pub fn create(
        &self,
        character: Character,
        editor: Editor,
    ) -> Result<CreateResult, CharacterProgressionError> {
        guard_creation(&character, editor, self.costs())
            .map_err(|violation| self.rejected("create", character.id(), violation.into()))?;

        let heritage = self.heritage_of(&character)?;
        let abilities = self.catalog.playbook_abilities()?;
        let ctx = ValidationContext::new(heritage.as_ref(), &abilities);

        if let Err(violations) =
            self.validator
                .validate(&character, &ctx, ValidationMode::Creation)
        {
            return Err(self.rejected("create", character.id(), violations));
        }
        self.check_playbook_cap(character.id(), 0, &character)?;

        let diff = character.snapshot(self.costs()).as_creation_diff();
        let (character, history) = self.persist(character, diff)?;

        tracing::info!(
            character_id = %character.id(),
            owner = %character.owner(),
            version = character.version(),
            gm = editor.is_gm(),
            "Character created"
        );
        Ok(CreateResult { character, history })
    }

    /// Replace a stored character with an edited copy.
    ///
    /// `proposed.version()` must match the stored version; identity fields
    /// are always taken from the stored character.
    pub fn update(
        &self,
        proposed: Character,
        editor: Editor,
    ) -> Result<UpdateResult, CharacterProgressionError> {
        let original = self.load(proposed.id())?;
        if proposed.version() != original.version() {
            let err = RepoError::version_conflict(
                "Character",
                original.id(),
                proposed.version(),
                original.version(),
            );
            tracing::debug!(
                character_id = %original.id(),
                expected = proposed.version(),
                found = original.version(),
                "Update based on a stale version"
            );
            return Err(err.into());
        }

        let (character, diff, history) = self.commit(&original, proposed, editor, "update")?;
        tracing::info!(
            character_id = %character.id(),
            changed = diff.len(),
            gm = editor.is_gm(),
            "Character updated"
        );
        Ok(UpdateResult {
            character,
            diff,
            history,
        })
    }

    // =========================================================================
    // Experience
    // =========================================================================

    pub fn gain_xp(
        &self,
        id: CharacterId,
        track: XpTrack,
        amount: i32,
        editor: Editor,
    ) -> Result<XpGainResult, CharacterProgressionError> {
        let original = self.load(id)?;
        let mut proposed = original.clone();

        let gained = proposed
            .gain_xp(track, amount)
            .map_err(|violation| self.rejected("gain_xp", id, violation.into()))?;
        guard_update(&original, &proposed, editor, self.costs())
            .map_err(|violation| self.rejected("gain_xp", id, violation.into()))?;

        self.check_playbook_cap(id, original.xp().banked(XpTrack::Playbook), &proposed)?;

        let (character, _, history) = self.commit(&original, proposed, editor, "gain_xp")?;
        tracing::info!(
            character_id = %id,
            track = track.as_str(),
            amount,
            banked = gained.banked,
            "XP gained"
        );
        Ok(XpGainResult {
            character,
            gained,
            history,
        })
    }

    /// Spend banked XP on one or more advancements as a single transaction.
    pub fn spend_xp(
        &self,
        id: CharacterId,
        track: XpTrack,
        purchases: &[Purchase],
        editor: Editor,
    ) -> Result<XpSpendResult, CharacterProgressionError> {
        let original = self.load(id)?;
        let mut proposed = original.clone();

        let spent = proposed
            .spend_xp(track, purchases, self.costs())
            .map_err(|violation| self.rejected("spend_xp", id, violation.into()))?;

        let (character, _, history) = self.commit(&original, proposed, editor, "spend_xp")?;
        tracing::info!(
            character_id = %id,
            track = track.as_str(),
            cost = spent.cost,
            remaining = spent.remaining,
            level = spent.level_after,
            leveled_up = spent.leveled_up(),
            "XP spent"
        );
        Ok(XpSpendResult {
            character,
            spent,
            history,
        })
    }

    // =========================================================================
    // GM Controls
    // =========================================================================

    pub fn lock_fields(
        &self,
        id: CharacterId,
        fields: &[CharacterField],
        is_gm: bool,
    ) -> Result<LockFieldsResult, CharacterProgressionError> {
        self.require_gm(id, is_gm, "lock fields")?;
        let original = self.load(id)?;
        let mut proposed = original.clone();

        let outcomes: Vec<_> = fields.iter().map(|&field| proposed.lock_field(field)).collect();
        let (character, history) = self.commit_gm_controls(&original, proposed)?;

        tracing::info!(
            character_id = %id,
            fields = ?fields,
            "Fields locked"
        );
        Ok(LockFieldsResult {
            character,
            outcomes,
            history,
        })
    }

    pub fn unlock_fields(
        &self,
        id: CharacterId,
        fields: &[CharacterField],
        is_gm: bool,
    ) -> Result<UnlockFieldsResult, CharacterProgressionError> {
        self.require_gm(id, is_gm, "unlock fields")?;
        let original = self.load(id)?;
        let mut proposed = original.clone();

        let outcomes: Vec<_> = fields
            .iter()
            .map(|&field| proposed.unlock_field(field))
            .collect();
        let (character, history) = self.commit_gm_controls(&original, proposed)?;

        tracing::info!(
            character_id = %id,
            fields = ?fields,
            "Fields unlocked"
        );
        Ok(UnlockFieldsResult {
            character,
            outcomes,
            history,
        })
    }

    pub fn set_character_locked(
        &self,
        id: CharacterId,
        locked: bool,
        is_gm: bool,
    ) -> Result<GmToggleResult, CharacterProgressionError> {
        self.require_gm(id, is_gm, "lock characters")?;
        let original = self.load(id)?;
        let mut proposed = original.clone();

        let outcome = proposed.set_character_locked(locked);
        let (character, history) = self.commit_gm_controls(&original, proposed)?;

        tracing::info!(character_id = %id, locked, "Character lock set");
        Ok(GmToggleResult {
            character,
            outcome,
            history,
        })
    }

    /// Grant or revoke S-rank stand stats. Existing stats are not re-checked
    /// until the next edit.
    pub fn set_s_rank_permission(
        &self,
        id: CharacterId,
        allowed: bool,
        is_gm: bool,
    ) -> Result<GmToggleResult, CharacterProgressionError> {
        self.require_gm(id, is_gm, "grant S-rank stand stats")?;
        let original = self.load(id)?;
        let mut proposed = original.clone();

        let outcome = proposed.set_s_rank_permission(allowed);
        let (character, history) = self.commit_gm_controls(&original, proposed)?;

        tracing::info!(character_id = %id, allowed, "S-rank permission set");
        Ok(GmToggleResult {
            character,
            outcome,
            history,
        })
    }

    // =========================================================================
    // Read-only Views
    // =========================================================================

    pub fn derived_stats(&self, id: CharacterId) -> Result<DerivedStats, CharacterProgressionError> {
        let character = self.load(id)?;
        Ok(DerivedStatsCalculator::new(self.validator.tables()).for_character(&character))
    }

    /// Hamon or Spin abilities the character's playbook and A grades unlock.
    pub fn eligible_abilities(
        &self,
        id: CharacterId,
    ) -> Result<Vec<PlaybookAbility>, CharacterProgressionError> {
        let character = self.load(id)?;
        let catalog = self.catalog.playbook_abilities()?;
        Ok(
            eligible_abilities(character.playbook(), character.a_grade_count(), &catalog)
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn costs(&self) -> &AdvancementCosts {
        &self.validator.tables().advancement
    }

    fn load(&self, id: CharacterId) -> Result<Character, CharacterProgressionError> {
        self.characters
            .get(id)?
            .ok_or(CharacterProgressionError::CharacterNotFound(id))
    }

    /// `None` when no heritage is chosen or the catalog does not know it;
    /// validation reports both as a missing heritage.
    fn heritage_of(&self, character: &Character) -> Result<Option<Heritage>, RepoError> {
        match character.heritage_id() {
            Some(heritage_id) => self.catalog.heritage(heritage_id),
            None => Ok(None),
        }
    }

    fn require_gm(
        &self,
        id: CharacterId,
        is_gm: bool,
        action: &'static str,
    ) -> Result<(), CharacterProgressionError> {
        if is_gm {
            return Ok(());
        }
        tracing::warn!(character_id = %id, action, "Rejected: caller is not the game master");
        Err(CharacterProgressionError::NotGameMaster { action })
    }

    fn rejected(
        &self,
        operation: &'static str,
        id: CharacterId,
        violations: RuleViolations,
    ) -> CharacterProgressionError {
        let first = violations.first();
        tracing::warn!(
            character_id = %id,
            operation,
            kind = first.kind.as_str(),
            field = %first.field,
            violations = violations.len(),
            "Change rejected: {}",
            first.message
        );
        CharacterProgressionError::Rejected(violations)
    }

    /// Reject any change that raises the playbook track above the cap.
    /// Tracks already above it (a lowered cap) may still be spent down.
    fn check_playbook_cap(
        &self,
        id: CharacterId,
        before: i32,
        proposed: &Character,
    ) -> Result<(), CharacterProgressionError> {
        let after = proposed.xp().banked(XpTrack::Playbook);
        if after <= before || after <= self.playbook_xp_cap {
            return Ok(());
        }
        let requested = after.saturating_sub(before);
        tracing::warn!(
            character_id = %id,
            current = before,
            requested,
            cap = self.playbook_xp_cap,
            "Change rejected: playbook XP track full"
        );
        Err(CharacterProgressionError::PlaybookTrackFull {
            cap: self.playbook_xp_cap,
            current: before,
            requested,
        })
    }

    /// Run the update pipeline against `original` and persist the result.
    /// An edit that changes nothing is not saved.
    fn commit(
        &self,
        original: &Character,
        proposed: Character,
        editor: Editor,
        operation: &'static str,
    ) -> Result<(Character, CharacterDiff, HistoryStatus), CharacterProgressionError> {
        let heritage = self.heritage_of(&proposed)?;
        let abilities = self.catalog.playbook_abilities()?;
        let ctx = ValidationContext::new(heritage.as_ref(), &abilities);

        let (accepted, diff) = apply_update(original, proposed, editor, &self.validator, &ctx)
            .map_err(|violations| self.rejected(operation, original.id(), violations))?;
        self.check_playbook_cap(
            original.id(),
            original.xp().banked(XpTrack::Playbook),
            &accepted,
        )?;
        if diff.is_empty() {
            return Ok((accepted, diff, HistoryStatus::Unchanged));
        }

        let (stored, history) = self.persist(accepted, diff.clone())?;
        Ok((stored, diff, history))
    }

    /// GM control edits skip the rules battery; they never alter the sheet.
    fn commit_gm_controls(
        &self,
        original: &Character,
        proposed: Character,
    ) -> Result<(Character, HistoryStatus), CharacterProgressionError> {
        let costs = self.costs();
        let diff = original.snapshot(costs).diff(&proposed.snapshot(costs));
        if diff.is_empty() {
            return Ok((proposed, HistoryStatus::Unchanged));
        }
        self.persist(proposed, diff)
    }

    /// Save, then append the history record. Once the save has succeeded
    /// the change is returned even if the append fails.
    fn persist(
        &self,
        character: Character,
        diff: CharacterDiff,
    ) -> Result<(Character, HistoryStatus), CharacterProgressionError> {
        let id = character.id();
        let version = self.characters.save(&character).inspect_err(|err| {
            if let RepoError::VersionConflict {
                expected, found, ..
            } = err
            {
                tracing::debug!(
                    character_id = %id,
                    expected,
                    found,
                    "Save lost a version race"
                );
            }
        })?;

        let history = match self
            .history
            .append(HistoryRecord::new(id, self.clock.now(), diff))
        {
            Ok(()) => HistoryStatus::Recorded,
            Err(err) => {
                tracing::error!(
                    character_id = %id,
                    version,
                    error = %err,
                    "Change saved but its history record was not appended"
                );
                HistoryStatus::Failed(err.to_string())
            }
        };
        Ok((character.with_version(version), history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        MockCharacterRepo, MockClockPort, MockHistorySink, MockReferenceCatalog,
    };
    use bizarre_domain::{
        AbilityId, AbilityTier, Action, ActionRatings, Advancement, Benefit, CharacterName,
        CoinStats, CustomAbility, CustomAbilityMode, Detriment, ErrorKind, Grade, Playbook,
        UserId, XpLedger,
    };
    use chrono::{TimeZone, Utc};
    use mockall::predicate::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 19, 0, 0).unwrap()
    }

    fn heritage() -> Heritage {
        Heritage::new("Rock Human", 2)
            .with_benefit(Benefit::new("Stone Skin", 2))
            .with_detriment(Detriment::new("Sluggish", 1).required())
    }

    /// Passes every creation check against `heritage`.
    fn new_character(heritage: &Heritage) -> Character {
        let dots = ActionRatings::new()
            .with(Action::Hunt, 2)
            .with(Action::Study, 1)
            .with(Action::Finesse, 2)
            .with(Action::Command, 1)
            .with(Action::Sway, 1);
        Character::new(UserId::new(), CharacterName::new("Rohan Kishibe").unwrap())
            .with_heritage(heritage.id)
            .with_benefit(heritage.benefits[0].id)
            .with_detriment(heritage.detriments[0].id)
            .with_action_dots(dots)
            .with_coin_stats(CoinStats::new(
                Grade::B,
                Grade::B,
                Grade::C,
                Grade::C,
                Grade::F,
                Grade::F,
            ))
            .with_stress(10)
            .with_standard_ability(AbilityId::new())
            .with_standard_ability(AbilityId::new())
            .with_custom_ability(
                CustomAbility::new("Heaven's Door", CustomAbilityMode::SingleWith3Uses).unwrap(),
            )
    }

    fn stored(heritage: &Heritage, version: u64) -> Character {
        new_character(heritage).with_version(version)
    }

    fn catalog_with(heritage: Heritage) -> MockReferenceCatalog {
        let mut catalog = MockReferenceCatalog::new();
        catalog
            .expect_heritage()
            .returning(move |_| Ok(Some(heritage.clone())));
        catalog.expect_playbook_abilities().returning(|| Ok(vec![]));
        catalog
    }

    fn fixed_clock() -> MockClockPort {
        let mut clock = MockClockPort::new();
        clock.expect_now().return_const(now());
        clock
    }

    fn repo_with(character: Character) -> MockCharacterRepo {
        let mut repo = MockCharacterRepo::new();
        let id = character.id();
        repo.expect_get()
            .with(eq(id))
            .returning(move |_| Ok(Some(character.clone())));
        repo
    }

    fn recording_history(records: Arc<Mutex<Vec<HistoryRecord>>>) -> MockHistorySink {
        let mut history = MockHistorySink::new();
        history.expect_append().returning(move |record| {
            records.lock().unwrap().push(record);
            Ok(())
        });
        history
    }

    fn use_cases(
        repo: MockCharacterRepo,
        catalog: MockReferenceCatalog,
        history: MockHistorySink,
        clock: MockClockPort,
    ) -> CharacterProgressionUseCases {
        CharacterProgressionUseCases::new(
            Arc::new(repo),
            Arc::new(catalog),
            Arc::new(history),
            Arc::new(clock),
            &EngineSettings::default(),
        )
    }

    mod create {
        use super::*;

        #[test]
        fn stores_version_one_and_records_every_field() {
            let heritage = heritage();
            let character = new_character(&heritage);
            let id = character.id();

            let mut repo = MockCharacterRepo::new();
            repo.expect_save()
                .withf(move |c| c.id() == id && c.version() == 0)
                .times(1)
                .returning(|_| Ok(1));

            let records = Arc::new(Mutex::new(Vec::new()));
            let uc = use_cases(
                repo,
                catalog_with(heritage),
                recording_history(records.clone()),
                fixed_clock(),
            );

            let created = uc.create(character, Editor::Player).unwrap();
            assert_eq!(created.character.version(), 1);
            assert_eq!(created.history, HistoryStatus::Recorded);

            let records = records.lock().unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].character_id, id);
            assert_eq!(records[0].timestamp, now());
            assert_eq!(records[0].changed_fields.len(), CharacterField::ALL.len());
            assert!(records[0]
                .changed_fields
                .iter()
                .all(|(_, change)| change.old.is_null()));
        }

        #[test]
        fn invalid_character_is_not_saved() {
            let heritage = heritage();
            let character = new_character(&heritage).with_stress(9);

            let mut repo = MockCharacterRepo::new();
            repo.expect_save().never();
            let mut history = MockHistorySink::new();
            history.expect_append().never();

            let uc = use_cases(repo, catalog_with(heritage), history, fixed_clock());
            let err = uc.create(character, Editor::Player).unwrap_err();
            let violations = err.violations().unwrap();
            assert_eq!(violations.first().kind, ErrorKind::StressMismatch);
        }

        #[test]
        fn unknown_heritage_is_missing() {
            let heritage = heritage();
            let character = new_character(&heritage);

            let mut catalog = MockReferenceCatalog::new();
            catalog.expect_heritage().returning(|_| Ok(None));
            catalog.expect_playbook_abilities().returning(|| Ok(vec![]));

            let uc = use_cases(
                MockCharacterRepo::new(),
                catalog,
                MockHistorySink::new(),
                fixed_clock(),
            );
            let err = uc.create(character, Editor::Player).unwrap_err();
            assert_eq!(
                err.violations().unwrap().first().kind,
                ErrorKind::MissingHeritage
            );
        }

        #[test]
        fn catalog_failure_propagates() {
            let heritage = heritage();
            let character = new_character(&heritage);

            let mut catalog = MockReferenceCatalog::new();
            catalog
                .expect_heritage()
                .returning(|_| Err(RepoError::storage("heritage", "catalog offline")));

            let uc = use_cases(
                MockCharacterRepo::new(),
                catalog,
                MockHistorySink::new(),
                fixed_clock(),
            );
            assert!(matches!(
                uc.create(character, Editor::Player),
                Err(CharacterProgressionError::Repo(RepoError::Storage { .. }))
            ));
        }

        /// S+B+C+F+F+F spends the ten creation points; durability F gives stress 8.
        fn s_rank_character(heritage: &Heritage) -> Character {
            new_character(heritage)
                .with_coin_stats(CoinStats::new(
                    Grade::S,
                    Grade::B,
                    Grade::C,
                    Grade::F,
                    Grade::F,
                    Grade::F,
                ))
                .with_stress(8)
                .with_s_rank_permission(true)
        }

        #[test]
        fn player_cannot_grant_own_s_rank_permission() {
            let heritage = heritage();
            let character = s_rank_character(&heritage);

            let mut repo = MockCharacterRepo::new();
            repo.expect_save().never();
            let mut history = MockHistorySink::new();
            history.expect_append().never();

            let uc = use_cases(repo, catalog_with(heritage), history, fixed_clock());
            let err = uc.create(character, Editor::Player).unwrap_err();
            let first = err.violations().unwrap().first().clone();
            assert_eq!(first.kind, ErrorKind::FieldLocked);
            assert_eq!(first.field, "gm_can_have_s_rank_stand_stats");
        }

        #[test]
        fn gm_may_create_with_s_rank_permission() {
            let heritage = heritage();
            let character = s_rank_character(&heritage);

            let mut repo = MockCharacterRepo::new();
            repo.expect_save()
                .withf(|c| c.gm().can_have_s_rank_stand_stats())
                .times(1)
                .returning(|_| Ok(1));

            let uc = use_cases(
                repo,
                catalog_with(heritage),
                recording_history(Arc::new(Mutex::new(Vec::new()))),
                fixed_clock(),
            );
            let created = uc.create(character, Editor::GameMaster).unwrap();
            assert_eq!(created.character.version(), 1);
        }

        #[test]
        fn banked_playbook_xp_over_the_cap_is_refused() {
            let heritage = heritage();
            let ledger = XpLedger::from_parts(
                [(XpTrack::Playbook, 500)].into_iter().collect::<BTreeMap<_, _>>(),
                0,
                0,
                0,
                0,
            );
            let character = new_character(&heritage).with_xp(ledger);

            let mut repo = MockCharacterRepo::new();
            repo.expect_save().never();

            let uc = use_cases(repo, catalog_with(heritage), MockHistorySink::new(), fixed_clock());
            let err = uc.create(character, Editor::GameMaster).unwrap_err();
            assert!(matches!(
                err,
                CharacterProgressionError::PlaybookTrackFull {
                    cap: 10,
                    current: 0,
                    requested: 500
                }
            ));
        }
    }

    mod update {
        use super::*;

        #[test]
        fn saves_and_records_the_diff() {
            let heritage = heritage();
            let original = stored(&heritage, 3);
            let mut repo = repo_with(original.clone());
            repo.expect_save()
                .withf(|c| c.version() == 3 && c.alias() == Some("Rohan"))
                .times(1)
                .returning(|c| Ok(c.version() + 1));

            let records = Arc::new(Mutex::new(Vec::new()));
            let uc = use_cases(
                repo,
                catalog_with(heritage),
                recording_history(records.clone()),
                fixed_clock(),
            );

            let mut proposed = original.clone();
            proposed.set_alias(Some("Rohan".to_string()));
            let result = uc.update(proposed, Editor::Player).unwrap();

            assert_eq!(result.character.version(), 4);
            assert_eq!(result.diff.fields().collect::<Vec<_>>(), vec![CharacterField::Alias]);
            assert!(result.history.is_recorded());
            assert_eq!(records.lock().unwrap().len(), 1);
        }

        #[test]
        fn history_failure_after_save_still_returns_the_stored_character() {
            let heritage = heritage();
            let original = stored(&heritage, 1);
            let mut repo = repo_with(original.clone());
            repo.expect_save().times(1).returning(|_| Ok(2));

            let mut history = MockHistorySink::new();
            history
                .expect_append()
                .times(1)
                .returning(|_| Err(RepoError::storage("append_history", "disk full")));

            let uc = use_cases(repo, catalog_with(heritage), history, fixed_clock());
            let mut proposed = original.clone();
            proposed.set_alias(Some("Rohan".to_string()));

            let result = uc.update(proposed, Editor::Player).unwrap();
            assert_eq!(result.character.version(), 2);
            assert_eq!(result.character.alias(), Some("Rohan"));
            assert!(result.history.is_failed());
            match result.history {
                HistoryStatus::Failed(message) => assert!(message.contains("disk full")),
                other => panic!("expected a failed history write, got {other:?}"),
            }
        }

        #[test]
        fn player_cannot_raise_playbook_track_past_the_cap() {
            let heritage = heritage();
            let original = stored(&heritage, 1);
            let mut repo = repo_with(original.clone());
            repo.expect_save().never();

            let uc = use_cases(repo, catalog_with(heritage), MockHistorySink::new(), fixed_clock());
            let ledger = XpLedger::from_parts(
                [(XpTrack::Playbook, 50)].into_iter().collect::<BTreeMap<_, _>>(),
                0,
                0,
                0,
                0,
            );
            let proposed = original.with_xp(ledger);

            let err = uc.update(proposed, Editor::Player).unwrap_err();
            assert!(matches!(
                err,
                CharacterProgressionError::PlaybookTrackFull {
                    cap: 10,
                    current: 0,
                    requested: 50
                }
            ));
        }

        #[test]
        fn stale_version_is_a_conflict() {
            let heritage = heritage();
            let original = stored(&heritage, 3);
            let mut repo = repo_with(original.clone());
            repo.expect_save().never();

            let uc = use_cases(repo, catalog_with(heritage), MockHistorySink::new(), fixed_clock());
            let proposed = original.with_version(2);
            let err = uc.update(proposed, Editor::Player).unwrap_err();
            assert!(err.is_version_conflict());
        }

        #[test]
        fn locked_field_rejects_player_edit() {
            let heritage = heritage();
            let original = stored(&heritage, 1).with_locked_field(CharacterField::Background);
            let mut repo = repo_with(original.clone());
            repo.expect_save().never();

            let uc = use_cases(repo, catalog_with(heritage), MockHistorySink::new(), fixed_clock());
            let mut proposed = original.clone();
            proposed.set_background("Manga artist in Morioh");

            let err = uc.update(proposed, Editor::Player).unwrap_err();
            let first = err.violations().unwrap().first().clone();
            assert_eq!(first.kind, ErrorKind::FieldLocked);
            assert_eq!(first.field, "background");
            assert!(err.is_recoverable());
        }

        #[test]
        fn unchanged_edit_is_not_saved() {
            let heritage = heritage();
            let original = stored(&heritage, 2);
            let mut repo = repo_with(original.clone());
            repo.expect_save().never();

            let uc = use_cases(repo, catalog_with(heritage), MockHistorySink::new(), fixed_clock());
            let result = uc.update(original, Editor::Player).unwrap();
            assert!(result.diff.is_empty());
            assert_eq!(result.character.version(), 2);
            assert_eq!(result.history, HistoryStatus::Unchanged);
        }

        #[test]
        fn missing_character() {
            let heritage = heritage();
            let mut repo = MockCharacterRepo::new();
            repo.expect_get().returning(|_| Ok(None));

            let uc = use_cases(repo, catalog_with(heritage.clone()), MockHistorySink::new(), fixed_clock());
            let err = uc.update(stored(&heritage, 1), Editor::Player).unwrap_err();
            assert!(matches!(err, CharacterProgressionError::CharacterNotFound(_)));
        }
    }

    mod experience {
        use super::*;

        fn saving_repo(character: Character) -> MockCharacterRepo {
            let mut repo = repo_with(character);
            repo.expect_save().returning(|c| Ok(c.version() + 1));
            repo
        }

        #[test]
        fn gain_credits_the_track() {
            let heritage = heritage();
            let original = stored(&heritage, 1);
            let id = original.id();

            let records = Arc::new(Mutex::new(Vec::new()));
            let uc = use_cases(
                saving_repo(original),
                catalog_with(heritage),
                recording_history(records.clone()),
                fixed_clock(),
            );

            let result = uc.gain_xp(id, XpTrack::Insight, 4, Editor::Player).unwrap();
            assert_eq!(result.gained.banked, 4);
            assert_eq!(result.character.xp().banked(XpTrack::Insight), 4);
            assert_eq!(result.character.version(), 2);
            assert!(records.lock().unwrap()[0]
                .changed_fields
                .contains(CharacterField::XpClocks));
        }

        #[test]
        fn playbook_track_is_capped() {
            let heritage = heritage();
            let ledger = XpLedger::from_parts(
                [(XpTrack::Playbook, 8)].into_iter().collect::<BTreeMap<_, _>>(),
                0,
                0,
                0,
                0,
            );
            let original = stored(&heritage, 1).with_xp(ledger);
            let id = original.id();

            let mut repo = repo_with(original);
            repo.expect_save().never();
            let uc = use_cases(repo, catalog_with(heritage), MockHistorySink::new(), fixed_clock());

            let err = uc.gain_xp(id, XpTrack::Playbook, 3, Editor::Player).unwrap_err();
            assert!(matches!(
                err,
                CharacterProgressionError::PlaybookTrackFull {
                    cap: 10,
                    current: 8,
                    requested: 3
                }
            ));
        }

        #[test]
        fn non_positive_gain_is_invalid() {
            let heritage = heritage();
            let original = stored(&heritage, 1);
            let id = original.id();

            let uc = use_cases(
                repo_with(original),
                catalog_with(heritage),
                MockHistorySink::new(),
                fixed_clock(),
            );
            let err = uc.gain_xp(id, XpTrack::Resolve, 0, Editor::Player).unwrap_err();
            assert_eq!(
                err.violations().unwrap().first().kind,
                ErrorKind::InvalidAmount
            );
        }

        #[test]
        fn locked_ledger_blocks_player_gain_but_not_gm() {
            let heritage = heritage();
            let original = stored(&heritage, 1).with_locked_field(CharacterField::XpClocks);
            let id = original.id();

            let uc = use_cases(
                saving_repo(original),
                catalog_with(heritage),
                recording_history(Arc::new(Mutex::new(Vec::new()))),
                fixed_clock(),
            );

            let err = uc.gain_xp(id, XpTrack::Prowess, 2, Editor::Player).unwrap_err();
            assert_eq!(err.violations().unwrap().first().field, "xp_clocks");

            let result = uc.gain_xp(id, XpTrack::Prowess, 2, Editor::GameMaster).unwrap();
            assert_eq!(result.character.xp().banked(XpTrack::Prowess), 2);
        }

        #[test]
        fn spend_levels_up() {
            let heritage = heritage();
            let ledger = XpLedger::from_parts(
                [(XpTrack::Insight, 10)].into_iter().collect::<BTreeMap<_, _>>(),
                0,
                0,
                0,
                0,
            );
            let original = stored(&heritage, 5).with_xp(ledger);
            let id = original.id();

            let uc = use_cases(
                saving_repo(original),
                catalog_with(heritage),
                recording_history(Arc::new(Mutex::new(Vec::new()))),
                fixed_clock(),
            );

            let result = uc
                .spend_xp(
                    id,
                    XpTrack::Insight,
                    &[Purchase::new(Advancement::ActionDie, 2)],
                    Editor::Player,
                )
                .unwrap();
            assert_eq!(result.spent.cost, 10);
            assert!(result.spent.leveled_up());
            assert_eq!(result.character.xp().total_xp_spent(), 10);
            assert_eq!(result.character.version(), 6);
        }

        #[test]
        fn scenario_d_insufficient_xp() {
            let heritage = heritage();
            let ledger = XpLedger::from_parts(
                [(XpTrack::Heritage, 3)].into_iter().collect::<BTreeMap<_, _>>(),
                0,
                0,
                0,
                0,
            );
            let original = stored(&heritage, 1).with_xp(ledger);
            let id = original.id();

            let mut repo = repo_with(original);
            repo.expect_save().never();
            let uc = use_cases(repo, catalog_with(heritage), MockHistorySink::new(), fixed_clock());

            let err = uc
                .spend_xp(
                    id,
                    XpTrack::Heritage,
                    &[Purchase::new(Advancement::HeritagePoint, 1)],
                    Editor::Player,
                )
                .unwrap_err();
            let violations = err.violations().unwrap();
            assert_eq!(violations.first().kind, ErrorKind::InsufficientXp);
            assert!(err.is_recoverable());
        }

        #[test]
        fn single_five_xp_spend_breaks_the_level_step() {
            let heritage = heritage();
            let ledger = XpLedger::from_parts(
                [(XpTrack::Prowess, 5)].into_iter().collect::<BTreeMap<_, _>>(),
                0,
                0,
                0,
                0,
            );
            let original = stored(&heritage, 1).with_xp(ledger);
            let id = original.id();

            let mut repo = repo_with(original);
            repo.expect_save().never();
            let uc = use_cases(repo, catalog_with(heritage), MockHistorySink::new(), fixed_clock());

            let err = uc
                .spend_xp(
                    id,
                    XpTrack::Prowess,
                    &[Purchase::new(Advancement::ActionDie, 1)],
                    Editor::Player,
                )
                .unwrap_err();
            assert_eq!(
                err.violations().unwrap().first().kind,
                ErrorKind::XpArithmeticMismatch
            );
        }
    }

    mod gm_controls {
        use super::*;

        #[test]
        fn players_cannot_lock() {
            let mut repo = MockCharacterRepo::new();
            repo.expect_get().never();
            let uc = use_cases(
                repo,
                MockReferenceCatalog::new(),
                MockHistorySink::new(),
                fixed_clock(),
            );

            let err = uc
                .lock_fields(CharacterId::new(), &[CharacterField::Level], false)
                .unwrap_err();
            assert!(matches!(err, CharacterProgressionError::NotGameMaster { .. }));
        }

        #[test]
        fn lock_is_idempotent() {
            let heritage = heritage();
            let original = stored(&heritage, 1).with_locked_field(CharacterField::Alias);
            let id = original.id();

            let mut repo = repo_with(original);
            repo.expect_save()
                .times(1)
                .returning(|c| Ok(c.version() + 1));

            let records = Arc::new(Mutex::new(Vec::new()));
            let uc = use_cases(
                repo,
                MockReferenceCatalog::new(),
                recording_history(records.clone()),
                fixed_clock(),
            );

            let result = uc
                .lock_fields(id, &[CharacterField::Alias, CharacterField::Level], true)
                .unwrap();
            assert_eq!(
                result.outcomes,
                vec![
                    FieldLockOutcome::AlreadyLocked(CharacterField::Alias),
                    FieldLockOutcome::Locked(CharacterField::Level),
                ]
            );
            assert!(result.character.gm().is_locked(CharacterField::Level));

            let records = records.lock().unwrap();
            assert_eq!(
                records[0].changed_fields.fields().collect::<Vec<_>>(),
                vec![CharacterField::GmLockedFields]
            );
        }

        #[test]
        fn unlocking_nothing_saves_nothing() {
            let heritage = heritage();
            let original = stored(&heritage, 1);
            let id = original.id();

            let mut repo = repo_with(original);
            repo.expect_save().never();
            let uc = use_cases(
                repo,
                MockReferenceCatalog::new(),
                MockHistorySink::new(),
                fixed_clock(),
            );

            let result = uc.unlock_fields(id, &[CharacterField::Stress], true).unwrap();
            assert_eq!(
                result.outcomes,
                vec![FieldUnlockOutcome::NotLocked(CharacterField::Stress)]
            );
        }

        #[test]
        fn toggles_report_changes() {
            let heritage = heritage();
            let original = stored(&heritage, 1);
            let id = original.id();

            let mut repo = repo_with(original);
            repo.expect_save().returning(|c| Ok(c.version() + 1));
            let uc = use_cases(
                repo,
                MockReferenceCatalog::new(),
                recording_history(Arc::new(Mutex::new(Vec::new()))),
                fixed_clock(),
            );

            let locked = uc.set_character_locked(id, true, true).unwrap();
            assert!(locked.outcome.is_changed());
            assert!(locked.character.gm().character_locked());

            let granted = uc.set_s_rank_permission(id, true, true).unwrap();
            assert_eq!(granted.outcome, GmToggleOutcome::between(false, true));

            let err = uc.set_s_rank_permission(id, false, false).unwrap_err();
            assert!(matches!(err, CharacterProgressionError::NotGameMaster { .. }));
        }
    }

    mod views {
        use super::*;

        #[test]
        fn derived_stats_follow_coin_stats() {
            let heritage = heritage();
            let original = stored(&heritage, 1);
            let id = original.id();

            let uc = use_cases(
                repo_with(original),
                MockReferenceCatalog::new(),
                MockHistorySink::new(),
                fixed_clock(),
            );
            let stats = uc.derived_stats(id).unwrap();
            assert_eq!(stats.level, 1);
            let stand = stats.stand.unwrap();
            assert_eq!(stand.stress_capacity, 10);
            assert_eq!(stand.harm_clock_max, 4);
        }

        #[test]
        fn eligible_abilities_filter_by_playbook_and_tier() {
            let heritage = heritage();
            let original = stored(&heritage, 1).with_playbook(Playbook::Hamon);
            let id = original.id();

            let mut catalog = MockReferenceCatalog::new();
            catalog.expect_playbook_abilities().returning(|| {
                Ok(vec![
                    PlaybookAbility::hamon("Zoom Punch", AbilityTier::Foundation),
                    PlaybookAbility::hamon("Sunlight Yellow Overdrive", AbilityTier::Tier1),
                    PlaybookAbility::spin("Golden Rectangle", AbilityTier::Foundation),
                ])
            });

            let uc = use_cases(
                repo_with(original),
                catalog,
                MockHistorySink::new(),
                fixed_clock(),
            );
            let names: Vec<_> = uc
                .eligible_abilities(id)
                .unwrap()
                .into_iter()
                .map(|ability| ability.name)
                .collect();
            assert_eq!(names, vec!["Zoom Punch".to_string()]);
        }
    }
}
