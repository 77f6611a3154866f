//! Field lock guard - rejects player edits to fields a GM has frozen.
//!
//! Applies only to characters that already exist; a brand-new character has
//! no lock history to violate.

use std::collections::BTreeSet;

use crate::aggregates::{Character, CharacterSnapshot};
use crate::error::RuleViolation;
use crate::value_objects::{AdvancementCosts, CharacterField};

/// The party making a change. GM capability is decided outside the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Editor {
    Player,
    GameMaster,
}

impl Editor {
    pub fn from_gm_flag(is_gm: bool) -> Self {
        if is_gm {
            Editor::GameMaster
        } else {
            Editor::Player
        }
    }

    pub fn is_gm(&self) -> bool {
        matches!(self, Editor::GameMaster)
    }
}

/// Fail with `FieldLocked` on the first locked field whose value differs.
///
/// # Errors
///
/// `FieldLocked(field)` for the first changed field in canonical order.
pub fn check_update(
    original: &CharacterSnapshot,
    proposed: &CharacterSnapshot,
    locked: &BTreeSet<CharacterField>,
) -> Result<(), RuleViolation> {
    match locked.iter().find(|&&field| original.differs(proposed, field)) {
        Some(field) => Err(RuleViolation::field_locked(field.as_str())),
        None => Ok(()),
    }
}

/// Full guard for an edit of a persisted character.
///
/// A GM passes unconditionally. For a player, a character-wide lock freezes
/// every field, otherwise the GM's locked fields plus the GM controls
/// themselves are frozen. Locks are read from `original`, so a proposal
/// cannot unlock its own way past the guard.
///
/// # Errors
///
/// `FieldLocked` naming the first frozen field that changed.
pub fn guard_update(
    original: &Character,
    proposed: &Character,
    editor: Editor,
    costs: &AdvancementCosts,
) -> Result<(), RuleViolation> {
    if editor.is_gm() {
        return Ok(());
    }

    let before = original.snapshot(costs);
    let after = proposed.snapshot(costs);

    let frozen: BTreeSet<CharacterField> = if original.gm().character_locked() {
        CharacterField::ALL.into_iter().collect()
    } else {
        original
            .gm()
            .locked_fields()
            .iter()
            .copied()
            .chain(CharacterField::ALL.into_iter().filter(CharacterField::is_gm_control))
            .collect()
    };
    check_update(&before, &after, &frozen)
}

/// Guard for a brand-new character: a player cannot arrive with GM controls
/// already set.
///
/// # Errors
///
/// `FieldLocked` naming the first GM-control field that differs from the
/// defaults.
pub fn guard_creation(
    character: &Character,
    editor: Editor,
    costs: &AdvancementCosts,
) -> Result<(), RuleViolation> {
    let mut baseline = character.clone();
    baseline.reset_gm_controls();
    guard_update(&baseline, character, editor, costs)
}
