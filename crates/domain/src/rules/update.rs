//! Explicit update pipeline: lock guard, steady-state validation, diff.
//!
//! The audit trail is the return value; nothing is logged as a side effect.

use crate::aggregates::Character;
use crate::error::RuleViolations;
use crate::events::CharacterDiff;
use crate::rules::field_lock::{guard_update, Editor};
use crate::rules::validation::{CharacterValidator, ValidationContext, ValidationMode};

/// Accept `proposed` as the next state of `original`.
///
/// Identity and version are always taken from `original`. Returns the
/// accepted character and the field-level diff against `original`.
///
/// # Errors
///
/// - `FieldLocked` if a frozen field changed (checked first)
/// - any steady-state rule violation
pub fn apply_update(
    original: &Character,
    mut proposed: Character,
    editor: Editor,
    validator: &CharacterValidator,
    ctx: &ValidationContext<'_>,
) -> Result<(Character, CharacterDiff), RuleViolations> {
    proposed.adopt_identity_of(original);

    let costs = &validator.tables().advancement;
    guard_update(original, &proposed, editor, costs)?;
    validator.validate(&proposed, ctx, ValidationMode::SteadyState)?;

    let diff = original.snapshot(costs).diff(&proposed.snapshot(costs));
    Ok((proposed, diff))
}
