//! Hamon/Spin ability tiering.
//!
//! Tiers are cumulative: meeting threshold 3 also opens everything at 1 and 2.
//! Foundation techniques are always open.

use crate::entities::{AbilityTier, PlaybookAbility};
use crate::value_objects::Playbook;

/// Tiers open at the given A-grade count, lowest first.
pub fn unlocked_tiers(a_grade_count: usize) -> Vec<AbilityTier> {
    AbilityTier::ALL
        .into_iter()
        .filter(|tier| tier.is_unlocked(a_grade_count))
        .collect()
}

/// Catalog abilities a character of `playbook` may take with `a_grade_count` A grades.
///
/// A Stand playbook has no technique list, so it always gets an empty result.
pub fn eligible_abilities(
    playbook: Playbook,
    a_grade_count: usize,
    catalog: &[PlaybookAbility],
) -> Vec<&PlaybookAbility> {
    catalog
        .iter()
        .filter(|ability| ability.playbook() == playbook)
        .filter(|ability| ability.tier.is_unlocked(a_grade_count))
        .collect()
}
