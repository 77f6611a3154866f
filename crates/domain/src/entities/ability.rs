//! Ability reference records - standard abilities and tiered Hamon/Spin techniques.

use serde::{Deserialize, Serialize};

use crate::ids::{AbilityId, HamonAbilityId, SpinAbilityId};
use crate::value_objects::Playbook;

/// A standard ability any character may select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub id: AbilityId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Ability {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: AbilityId::new(),
            name: name.into(),
            description: String::new(),
        }
    }
}

/// Unlock tier of a playbook ability, keyed by the number of A-grade stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityTier {
    /// Always available
    Foundation,
    Tier1,
    Tier2,
    Tier3,
    Tier4,
}

impl AbilityTier {
    pub const ALL: [AbilityTier; 5] = [
        AbilityTier::Foundation,
        AbilityTier::Tier1,
        AbilityTier::Tier2,
        AbilityTier::Tier3,
        AbilityTier::Tier4,
    ];

    /// A-grade stats needed before this tier opens.
    pub fn required_a_grades(&self) -> usize {
        match self {
            AbilityTier::Foundation => 0,
            AbilityTier::Tier1 => 1,
            AbilityTier::Tier2 => 2,
            AbilityTier::Tier3 => 3,
            AbilityTier::Tier4 => 4,
        }
    }

    pub fn is_unlocked(&self, a_grade_count: usize) -> bool {
        a_grade_count >= self.required_a_grades()
    }
}

/// Which playbook a technique belongs to, with its typed identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PlaybookAbilityRef {
    Hamon(HamonAbilityId),
    Spin(SpinAbilityId),
}

impl PlaybookAbilityRef {
    pub fn playbook(&self) -> Playbook {
        match self {
            PlaybookAbilityRef::Hamon(_) => Playbook::Hamon,
            PlaybookAbilityRef::Spin(_) => Playbook::Spin,
        }
    }
}

/// A Hamon or Spin technique from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookAbility {
    pub id: PlaybookAbilityRef,
    pub name: String,
    pub tier: AbilityTier,
    #[serde(default)]
    pub stress_cost: i32,
    #[serde(default)]
    pub description: String,
}

impl PlaybookAbility {
    pub fn hamon(name: impl Into<String>, tier: AbilityTier) -> Self {
        Self::new(PlaybookAbilityRef::Hamon(HamonAbilityId::new()), name, tier)
    }

    pub fn spin(name: impl Into<String>, tier: AbilityTier) -> Self {
        Self::new(PlaybookAbilityRef::Spin(SpinAbilityId::new()), name, tier)
    }

    fn new(id: PlaybookAbilityRef, name: impl Into<String>, tier: AbilityTier) -> Self {
        Self {
            id,
            name: name.into(),
            tier,
            stress_cost: 0,
            description: String::new(),
        }
    }

    pub fn playbook(&self) -> Playbook {
        self.id.playbook()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_unlock_cumulatively() {
        assert!(AbilityTier::Foundation.is_unlocked(0));
        assert!(!AbilityTier::Tier1.is_unlocked(0));
        assert!(AbilityTier::Tier1.is_unlocked(1));
        assert!(AbilityTier::Tier2.is_unlocked(3));
        assert!(!AbilityTier::Tier4.is_unlocked(3));
    }

    #[test]
    fn playbook_follows_reference_kind() {
        let zeppeli = PlaybookAbility::hamon("Zeppeli Style", AbilityTier::Tier1);
        let cavalier = PlaybookAbility::spin("Cavalier Spin", AbilityTier::Tier2);
        assert_eq!(zeppeli.playbook(), Playbook::Hamon);
        assert_eq!(cavalier.playbook(), Playbook::Spin);
    }

    #[test]
    fn reference_serializes_tagged() {
        let id = HamonAbilityId::new();
        let value = serde_json::to_value(PlaybookAbilityRef::Hamon(id)).unwrap();
        assert_eq!(value["kind"], "hamon");
        assert_eq!(value["id"], id.to_string());
    }
}
