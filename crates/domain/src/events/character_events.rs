//! Character-related domain events
//!
//! These types communicate what happened when character state was modified,
//! allowing callers to react appropriately.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::CharacterId;
use crate::value_objects::{CharacterField, Purchase, XpTrack};

/// XP credited to a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpGained {
    pub track: XpTrack,
    pub amount: i32,
    /// Track balance after the credit
    pub banked: i32,
}

/// XP converted into advancements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpSpent {
    pub track: XpTrack,
    pub cost: i32,
    pub remaining: i32,
    pub purchases: Vec<Purchase>,
    pub level_before: i32,
    pub level_after: i32,
}

impl XpSpent {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Outcome of locking a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLockOutcome {
    Locked(CharacterField),
    AlreadyLocked(CharacterField),
}

/// Outcome of unlocking a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUnlockOutcome {
    Unlocked(CharacterField),
    NotLocked(CharacterField),
}

/// Outcome of toggling a boolean GM control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GmToggleOutcome {
    Changed { from: bool, to: bool },
    Unchanged { value: bool },
}

impl GmToggleOutcome {
    pub fn between(from: bool, to: bool) -> Self {
        if from == to {
            GmToggleOutcome::Unchanged { value: to }
        } else {
            GmToggleOutcome::Changed { from, to }
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, GmToggleOutcome::Changed { .. })
    }
}

/// Old and new JSON snapshots of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: serde_json::Value,
    pub new: serde_json::Value,
}

/// Per-field changes between two character snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterDiff(BTreeMap<CharacterField, FieldChange>);

impl CharacterDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, field: CharacterField, old: serde_json::Value, new: serde_json::Value) {
        self.0.insert(field, FieldChange { old, new });
    }

    pub fn get(&self, field: CharacterField) -> Option<&FieldChange> {
        self.0.get(&field)
    }

    pub fn contains(&self, field: CharacterField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = CharacterField> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CharacterField, &FieldChange)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One audit entry: which fields changed on which character, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub character_id: CharacterId,
    pub timestamp: DateTime<Utc>,
    pub changed_fields: CharacterDiff,
}

impl HistoryRecord {
    pub fn new(character_id: CharacterId, timestamp: DateTime<Utc>, changed_fields: CharacterDiff) -> Self {
        Self {
            character_id,
            timestamp,
            changed_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diff_serializes_as_field_map() {
        let mut diff = CharacterDiff::new();
        diff.record(CharacterField::Stress, json!(2), json!(5));
        let value = serde_json::to_value(&diff).unwrap();
        assert_eq!(value, json!({ "stress": { "old": 2, "new": 5 } }));
    }

    #[test]
    fn toggle_outcome_detects_no_op() {
        assert_eq!(GmToggleOutcome::between(true, true), GmToggleOutcome::Unchanged { value: true });
        assert!(GmToggleOutcome::between(false, true).is_changed());
    }
}
