//! In-memory adapters for the engine ports.
//!
//! Process-local and lock-sharded through `DashMap`; suitable for tests,
//! tools and single-node embeddings.

use bizarre_domain::{
    Character, CharacterId, Heritage, HeritageId, HistoryRecord, PlaybookAbility,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::infrastructure::ports::{CharacterRepo, HistorySink, ReferenceCatalog, RepoError};

// =============================================================================
// Characters
// =============================================================================

/// Character store with compare-and-swap on `version`.
#[derive(Default)]
pub struct InMemoryCharacterRepo {
    characters: DashMap<CharacterId, Character>,
}

impl InMemoryCharacterRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

impl CharacterRepo for InMemoryCharacterRepo {
    fn get(&self, id: CharacterId) -> Result<Option<Character>, RepoError> {
        Ok(self.characters.get(&id).map(|entry| entry.value().clone()))
    }

    fn save(&self, character: &Character) -> Result<u64, RepoError> {
        let expected = character.version();
        let next = expected + 1;

        // The entry guard holds the shard lock across compare and swap.
        match self.characters.entry(character.id()) {
            Entry::Occupied(mut slot) => {
                let found = slot.get().version();
                if found != expected {
                    return Err(RepoError::version_conflict(
                        "Character",
                        character.id(),
                        expected,
                        found,
                    ));
                }
                slot.insert(character.clone().with_version(next));
            }
            Entry::Vacant(slot) => {
                if expected != 0 {
                    return Err(RepoError::version_conflict(
                        "Character",
                        character.id(),
                        expected,
                        0,
                    ));
                }
                slot.insert(character.clone().with_version(next));
            }
        }
        Ok(next)
    }
}

// =============================================================================
// Reference Catalog
// =============================================================================

#[derive(Default)]
pub struct InMemoryCatalog {
    heritages: DashMap<HeritageId, Heritage>,
    playbook_abilities: Vec<PlaybookAbility>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heritage(self, heritage: Heritage) -> Self {
        self.heritages.insert(heritage.id, heritage);
        self
    }

    pub fn with_playbook_ability(mut self, ability: PlaybookAbility) -> Self {
        self.playbook_abilities.push(ability);
        self
    }
}

impl ReferenceCatalog for InMemoryCatalog {
    fn heritage(&self, id: HeritageId) -> Result<Option<Heritage>, RepoError> {
        Ok(self.heritages.get(&id).map(|entry| entry.value().clone()))
    }

    fn playbook_abilities(&self) -> Result<Vec<PlaybookAbility>, RepoError> {
        Ok(self.playbook_abilities.clone())
    }
}

// =============================================================================
// History
// =============================================================================

/// Append-only history, grouped per character in arrival order.
#[derive(Default)]
pub struct InMemoryHistory {
    records: DashMap<CharacterId, Vec<HistoryRecord>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records_for(&self, id: CharacterId) -> Vec<HistoryRecord> {
        self.records
            .get(&id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

impl HistorySink for InMemoryHistory {
    fn append(&self, record: HistoryRecord) -> Result<(), RepoError> {
        self.records
            .entry(record.character_id)
            .or_default()
            .push(record);
        Ok(())
    }
}
