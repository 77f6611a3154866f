//! Persistence and reference-data ports.
//!
//! All ports are synchronous; an embedding service decides where blocking
//! work runs.

use bizarre_domain::{Character, CharacterId, Heritage, HeritageId, HistoryRecord, PlaybookAbility};

use super::error::RepoError;

// =============================================================================
// Character Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait CharacterRepo: Send + Sync {
    fn get(&self, id: CharacterId) -> Result<Option<Character>, RepoError>;

    /// Compare-and-swap save.
    ///
    /// `character.version()` is the version the caller last read; 0 means
    /// "not stored yet". On success the stored version is one higher and is
    /// returned. If the stored version differs, nothing is written and
    /// `RepoError::VersionConflict` is returned.
    fn save(&self, character: &Character) -> Result<u64, RepoError>;
}

// =============================================================================
// Reference Data
// =============================================================================

/// Read-only heritage and ability catalog.
#[cfg_attr(test, mockall::automock)]
pub trait ReferenceCatalog: Send + Sync {
    fn heritage(&self, id: HeritageId) -> Result<Option<Heritage>, RepoError>;

    /// Every Hamon and Spin ability, across all tiers.
    fn playbook_abilities(&self) -> Result<Vec<PlaybookAbility>, RepoError>;
}

// =============================================================================
// Audit Trail
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait HistorySink: Send + Sync {
    fn append(&self, record: HistoryRecord) -> Result<(), RepoError>;
}
