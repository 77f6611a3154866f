//! Character progression error types.

use bizarre_domain::{CharacterId, DomainError, RuleViolation, RuleViolations};

use crate::infrastructure::ports::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum CharacterProgressionError {
    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),

    #[error("Only the game master may {action}")]
    NotGameMaster { action: &'static str },

    #[error("Playbook XP track is full: {current} banked, {requested} more would exceed the cap of {cap}")]
    PlaybookTrackFull {
        cap: i32,
        current: i32,
        requested: i32,
    },

    #[error("Rule violation: {0}")]
    Rejected(#[from] RuleViolations),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl From<RuleViolation> for CharacterProgressionError {
    fn from(violation: RuleViolation) -> Self {
        Self::Rejected(violation.into())
    }
}

impl CharacterProgressionError {
    /// The rule violations, when the rules engine rejected the change.
    pub fn violations(&self) -> Option<&RuleViolations> {
        match self {
            Self::Rejected(violations) => Some(violations),
            _ => None,
        }
    }

    /// True when the caller can fix the request and retry: insufficient XP,
    /// a locked field, or a lost version race.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Rejected(violations) => violations.is_recoverable(),
            Self::Repo(err) => err.is_version_conflict(),
            _ => false,
        }
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_version_conflict())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizarre_domain::ErrorKind;

    #[test]
    fn single_violation_converts() {
        let err: CharacterProgressionError = RuleViolation::field_locked("level").into();
        let violations = err.violations().unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.first().kind, ErrorKind::FieldLocked);
        assert!(err.is_recoverable());
    }

    #[test]
    fn recoverability() {
        let conflict: CharacterProgressionError =
            RepoError::version_conflict("Character", "x", 1, 2).into();
        assert!(conflict.is_recoverable());
        assert!(conflict.is_version_conflict());

        let storage: CharacterProgressionError = RepoError::storage("save", "disk full").into();
        assert!(!storage.is_recoverable());

        let not_gm = CharacterProgressionError::NotGameMaster { action: "lock fields" };
        assert!(!not_gm.is_recoverable());
        assert_eq!(not_gm.to_string(), "Only the game master may lock fields");
    }
}
