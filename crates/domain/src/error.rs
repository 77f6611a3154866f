//! Unified error types for the domain layer
//!
//! Two families live here:
//! - [`DomainError`] for value-object construction and parsing failures
//!   (empty names, unknown grade letters, malformed clocks).
//! - [`RuleViolation`] for the character rules engine: every rejected
//!   creation, update, or advancement names the offending field, an
//!   [`ErrorKind`] and a human-readable message.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for value-object constraints.
    ///
    /// # Example
    /// ```ignore
    /// if name.is_empty() {
    ///     return Err(DomainError::validation("Character name cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    ///
    /// Use this in `FromStr` implementations when the input string
    /// doesn't match any known variant or format.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// Classification of a rules-engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingHeritage,
    BudgetExceeded,
    MissingRequiredChoice,
    /// A selected benefit or detriment is not offered by the chosen heritage.
    UnknownSelection,
    DotCountInvalid,
    InvalidGrade,
    /// S grade without the GM allowance.
    GradeNotPermitted,
    StressMismatch,
    AbilityCountMismatch,
    /// Playbook ability not unlocked yet, or belongs to another playbook.
    AbilityNotEligible,
    InsufficientXp,
    XpArithmeticMismatch,
    NegativeCounter,
    /// Non-positive XP amount or advancement count.
    InvalidAmount,
    FieldLocked,
}

impl ErrorKind {
    /// Expected outcomes the caller should report rather than treat as a
    /// malformed request.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientXp | Self::FieldLocked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingHeritage => "missing_heritage",
            Self::BudgetExceeded => "budget_exceeded",
            Self::MissingRequiredChoice => "missing_required_choice",
            Self::UnknownSelection => "unknown_selection",
            Self::DotCountInvalid => "dot_count_invalid",
            Self::InvalidGrade => "invalid_grade",
            Self::GradeNotPermitted => "grade_not_permitted",
            Self::StressMismatch => "stress_mismatch",
            Self::AbilityCountMismatch => "ability_count_mismatch",
            Self::AbilityNotEligible => "ability_not_eligible",
            Self::InsufficientXp => "insufficient_xp",
            Self::XpArithmeticMismatch => "xp_arithmetic_mismatch",
            Self::NegativeCounter => "negative_counter",
            Self::InvalidAmount => "invalid_amount",
            Self::FieldLocked => "field_locked",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rejected rule: which field, what kind of failure, and why.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{field}: {message}")]
pub struct RuleViolation {
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl RuleViolation {
    pub fn new(field: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }

    /// Create a field-locked violation for the given field name.
    pub fn field_locked(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("Field '{}' is locked by the GM and cannot be changed.", field);
        Self::new(field, ErrorKind::FieldLocked, message)
    }

    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}

/// One or more rule failures from a single validation pass.
///
/// Fail-fast validation always carries exactly one entry.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
#[error("{}", join_messages(.0))]
pub struct RuleViolations(Vec<RuleViolation>);

fn join_messages(violations: &[RuleViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl RuleViolations {
    /// `None` when there is nothing to report.
    pub fn from_vec(violations: Vec<RuleViolation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self(violations))
        }
    }

    pub fn first(&self) -> &RuleViolation {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleViolation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|v| v.kind == kind)
    }

    /// Recoverable only if every entry is.
    pub fn is_recoverable(&self) -> bool {
        self.0.iter().all(RuleViolation::is_recoverable)
    }

    pub fn into_vec(self) -> Vec<RuleViolation> {
        self.0
    }
}

impl From<RuleViolation> for RuleViolations {
    fn from(violation: RuleViolation) -> Self {
        Self(vec![violation])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("name cannot be empty");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: name cannot be empty");
    }

    #[test]
    fn test_parse_error() {
        let err = DomainError::parse("Unknown grade: Z");
        assert_eq!(err.to_string(), "Parse error: Unknown grade: Z");
    }

    #[test]
    fn test_field_locked_message() {
        let err = RuleViolation::field_locked("level");
        assert_eq!(err.kind, ErrorKind::FieldLocked);
        assert_eq!(err.field, "level");
        assert_eq!(
            err.to_string(),
            "level: Field 'level' is locked by the GM and cannot be changed."
        );
    }

    #[test]
    fn test_violations_join_messages() {
        let violations = RuleViolations::from_vec(vec![
            RuleViolation::new("stress", ErrorKind::StressMismatch, "Stress must be 10"),
            RuleViolation::field_locked("alias"),
        ])
        .unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations.first().kind, ErrorKind::StressMismatch);
        assert!(violations.has_kind(ErrorKind::FieldLocked));
        assert!(!violations.is_recoverable());
        assert!(violations.to_string().starts_with("stress: Stress must be 10; alias:"));
        assert!(RuleViolations::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(ErrorKind::InsufficientXp.is_recoverable());
        assert!(ErrorKind::FieldLocked.is_recoverable());
        assert!(!ErrorKind::StressMismatch.is_recoverable());
        assert!(!ErrorKind::XpArithmeticMismatch.is_recoverable());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InsufficientXp).unwrap();
        assert_eq!(json, "\"insufficient_xp\"");
        let json = serde_json::to_string(&ErrorKind::GradeNotPermitted).unwrap();
        assert_eq!(json, "\"grade_not_permitted\"");
    }
}
