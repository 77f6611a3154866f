//! Playbook choice and custom ability selections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// The power source a character is built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Playbook {
    #[default]
    Stand,
    Hamon,
    Spin,
}

impl Playbook {
    pub fn as_str(&self) -> &'static str {
        match self {
            Playbook::Stand => "STAND",
            Playbook::Hamon => "HAMON",
            Playbook::Spin => "SPIN",
        }
    }
}

impl fmt::Display for Playbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Playbook {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STAND" => Ok(Playbook::Stand),
            "HAMON" => Ok(Playbook::Hamon),
            "SPIN" => Ok(Playbook::Spin),
            _ => Err(DomainError::parse(format!("Unknown playbook: {}", s))),
        }
    }
}

/// How a custom ability's uses are structured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomAbilityMode {
    /// One ability usable three times
    #[default]
    #[serde(rename = "single_with_3_uses")]
    SingleWith3Uses,
    /// Three distinct single-use abilities
    ThreeSeparateUses,
}

/// A player-authored ability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomAbility {
    pub description: String,
    #[serde(default)]
    pub mode: CustomAbilityMode,
}

impl CustomAbility {
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the description is blank.
    pub fn new(description: impl Into<String>, mode: CustomAbilityMode) -> Result<Self, DomainError> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(DomainError::validation(
                "Custom ability description cannot be empty",
            ));
        }
        Ok(Self { description, mode })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playbook_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Playbook::Hamon).unwrap(), "\"HAMON\"");
        assert_eq!("spin".parse::<Playbook>().unwrap(), Playbook::Spin);
        assert!("ripple".parse::<Playbook>().is_err());
    }

    #[test]
    fn custom_ability_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&CustomAbilityMode::SingleWith3Uses).unwrap(),
            "\"single_with_3_uses\""
        );
        assert_eq!(
            serde_json::to_string(&CustomAbilityMode::ThreeSeparateUses).unwrap(),
            "\"three_separate_uses\""
        );
    }

    #[test]
    fn custom_ability_requires_description() {
        assert!(CustomAbility::new("   ", CustomAbilityMode::default()).is_err());
        let ability = CustomAbility::new(" Echo bomb ", CustomAbilityMode::ThreeSeparateUses).unwrap();
        assert_eq!(ability.description, "Echo bomb");
    }
}
