//! Engine settings loaded from the environment.
//!
//! | Variable                  | Default     |
//! |---------------------------|-------------|
//! | `BIZARRE_RULES_PATH`      | (built-in)  |
//! | `BIZARRE_PLAYBOOK_XP_CAP` | `10`        |
//! | `BIZARRE_VALIDATION_MODE` | `fail_fast` |

use std::path::{Path, PathBuf};

use bizarre_domain::{CharacterValidator, DomainError, RuleTables, ValidationStrategy};

pub const RULES_PATH_VAR: &str = "BIZARRE_RULES_PATH";
pub const PLAYBOOK_XP_CAP_VAR: &str = "BIZARRE_PLAYBOOK_XP_CAP";
pub const VALIDATION_MODE_VAR: &str = "BIZARRE_VALIDATION_MODE";

pub const DEFAULT_PLAYBOOK_XP_CAP: i32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rules file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid rule tables: {0}")]
    InvalidRules(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub rules: RuleTables,
    pub playbook_xp_cap: i32,
    pub validation_strategy: ValidationStrategy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            rules: RuleTables::default(),
            playbook_xp_cap: DEFAULT_PLAYBOOK_XP_CAP,
            validation_strategy: ValidationStrategy::default(),
        }
    }
}

impl EngineSettings {
    /// Load `.env.local` / `.env` from the working directory, then read the
    /// process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let rules = match read(RULES_PATH_VAR) {
            Some(path) => load_rules(Path::new(&path))?,
            None => RuleTables::default(),
        };

        let playbook_xp_cap = match read(PLAYBOOK_XP_CAP_VAR) {
            Some(raw) => match raw.parse::<i32>() {
                Ok(cap) if cap > 0 => cap,
                _ => {
                    return Err(SettingsError::InvalidValue {
                        key: PLAYBOOK_XP_CAP_VAR,
                        value: raw,
                    })
                }
            },
            None => DEFAULT_PLAYBOOK_XP_CAP,
        };

        let validation_strategy = match read(VALIDATION_MODE_VAR) {
            Some(raw) => raw
                .parse::<ValidationStrategy>()
                .map_err(|_| SettingsError::InvalidValue {
                    key: VALIDATION_MODE_VAR,
                    value: raw,
                })?,
            None => ValidationStrategy::default(),
        };

        Ok(Self {
            rules,
            playbook_xp_cap,
            validation_strategy,
        })
    }

    pub fn validator(&self) -> CharacterValidator {
        CharacterValidator::new(self.rules.clone()).with_strategy(self.validation_strategy)
    }
}

/// Read a JSON rules file. Missing keys keep their canonical values.
pub fn load_rules(path: &Path) -> Result<RuleTables, SettingsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rules: RuleTables = serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    rules.validate()?;
    Ok(rules)
}

fn load_dotenv() {
    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = Path::new(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn rules_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_when_unset() {
        let settings = EngineSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.playbook_xp_cap, 10);
        assert_eq!(settings.validation_strategy, ValidationStrategy::FailFast);
    }

    #[test]
    fn reads_cap_and_strategy() {
        let settings = EngineSettings::from_lookup(lookup(&[
            (PLAYBOOK_XP_CAP_VAR, " 12 "),
            (VALIDATION_MODE_VAR, "COLLECT_ALL"),
        ]))
        .unwrap();
        assert_eq!(settings.playbook_xp_cap, 12);
        assert_eq!(settings.validation_strategy, ValidationStrategy::CollectAll);
        assert_eq!(settings.validator().strategy(), ValidationStrategy::CollectAll);
    }

    #[test]
    fn rejects_bad_values() {
        let err = EngineSettings::from_lookup(lookup(&[(PLAYBOOK_XP_CAP_VAR, "0")])).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidValue { key: PLAYBOOK_XP_CAP_VAR, .. }
        ));

        let err =
            EngineSettings::from_lookup(lookup(&[(VALIDATION_MODE_VAR, "lenient")])).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidValue { key: VALIDATION_MODE_VAR, .. }
        ));
    }

    #[test]
    fn partial_rules_file_keeps_other_defaults() {
        let file = rules_file(r#"{ "advancement": { "xp_per_level": 20 } }"#);
        let path = file.path().to_string_lossy().to_string();

        let settings = EngineSettings::from_lookup(lookup(&[(RULES_PATH_VAR, path.as_str())])).unwrap();
        assert_eq!(settings.rules.advancement.xp_per_level, 20);
        assert_eq!(settings.rules.advancement.action_die, 5);
        assert_eq!(settings.rules.creation, RuleTables::default().creation);
    }

    #[test]
    fn rules_file_errors() {
        let err = load_rules(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));

        let file = rules_file("{ not json");
        let err = load_rules(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));

        let file = rules_file(r#"{ "advancement": { "xp_per_level": 0 } }"#);
        let err = load_rules(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidRules(_)));
    }
}
