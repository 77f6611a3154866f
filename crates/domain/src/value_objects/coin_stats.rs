//! Stand coin stats - six letter-graded Stand attributes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::grade::Grade;
use super::rule_tables::GradeTable;
use crate::error::{DomainError, ErrorKind, RuleViolation};

/// The six graded Stand stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinStat {
    Power,
    Speed,
    Range,
    Durability,
    Precision,
    Development,
}

impl CoinStat {
    pub const ALL: [CoinStat; 6] = [
        CoinStat::Power,
        CoinStat::Speed,
        CoinStat::Range,
        CoinStat::Durability,
        CoinStat::Precision,
        CoinStat::Development,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoinStat::Power => "power",
            CoinStat::Speed => "speed",
            CoinStat::Range => "range",
            CoinStat::Durability => "durability",
            CoinStat::Precision => "precision",
            CoinStat::Development => "development",
        }
    }

    /// Field path used in rule violations, e.g. `coin_stats.power`.
    pub fn field_path(&self) -> String {
        format!("coin_stats.{}", self.as_str())
    }
}

impl fmt::Display for CoinStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoinStat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        CoinStat::ALL
            .into_iter()
            .find(|stat| stat.as_str() == wanted)
            .ok_or_else(|| DomainError::parse(format!("Unknown Stand stat: {}", s)))
    }
}

/// A Stand's six grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinStats {
    pub power: Grade,
    pub speed: Grade,
    pub range: Grade,
    pub durability: Grade,
    pub precision: Grade,
    pub development: Grade,
}

impl CoinStats {
    pub fn new(
        power: Grade,
        speed: Grade,
        range: Grade,
        durability: Grade,
        precision: Grade,
        development: Grade,
    ) -> Self {
        Self {
            power,
            speed,
            range,
            durability,
            precision,
            development,
        }
    }

    /// Build coin stats from raw `stat -> letter` pairs as submitted by a client.
    ///
    /// # Errors
    ///
    /// - `InvalidGrade` for a letter outside S, A, B, C, D, F or an unknown stat name
    /// - `MissingRequiredChoice` when one of the six stats is absent
    pub fn from_letters(raw: &BTreeMap<String, String>) -> Result<Self, RuleViolation> {
        let mut grades: BTreeMap<CoinStat, Grade> = BTreeMap::new();
        for (name, letter) in raw {
            let stat: CoinStat = name.parse().map_err(|_| {
                RuleViolation::new(
                    "coin_stats",
                    ErrorKind::InvalidGrade,
                    format!("Unknown Stand stat \"{}\".", name),
                )
            })?;
            let grade: Grade = letter.parse().map_err(|_| {
                RuleViolation::new(
                    stat.field_path(),
                    ErrorKind::InvalidGrade,
                    format!(
                        "Invalid grade \"{}\" for stat \"{}\". Must be S, A, B, C, D, or F.",
                        letter, stat
                    ),
                )
            })?;
            grades.insert(stat, grade);
        }

        let mut take = |stat: CoinStat| {
            grades.remove(&stat).ok_or_else(|| {
                RuleViolation::new(
                    stat.field_path(),
                    ErrorKind::MissingRequiredChoice,
                    format!("Missing grade for Stand stat \"{}\".", stat),
                )
            })
        };
        Ok(Self {
            power: take(CoinStat::Power)?,
            speed: take(CoinStat::Speed)?,
            range: take(CoinStat::Range)?,
            durability: take(CoinStat::Durability)?,
            precision: take(CoinStat::Precision)?,
            development: take(CoinStat::Development)?,
        })
    }

    pub fn get(&self, stat: CoinStat) -> Grade {
        match stat {
            CoinStat::Power => self.power,
            CoinStat::Speed => self.speed,
            CoinStat::Range => self.range,
            CoinStat::Durability => self.durability,
            CoinStat::Precision => self.precision,
            CoinStat::Development => self.development,
        }
    }

    pub fn set(&mut self, stat: CoinStat, grade: Grade) {
        match stat {
            CoinStat::Power => self.power = grade,
            CoinStat::Speed => self.speed = grade,
            CoinStat::Range => self.range = grade,
            CoinStat::Durability => self.durability = grade,
            CoinStat::Precision => self.precision = grade,
            CoinStat::Development => self.development = grade,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (CoinStat, Grade)> + '_ {
        CoinStat::ALL.into_iter().map(move |stat| (stat, self.get(stat)))
    }

    /// Sum of coin points under the given cost table.
    pub fn total_points(&self, points: &GradeTable) -> i32 {
        self.iter().map(|(_, grade)| points.get(grade)).sum()
    }

    pub fn count_of(&self, grade: Grade) -> usize {
        self.iter().filter(|&(_, g)| g == grade).count()
    }

    /// Number of stats graded A. Each unlocks additional abilities.
    pub fn a_grade_count(&self) -> usize {
        self.count_of(Grade::A)
    }

    /// Stats graded S, in canonical order.
    pub fn s_rank_stats(&self) -> Vec<CoinStat> {
        self.iter()
            .filter(|&(_, grade)| grade == Grade::S)
            .map(|(stat, _)| stat)
            .collect()
    }
}
