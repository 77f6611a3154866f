//! Harm, trauma and healing state carried on a character sheet.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Default healing clock size.
pub const DEFAULT_HEALING_SEGMENTS: u8 = 4;

/// Trauma conditions a character can accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraumaCondition {
    Cold,
    Haunted,
    Obsessed,
    Paranoid,
    Reckless,
    Soft,
    Unstable,
    Vicious,
}

impl TraumaCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraumaCondition::Cold => "cold",
            TraumaCondition::Haunted => "haunted",
            TraumaCondition::Obsessed => "obsessed",
            TraumaCondition::Paranoid => "paranoid",
            TraumaCondition::Reckless => "reckless",
            TraumaCondition::Soft => "soft",
            TraumaCondition::Unstable => "unstable",
            TraumaCondition::Vicious => "vicious",
        }
    }
}

impl fmt::Display for TraumaCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraumaCondition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cold" => Ok(Self::Cold),
            "haunted" => Ok(Self::Haunted),
            "obsessed" => Ok(Self::Obsessed),
            "paranoid" => Ok(Self::Paranoid),
            "reckless" => Ok(Self::Reckless),
            "soft" => Ok(Self::Soft),
            "unstable" => Ok(Self::Unstable),
            "vicious" => Ok(Self::Vicious),
            _ => Err(DomainError::parse(format!("Unknown trauma condition: {}", s))),
        }
    }
}

/// Harm severity, one slot per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmLevel {
    /// Lesser harm
    Level1,
    /// Moderate harm
    Level2,
    /// Severe harm
    Level3,
    /// Fatal
    Level4,
}

impl HarmLevel {
    pub const ALL: [HarmLevel; 4] = [
        HarmLevel::Level1,
        HarmLevel::Level2,
        HarmLevel::Level3,
        HarmLevel::Level4,
    ];

    fn index(&self) -> usize {
        match self {
            HarmLevel::Level1 => 0,
            HarmLevel::Level2 => 1,
            HarmLevel::Level3 => 2,
            HarmLevel::Level4 => 3,
        }
    }
}

/// A single harm slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarmSlot {
    pub used: bool,
    pub name: Option<String>,
}

/// The four harm slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HarmTrack([HarmSlot; 4]);

impl HarmTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, level: HarmLevel) -> &HarmSlot {
        &self.0[level.index()]
    }

    /// Mark a slot as used with a description of the harm.
    pub fn mark(&mut self, level: HarmLevel, name: impl Into<String>) {
        self.0[level.index()] = HarmSlot {
            used: true,
            name: Some(name.into()),
        };
    }

    pub fn clear(&mut self, level: HarmLevel) {
        self.0[level.index()] = HarmSlot::default();
    }

    pub fn used_count(&self) -> usize {
        self.0.iter().filter(|slot| slot.used).count()
    }
}

/// Healing progress clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HealingClockData", into = "HealingClockData")]
pub struct HealingClock {
    segments: u8,
    filled: u8,
}

#[derive(Serialize, Deserialize)]
struct HealingClockData {
    segments: u8,
    filled: u8,
}

impl HealingClock {
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `segments` is zero or `filled`
    /// exceeds `segments`.
    pub fn new(segments: u8, filled: u8) -> Result<Self, DomainError> {
        if segments == 0 {
            return Err(DomainError::validation(
                "Healing clock needs at least one segment",
            ));
        }
        if filled > segments {
            return Err(DomainError::validation(format!(
                "Healing clock filled ({}) exceeds segments ({})",
                filled, segments
            )));
        }
        Ok(Self { segments, filled })
    }

    pub fn segments(&self) -> u8 {
        self.segments
    }

    pub fn filled(&self) -> u8 {
        self.filled
    }

    pub fn is_complete(&self) -> bool {
        self.filled == self.segments
    }

    /// Fill segments, saturating at the clock size.
    pub fn tick(&mut self, amount: u8) {
        self.filled = self.filled.saturating_add(amount).min(self.segments);
    }
}

impl Default for HealingClock {
    fn default() -> Self {
        Self {
            segments: DEFAULT_HEALING_SEGMENTS,
            filled: 0,
        }
    }
}

impl TryFrom<HealingClockData> for HealingClock {
    type Error = DomainError;

    fn try_from(data: HealingClockData) -> Result<Self, Self::Error> {
        Self::new(data.segments, data.filled)
    }
}

impl From<HealingClock> for HealingClockData {
    fn from(clock: HealingClock) -> Self {
        Self {
            segments: clock.segments,
            filled: clock.filled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harm_slots_mark_and_clear() {
        let mut harm = HarmTrack::new();
        harm.mark(HarmLevel::Level2, "Broken arm");
        assert!(harm.slot(HarmLevel::Level2).used);
        assert_eq!(harm.slot(HarmLevel::Level2).name.as_deref(), Some("Broken arm"));
        assert_eq!(harm.used_count(), 1);

        harm.clear(HarmLevel::Level2);
        assert_eq!(harm.used_count(), 0);
    }

    #[test]
    fn healing_clock_rejects_overfill() {
        assert!(HealingClock::new(4, 5).is_err());
        assert!(HealingClock::new(0, 0).is_err());
        assert!(HealingClock::new(6, 6).unwrap().is_complete());
    }

    #[test]
    fn healing_clock_tick_saturates() {
        let mut clock = HealingClock::default();
        clock.tick(3);
        assert_eq!(clock.filled(), 3);
        clock.tick(3);
        assert_eq!(clock.filled(), 4);
        assert!(clock.is_complete());
    }

    #[test]
    fn healing_clock_deserialize_validates() {
        let ok: HealingClock = serde_json::from_str(r#"{"segments":4,"filled":2}"#).unwrap();
        assert_eq!(ok.filled(), 2);
        assert!(serde_json::from_str::<HealingClock>(r#"{"segments":4,"filled":9}"#).is_err());
    }

    #[test]
    fn trauma_parses() {
        assert_eq!("Haunted".parse::<TraumaCondition>().unwrap(), TraumaCondition::Haunted);
        assert!("grumpy".parse::<TraumaCondition>().is_err());
    }
}
