//! Heritage reference records - origin, base HP, and the benefit/detriment menu.

use serde::{Deserialize, Serialize};

use crate::ids::{BenefitId, DetrimentId, HeritageId};

/// An optional perk bought with heritage HP.
///
/// Simple reference data with public fields; the catalog owns these and the
/// rules engine only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benefit {
    pub id: BenefitId,
    pub name: String,
    pub hp_cost: i32,
    /// Every character of this heritage must take it
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl Benefit {
    pub fn new(name: impl Into<String>, hp_cost: i32) -> Self {
        Self {
            id: BenefitId::new(),
            name: name.into(),
            hp_cost,
            required: false,
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A drawback that refunds heritage HP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detriment {
    pub id: DetrimentId,
    pub name: String,
    pub hp_value: i32,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl Detriment {
    pub fn new(name: impl Into<String>, hp_value: i32) -> Self {
        Self {
            id: DetrimentId::new(),
            name: name.into(),
            hp_value,
            required: false,
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A character origin with its benefit and detriment menus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heritage {
    pub id: HeritageId,
    pub name: String,
    pub base_hp: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub benefits: Vec<Benefit>,
    #[serde(default)]
    pub detriments: Vec<Detriment>,
}

impl Heritage {
    pub fn new(name: impl Into<String>, base_hp: i32) -> Self {
        Self {
            id: HeritageId::new(),
            name: name.into(),
            base_hp,
            description: String::new(),
            benefits: Vec::new(),
            detriments: Vec::new(),
        }
    }

    pub fn with_benefit(mut self, benefit: Benefit) -> Self {
        self.benefits.push(benefit);
        self
    }

    pub fn with_detriment(mut self, detriment: Detriment) -> Self {
        self.detriments.push(detriment);
        self
    }

    pub fn benefit(&self, id: BenefitId) -> Option<&Benefit> {
        self.benefits.iter().find(|b| b.id == id)
    }

    pub fn detriment(&self, id: DetrimentId) -> Option<&Detriment> {
        self.detriments.iter().find(|d| d.id == id)
    }

    pub fn required_benefits(&self) -> impl Iterator<Item = &Benefit> {
        self.benefits.iter().filter(|b| b.required)
    }

    pub fn required_detriments(&self) -> impl Iterator<Item = &Detriment> {
        self.detriments.iter().filter(|d| d.required)
    }
}
