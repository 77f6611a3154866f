//! Action ratings - dots per action, grouped into three attributes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// The three attribute categories actions are grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    Insight,
    Prowess,
    Resolve,
}

impl ActionCategory {
    pub const ALL: [ActionCategory; 3] = [
        ActionCategory::Insight,
        ActionCategory::Prowess,
        ActionCategory::Resolve,
    ];

    /// The four actions rated under this attribute.
    pub fn actions(&self) -> [Action; 4] {
        match self {
            ActionCategory::Insight => [Action::Hunt, Action::Study, Action::Survey, Action::Tinker],
            ActionCategory::Prowess => [
                Action::Finesse,
                Action::Prowl,
                Action::Skirmish,
                Action::Wreck,
            ],
            ActionCategory::Resolve => [
                Action::Attune,
                Action::Command,
                Action::Consort,
                Action::Sway,
            ],
        }
    }
}

/// A single rated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Hunt,
    Study,
    Survey,
    Tinker,
    Finesse,
    Prowl,
    Skirmish,
    Wreck,
    Attune,
    Command,
    Consort,
    Sway,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::Hunt,
        Action::Study,
        Action::Survey,
        Action::Tinker,
        Action::Finesse,
        Action::Prowl,
        Action::Skirmish,
        Action::Wreck,
        Action::Attune,
        Action::Command,
        Action::Consort,
        Action::Sway,
    ];

    pub fn category(&self) -> ActionCategory {
        match self {
            Action::Hunt | Action::Study | Action::Survey | Action::Tinker => {
                ActionCategory::Insight
            }
            Action::Finesse | Action::Prowl | Action::Skirmish | Action::Wreck => {
                ActionCategory::Prowess
            }
            Action::Attune | Action::Command | Action::Consort | Action::Sway => {
                ActionCategory::Resolve
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Hunt => "hunt",
            Action::Study => "study",
            Action::Survey => "survey",
            Action::Tinker => "tinker",
            Action::Finesse => "finesse",
            Action::Prowl => "prowl",
            Action::Skirmish => "skirmish",
            Action::Wreck => "wreck",
            Action::Attune => "attune",
            Action::Command => "command",
            Action::Consort => "consort",
            Action::Sway => "sway",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == wanted)
            .ok_or_else(|| DomainError::parse(format!("Unknown action: {}", s)))
    }
}

/// Dots held in each action. Actions never rated read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Action, u8>", into = "BTreeMap<Action, u8>")]
pub struct ActionRatings(BTreeMap<Action, u8>);

// Zero entries are dropped so equal ratings compare equal however they arrived.
impl From<BTreeMap<Action, u8>> for ActionRatings {
    fn from(map: BTreeMap<Action, u8>) -> Self {
        Self(map.into_iter().filter(|&(_, dots)| dots > 0).collect())
    }
}

impl From<ActionRatings> for BTreeMap<Action, u8> {
    fn from(ratings: ActionRatings) -> Self {
        ratings.0
    }
}

impl ActionRatings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, action: Action, dots: u8) -> Self {
        self.set(action, dots);
        self
    }

    pub fn get(&self, action: Action) -> u8 {
        self.0.get(&action).copied().unwrap_or(0)
    }

    pub fn set(&mut self, action: Action, dots: u8) {
        if dots == 0 {
            self.0.remove(&action);
        } else {
            self.0.insert(action, dots);
        }
    }

    /// Add one dot to an action, returning the new rating.
    pub fn add_dot(&mut self, action: Action) -> u8 {
        let dots = self.get(action).saturating_add(1);
        self.set(action, dots);
        dots
    }

    /// Sum of dots across all twelve actions.
    pub fn total(&self) -> u32 {
        self.0.values().map(|&dots| u32::from(dots)).sum()
    }

    /// Every action with its rating, zeros included, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Action, u8)> + '_ {
        Action::ALL.into_iter().map(move |action| (action, self.get(action)))
    }

    /// Attribute rating: the number of actions in the category with at least one dot.
    pub fn attribute_rating(&self, category: ActionCategory) -> u8 {
        category
            .actions()
            .iter()
            .filter(|&&action| self.get(action) > 0)
            .count() as u8
    }

    /// Ratings grouped as attribute -> action -> dots.
    pub fn by_category(&self) -> BTreeMap<ActionCategory, BTreeMap<Action, u8>> {
        ActionCategory::ALL
            .into_iter()
            .map(|category| {
                let actions = category
                    .actions()
                    .into_iter()
                    .map(|action| (action, self.get(action)))
                    .collect();
                (category, actions)
            })
            .collect()
    }
}
