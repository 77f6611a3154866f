//! Derived stats - grade-driven step functions and the read-only stats view.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregates::Character;
use crate::value_objects::{ActionCategory, CoinStats, Grade, RuleTables};

/// Stand-derived numbers. Present only when the character has coin stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StandDerived {
    pub stress_capacity: i32,
    pub harm_clock_max: i32,
    pub vulnerability_clock_max: i32,
    pub armor_charges: i32,
    pub movement_speed: i32,
}

/// Everything a consumer may read but never write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedStats {
    pub level: i32,
    pub bonus_hp_from_xp: i32,
    pub attribute_ratings: BTreeMap<ActionCategory, u8>,
    pub stand: Option<StandDerived>,
}

/// Pure lookups over an injected [`RuleTables`].
#[derive(Debug, Clone, Copy)]
pub struct DerivedStatsCalculator<'a> {
    tables: &'a RuleTables,
}

impl<'a> DerivedStatsCalculator<'a> {
    pub fn new(tables: &'a RuleTables) -> Self {
        Self { tables }
    }

    pub fn stress_capacity(&self, durability: Grade) -> i32 {
        self.tables.stress_by_durability.get(durability)
    }

    pub fn harm_clock_max(&self, durability: Grade) -> i32 {
        self.tables.harm_clock_by_durability.get(durability)
    }

    pub fn vulnerability_clock_max(&self, durability: Grade) -> i32 {
        self.tables.vulnerability_clock_by_durability.get(durability)
    }

    pub fn armor_charges(&self, durability: Grade) -> i32 {
        self.tables.armor_charges_by_durability.get(durability)
    }

    pub fn movement_speed(&self, speed: Grade) -> i32 {
        self.tables.movement_by_speed.get(speed)
    }

    pub fn stand(&self, stats: &CoinStats) -> StandDerived {
        StandDerived {
            stress_capacity: self.stress_capacity(stats.durability),
            harm_clock_max: self.harm_clock_max(stats.durability),
            vulnerability_clock_max: self.vulnerability_clock_max(stats.durability),
            armor_charges: self.armor_charges(stats.durability),
            movement_speed: self.movement_speed(stats.speed),
        }
    }

    pub fn for_character(&self, character: &Character) -> DerivedStats {
        let attribute_ratings = ActionCategory::ALL
            .into_iter()
            .map(|category| (category, character.action_dots().attribute_rating(category)))
            .collect();
        DerivedStats {
            level: character.level(&self.tables.advancement),
            bonus_hp_from_xp: character.bonus_hp_from_xp(),
            attribute_ratings,
            stand: character.coin_stats().map(|stats| self.stand(stats)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{Action, ActionRatings, CharacterName};
    use crate::UserId;

    #[test]
    fn bands_follow_canonical_tables() {
        let tables = RuleTables::default();
        let calc = DerivedStatsCalculator::new(&tables);

        assert_eq!(calc.harm_clock_max(Grade::S), 6);
        assert_eq!(calc.harm_clock_max(Grade::F), 2);
        assert_eq!(calc.vulnerability_clock_max(Grade::B), 5);
        assert_eq!(calc.armor_charges(Grade::D), 1);
        assert_eq!(calc.armor_charges(Grade::F), 0);
        assert_eq!(calc.movement_speed(Grade::A), 40);
        assert_eq!(calc.movement_speed(Grade::C), 30);
    }

    #[test]
    fn step_functions_are_monotonic() {
        let tables = RuleTables::default();
        let calc = DerivedStatsCalculator::new(&tables);
        // Grade::ALL runs S..F, so values must never increase along it.
        for pair in Grade::ALL.windows(2) {
            let (higher, lower) = (pair[0], pair[1]);
            assert!(calc.harm_clock_max(higher) >= calc.harm_clock_max(lower));
            assert!(calc.vulnerability_clock_max(higher) >= calc.vulnerability_clock_max(lower));
            assert!(calc.armor_charges(higher) >= calc.armor_charges(lower));
            assert!(calc.movement_speed(higher) >= calc.movement_speed(lower));
        }
    }

    #[test]
    fn character_view() {
        let tables = RuleTables::default();
        let stats = CoinStats::new(Grade::A, Grade::B, Grade::C, Grade::C, Grade::F, Grade::F);
        let dots = ActionRatings::new()
            .with(Action::Hunt, 2)
            .with(Action::Study, 1)
            .with(Action::Wreck, 1);
        let character = Character::new(UserId::new(), CharacterName::new("Joseph").unwrap())
            .with_coin_stats(stats)
            .with_action_dots(dots);

        let view = DerivedStatsCalculator::new(&tables).for_character(&character);
        assert_eq!(view.level, 1);
        assert_eq!(view.attribute_ratings[&ActionCategory::Insight], 2);
        assert_eq!(view.attribute_ratings[&ActionCategory::Prowess], 1);
        assert_eq!(view.attribute_ratings[&ActionCategory::Resolve], 0);

        let stand = view.stand.unwrap();
        assert_eq!(stand.stress_capacity, 10);
        assert_eq!(stand.harm_clock_max, 4);
        assert_eq!(stand.movement_speed, 35);
    }

    #[test]
    fn no_stand_means_no_stand_view() {
        let tables = RuleTables::default();
        let character = Character::new(UserId::new(), CharacterName::new("Caesar").unwrap());
        assert!(DerivedStatsCalculator::new(&tables)
            .for_character(&character)
            .stand
            .is_none());
    }
}
