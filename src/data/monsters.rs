use bracket_terminal::prelude::RGB;

use crate::{ai::Behavior, data::items::ItemKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Species {
    Sentry,
    Golem,
    Knight,
    Chronotherium,
}

/// What an enemy leaves behind.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DeathRite {
    Drop { item: ItemKind, chance: f32 },
}

#[derive(Clone, Debug)]
pub struct MonsterTemplate {
    pub species: Species,
    pub name: &'static str,
    pub glyph: char,
    pub color: RGB,
    pub hp: i32,
    pub tp: i32,
    pub bump_damage: i32,
    pub sight: i32,
    pub reach: i32,
    pub xp: i32,
    pub behavior: Behavior,
    pub rite: DeathRite,
    /// Relative spawn weight on ordinary floors.
    pub density: u32,
}

impl MonsterTemplate {
    pub fn for_species(species: Species) -> Self {
        match species {
            Species::Sentry => Self {
                species,
                name: "Eternal Sentry",
                glyph: 's',
                color: RGB::from_u8(238, 232, 213),
                hp: 2,
                tp: 0,
                bump_damage: 1,
                sight: 6,
                reach: 3,
                xp: 2,
                behavior: Behavior::Hunter,
                rite: DeathRite::Drop {
                    item: ItemKind::HealthPotion,
                    chance: 0.5,
                },
                density: 5,
            },
            Species::Golem => Self {
                species,
                name: "Hourglass Golem",
                glyph: 'G',
                color: RGB::from_u8(108, 113, 196),
                hp: 5,
                tp: 2,
                bump_damage: 1,
                sight: 6,
                reach: 5,
                xp: 6,
                behavior: Behavior::Drainer { rate: 4, cost: 1 },
                rite: DeathRite::Drop {
                    item: ItemKind::TimePotion,
                    chance: 1.0,
                },
                density: 2,
            },
            Species::Knight => Self {
                species,
                name: "Clockwork Knight",
                glyph: 'k',
                color: RGB::from_u8(7, 54, 66),
                hp: 2,
                tp: 0,
                bump_damage: 1,
                sight: 5,
                reach: 2,
                xp: 3,
                behavior: Behavior::Sentinel,
                rite: DeathRite::Drop {
                    item: ItemKind::HealthPotion,
                    chance: 0.5,
                },
                density: 3,
            },
            Species::Chronotherium => Self {
                species,
                name: "Chronotherium",
                glyph: 'C',
                color: RGB::from_u8(211, 54, 130),
                hp: 25,
                tp: 10,
                bump_damage: 2,
                sight: 8,
                reach: 6,
                xp: 25,
                behavior: Behavior::Hunter,
                rite: DeathRite::Drop {
                    item: ItemKind::Hourglass,
                    chance: 1.0,
                },
                density: 0,
            },
        }
    }

    /// Species that roam ordinary floors.
    pub fn roster() -> Vec<Self> {
        [Species::Sentry, Species::Golem, Species::Knight]
            .into_iter()
            .map(Self::for_species)
            .collect()
    }
}
