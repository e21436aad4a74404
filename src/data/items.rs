use bracket_terminal::prelude::RGB;

/// Things that lie on the floor until the player picks them up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemKind {
    HealthPotion,
    TimePotion,
    Hourglass,
}

#[derive(Clone, Debug)]
pub struct ItemTemplate {
    pub name: &'static str,
    pub glyph: char,
    pub color: RGB,
    pub effect: ItemEffect,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemEffect {
    Heal { amount: i32 },
    Restore { amount: i32 },
    Victory,
}

impl ItemKind {
    pub fn template(self) -> ItemTemplate {
        match self {
            ItemKind::HealthPotion => ItemTemplate::new(
                "health potion",
                '!',
                RGB::from_u8(220, 50, 47),
                ItemEffect::Heal { amount: 2 },
            ),
            ItemKind::TimePotion => ItemTemplate::new(
                "time potion",
                '!',
                RGB::from_u8(108, 113, 196),
                ItemEffect::Restore { amount: 2 },
            ),
            ItemKind::Hourglass => ItemTemplate::new(
                "golden hourglass",
                '%',
                RGB::from_u8(181, 137, 0),
                ItemEffect::Victory,
            ),
        }
    }
}

impl ItemTemplate {
    pub const fn new(name: &'static str, glyph: char, color: RGB, effect: ItemEffect) -> Self {
        Self {
            name,
            glyph,
            color,
            effect,
        }
    }
}
