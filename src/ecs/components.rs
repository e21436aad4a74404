#![allow(dead_code)]

use bracket_geometry::prelude::Point;
use bracket_terminal::prelude::RGB;
use specs::prelude::{Component, Entity, NullStorage, VecStorage};

use crate::{
    ai::{Behavior, EnemyMode},
    data::{
        items::ItemKind,
        monsters::{DeathRite, Species},
        skills::SkillKind,
    },
    map::FloorId,
    time::HistoryRing,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub point: Point,
    pub floor: FloorId,
}

impl Component for Position {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug)]
pub struct Renderable {
    pub glyph: u16,
    pub color: RGB,
    pub order: i32,
}

impl Component for Renderable {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, Default)]
pub struct Viewshed {
    pub radius: i32,
    pub dirty: bool,
    pub visible: Vec<Point>,
}

impl Component for Viewshed {
    type Storage = VecStorage<Self>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActorKind {
    Player,
    Enemy,
}

impl Component for ActorKind {
    type Storage = VecStorage<Self>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ActorState {
    #[default]
    Alive,
    Dead,
    Victorious,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Condition(pub ActorState);

impl Component for Condition {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vitals {
    pub max_hp: i32,
    pub hp: i32,
    pub max_tp: i32,
    pub tp: i32,
}

impl Vitals {
    pub fn new(hp: i32, tp: i32) -> Self {
        Self {
            max_hp: hp,
            hp,
            max_tp: tp,
            tp,
        }
    }
}

impl Component for Vitals {
    type Storage = VecStorage<Self>;
}

/// Effects waiting for the actor's own turn.
///
/// This is the only way one actor changes another's stats between turns:
/// attackers add to it, and the target's turn applies and clears it.
#[derive(Clone, Debug, PartialEq)]
pub struct Pending {
    pub hp: i32,
    pub tp: i32,
    pub pos: Point,
    pub xp: i32,
    /// Last actor that hurt this one, credited with the kill.
    pub source: Option<Entity>,
}

impl Default for Pending {
    fn default() -> Self {
        Self {
            hp: 0,
            tp: 0,
            pos: Point::new(0, 0),
            xp: 0,
            source: None,
        }
    }
}

impl Component for Pending {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug)]
pub struct Chronicle(pub HistoryRing);

impl Component for Chronicle {
    type Storage = VecStorage<Self>;
}

/// Frozen-turns-remaining.
#[derive(Clone, Debug, Default)]
pub struct Stasis {
    pub turns: u32,
}

impl Component for Stasis {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug)]
pub struct Melee {
    pub bump_damage: i32,
}

impl Component for Melee {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, Default)]
pub struct Progression {
    pub xp: i32,
    pub level: u32,
}

impl Component for Progression {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, Default)]
pub struct Skillbook {
    pub known: Vec<SkillKind>,
}

impl Skillbook {
    pub fn knows(&self, skill: SkillKind) -> bool {
        self.known.contains(&skill)
    }

    /// Returns `true` when the skill was new.
    pub fn learn(&mut self, skill: SkillKind) -> bool {
        if self.knows(skill) {
            return false;
        }
        self.known.push(skill);
        true
    }
}

impl Component for Skillbook {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug)]
pub struct Monster {
    pub name: String,
    pub species: Species,
    pub xp_reward: i32,
}

impl Component for Monster {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug)]
pub struct Brain {
    pub mode: EnemyMode,
    pub behavior: Behavior,
    pub sight: i32,
    pub reach: i32,
    /// Turns spent in sight of the player, for cadenced behaviors.
    pub cadence: u32,
}

impl Component for Brain {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug)]
pub struct Remains {
    pub rite: DeathRite,
}

impl Component for Remains {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug)]
pub struct Item {
    pub kind: ItemKind,
    pub name: String,
}

impl Component for Item {
    type Storage = VecStorage<Self>;
}

/// Occupies its tile exclusively.
#[derive(Default)]
pub struct Blocker;

impl Component for Blocker {
    type Storage = NullStorage<Self>;
}

#[derive(Default)]
pub struct PlayerTag;

impl Component for PlayerTag {
    type Storage = NullStorage<Self>;
}

#[derive(Default)]
pub struct MonsterTag;

impl Component for MonsterTag {
    type Storage = NullStorage<Self>;
}
