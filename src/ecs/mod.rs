pub mod actions;
pub mod combat;
pub mod components;
pub mod resources;
pub mod skills;
pub mod systems;
pub mod turn;

use std::collections::HashSet;

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;
use bracket_terminal::prelude::RGB;
use specs::prelude::{
    Builder, Dispatcher, DispatcherBuilder, Entity, Join, World as SpecsWorld, WorldExt,
};

use crate::{
    ai::{EnemyMode, chebyshev},
    config::GameConfig,
    data::{
        items::ItemKind,
        monsters::{MonsterTemplate, Species},
        skills::{SkillKind, skills_for_level},
    },
    error::{GameError, GameResult},
    map::{Dungeon, FloorId, Terrain},
    time::{Clock, HistoryRing, Snapshot},
};

use self::{
    components::{
        ActorKind, ActorState, Blocker, Brain, Chronicle, Condition, Item, Melee, Monster,
        MonsterTag, Pending, PlayerTag, Position, Progression, Remains, Renderable, Skillbook,
        Stasis, Viewshed, Vitals,
    },
    resources::{ActiveFloor, CombatLog, Rules},
    systems::{FovSystem, RevealSystem},
};

pub struct EcsWorld {
    specs_world: SpecsWorld,
    dispatcher: Dispatcher<'static, 'static>,
    player: Entity,
}

/// A tile as the renderer sees it.
#[derive(Clone, Debug)]
pub struct TileView {
    pub point: Point,
    pub glyph: u16,
    pub fg: RGB,
    pub visible: bool,
}

/// An entity the player can currently see.
#[derive(Clone, Debug)]
pub struct EntityView {
    pub point: Point,
    pub glyph: u16,
    pub color: RGB,
    pub order: i32,
}

impl EcsWorld {
    pub fn new(dungeon: Dungeon, config: &GameConfig) -> Self {
        let mut specs_world = SpecsWorld::new();
        Self::register_components(&mut specs_world);
        let spawn = dungeon.spawn_point(FloorId(0));
        specs_world.insert(RandomNumberGenerator::seeded(config.seed ^ 0x51ec_5ead));
        specs_world.insert(CombatLog::default());
        specs_world.insert(Clock::new());
        specs_world.insert(Rules::from(config));
        specs_world.insert(ActiveFloor(FloorId(0)));
        specs_world.insert(dungeon);
        let player = Self::spawn_player(&mut specs_world, spawn, config);
        let dispatcher = DispatcherBuilder::new()
            .with(FovSystem::default(), "fov", &[])
            .with(RevealSystem::default(), "reveal", &["fov"])
            .build();

        let mut world = Self {
            specs_world,
            dispatcher,
            player,
        };
        world.refresh_visibility();
        world
    }

    fn register_components(world: &mut SpecsWorld) {
        world.register::<Position>();
        world.register::<Renderable>();
        world.register::<Viewshed>();
        world.register::<ActorKind>();
        world.register::<Condition>();
        world.register::<Vitals>();
        world.register::<Pending>();
        world.register::<Chronicle>();
        world.register::<Stasis>();
        world.register::<Melee>();
        world.register::<Progression>();
        world.register::<Skillbook>();
        world.register::<Monster>();
        world.register::<Brain>();
        world.register::<Remains>();
        world.register::<Item>();
        world.register::<Blocker>();
        world.register::<PlayerTag>();
        world.register::<MonsterTag>();
    }

    fn spawn_player(world: &mut SpecsWorld, spawn: Point, config: &GameConfig) -> Entity {
        let player = world
            .create_entity()
            .with(Position {
                point: spawn,
                floor: FloorId(0),
            })
            .with(Renderable {
                glyph: b'@' as u16,
                color: RGB::from_u8(253, 246, 227),
                order: 2,
            })
            .with(Viewshed {
                radius: config.sight_radius,
                dirty: true,
                visible: Vec::new(),
            })
            .with(ActorKind::Player)
            .with(Condition::default())
            .with(Vitals::new(config.player_hp, config.player_tp))
            .with(Pending::default())
            .with(Chronicle(HistoryRing::new(config.max_record)))
            .with(Stasis::default())
            .with(Melee {
                bump_damage: config.player_bump_damage,
            })
            .with(Progression { xp: 0, level: 1 })
            .with(Skillbook {
                known: skills_for_level(1).collect(),
            })
            .with(Blocker)
            .with(PlayerTag)
            .build();
        world
            .write_resource::<Dungeon>()
            .floor_mut(FloorId(0))
            .block(spawn, player, true);
        player
    }

    pub fn spawn_monster(&mut self, template: &MonsterTemplate, point: Point, floor: FloorId) -> Entity {
        let horizon = self.rules().max_record;
        let entity = self
            .specs_world
            .create_entity()
            .with(Position { point, floor })
            .with(Renderable {
                glyph: template.glyph as u16,
                color: template.color,
                order: 1,
            })
            .with(ActorKind::Enemy)
            .with(Condition::default())
            .with(Vitals::new(template.hp, template.tp))
            .with(Pending::default())
            .with(Chronicle(HistoryRing::new(horizon)))
            .with(Stasis::default())
            .with(Melee {
                bump_damage: template.bump_damage,
            })
            .with(Monster {
                name: template.name.to_string(),
                species: template.species,
                xp_reward: template.xp,
            })
            .with(Brain {
                mode: EnemyMode::Wander,
                behavior: template.behavior,
                sight: template.sight,
                reach: template.reach,
                cadence: 0,
            })
            .with(Remains {
                rite: template.rite,
            })
            .with(Blocker)
            .with(MonsterTag)
            .build();
        self.specs_world
            .write_resource::<Dungeon>()
            .floor_mut(floor)
            .block(point, entity, true);
        entity
    }

    pub fn spawn_item(&mut self, kind: ItemKind, point: Point, floor: FloorId) -> Entity {
        let template = kind.template();
        let entity = self
            .specs_world
            .create_entity()
            .with(Position { point, floor })
            .with(Renderable {
                glyph: template.glyph as u16,
                color: template.color,
                order: 0,
            })
            .with(Item {
                kind,
                name: template.name.to_string(),
            })
            .build();
        self.specs_world
            .write_resource::<Dungeon>()
            .floor_mut(floor)
            .block(point, entity, false);
        entity
    }

    /// Scatters the roster over every floor and sets the Chronotherium on
    /// the last one, as far from its stairs as a handful of tries allows.
    pub fn populate(&mut self, config: &GameConfig) {
        let roster = MonsterTemplate::roster();
        let total_density: u32 = roster.iter().map(|t| t.density).sum();
        let mut placements = Vec::new();
        {
            let dungeon = self.specs_world.read_resource::<Dungeon>();
            let mut rng = self.specs_world.write_resource::<RandomNumberGenerator>();
            for floor in &dungeon.floors {
                let mut taken: HashSet<Point> = HashSet::from([floor.spawn]);
                let mut place = |rng: &mut RandomNumberGenerator| {
                    for _ in 0..32 {
                        let point = floor.find_open_point(rng)?;
                        if chebyshev(point, floor.spawn) > 2 && taken.insert(point) {
                            return Some(point);
                        }
                    }
                    None
                };

                for _ in 0..config.enemies_per_floor {
                    let Some(point) = place(&mut *rng) else {
                        break;
                    };
                    let mut roll = rng.range(0, total_density.max(1) as i32) as u32;
                    let template = roster
                        .iter()
                        .find(|t| {
                            if roll < t.density {
                                true
                            } else {
                                roll -= t.density;
                                false
                            }
                        })
                        .unwrap_or(&roster[0]);
                    placements.push((template.clone(), point, floor.id));
                }

                if dungeon.is_last(floor.id) {
                    let anchor = floor.stairs_up.unwrap_or(floor.spawn);
                    let lair = (0..12)
                        .filter_map(|_| place(&mut *rng))
                        .max_by_key(|point| chebyshev(*point, anchor));
                    if let Some(point) = lair {
                        placements.push((
                            MonsterTemplate::for_species(Species::Chronotherium),
                            point,
                            floor.id,
                        ));
                    }
                }
            }
        }

        for (template, point, floor) in placements {
            self.spawn_monster(&template, point, floor);
        }
        log::info!("populated {} floors", config.floors);
    }

    pub fn refresh_visibility(&mut self) {
        self.dispatcher.dispatch(&self.specs_world);
        self.specs_world.maintain();
    }

    pub fn advance_clock(&mut self) -> u64 {
        self.specs_world.write_resource::<Clock>().advance()
    }

    pub fn restore_clock(&mut self, tick: u64) {
        self.specs_world.write_resource::<Clock>().restore(tick);
    }

    pub fn now(&self) -> u64 {
        self.specs_world.read_resource::<Clock>().now()
    }

    pub fn rules(&self) -> Rules {
        (*self.specs_world.read_resource::<Rules>()).clone()
    }

    pub fn set_rules(&mut self, rules: Rules) {
        self.specs_world.insert(rules);
    }

    pub fn active_floor(&self) -> FloorId {
        self.specs_world.read_resource::<ActiveFloor>().0
    }

    pub fn with_dungeon<R>(&self, f: impl FnOnce(&Dungeon) -> R) -> R {
        f(&self.specs_world.read_resource::<Dungeon>())
    }

    pub fn with_dungeon_mut<R>(&mut self, f: impl FnOnce(&mut Dungeon) -> R) -> R {
        f(&mut self.specs_world.write_resource::<Dungeon>())
    }

    pub fn drain_combat_log(&mut self) -> Vec<String> {
        let mut log = self.specs_world.write_resource::<CombatLog>();
        std::mem::take(&mut log.entries)
    }

    pub(crate) fn log<S: Into<String>>(&self, entry: S) {
        self.specs_world.write_resource::<CombatLog>().push(entry);
    }

    pub fn player_entity(&self) -> Entity {
        self.player
    }

    pub fn position(&self, entity: Entity) -> Option<Position> {
        self.specs_world
            .read_component::<Position>()
            .get(entity)
            .cloned()
    }

    pub fn player_position(&self) -> Position {
        self.position(self.player).unwrap_or(Position {
            point: Point::new(0, 0),
            floor: FloorId(0),
        })
    }

    pub fn player_point(&self) -> Point {
        self.player_position().point
    }

    pub fn vitals(&self, entity: Entity) -> Option<Vitals> {
        self.specs_world
            .read_component::<Vitals>()
            .get(entity)
            .cloned()
    }

    pub fn player_vitals(&self) -> Vitals {
        self.vitals(self.player).unwrap_or(Vitals::new(0, 0))
    }

    pub fn vitals_mut<R>(&mut self, entity: Entity, f: impl FnOnce(&mut Vitals) -> R) -> Option<R> {
        let mut vitals = self.specs_world.write_component::<Vitals>();
        vitals.get_mut(entity).map(f)
    }

    pub fn pending(&self, entity: Entity) -> Pending {
        self.specs_world
            .read_component::<Pending>()
            .get(entity)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn pending_mut<R>(
        &mut self,
        entity: Entity,
        f: impl FnOnce(&mut Pending) -> R,
    ) -> Option<R> {
        let mut pending = self.specs_world.write_component::<Pending>();
        pending.get_mut(entity).map(f)
    }

    pub fn state(&self, entity: Entity) -> ActorState {
        self.specs_world
            .read_component::<Condition>()
            .get(entity)
            .map(|condition| condition.0)
            .unwrap_or(ActorState::Dead)
    }

    pub(crate) fn set_state(&mut self, entity: Entity, state: ActorState) {
        let mut conditions = self.specs_world.write_component::<Condition>();
        if let Some(condition) = conditions.get_mut(entity) {
            condition.0 = state;
        }
    }

    pub fn player_state(&self) -> ActorState {
        self.state(self.player)
    }

    pub fn frozen_turns(&self, entity: Entity) -> u32 {
        self.specs_world
            .read_component::<Stasis>()
            .get(entity)
            .map_or(0, |stasis| stasis.turns)
    }

    pub fn enemy_mode(&self, entity: Entity) -> Option<EnemyMode> {
        self.specs_world
            .read_component::<Brain>()
            .get(entity)
            .map(|brain| brain.mode)
    }

    pub fn progression(&self) -> Progression {
        self.specs_world
            .read_component::<Progression>()
            .get(self.player)
            .cloned()
            .unwrap_or_default()
    }

    pub fn player_knows(&self, skill: SkillKind) -> bool {
        self.specs_world
            .read_component::<Skillbook>()
            .get(self.player)
            .is_some_and(|book| book.knows(skill))
    }

    pub fn teach_player(&mut self, skill: SkillKind) -> bool {
        let mut books = self.specs_world.write_component::<Skillbook>();
        books
            .get_mut(self.player)
            .is_some_and(|book| book.learn(skill))
    }

    pub fn player_snapshot(&self, tick: u64) -> GameResult<Snapshot> {
        self.specs_world
            .read_component::<Chronicle>()
            .get(self.player)
            .ok_or(GameError::NoHistoryAtTick(tick))?
            .0
            .snapshot_at(tick)
    }

    pub fn history_len(&self, entity: Entity) -> usize {
        self.specs_world
            .read_component::<Chronicle>()
            .get(entity)
            .map_or(0, |chronicle| chronicle.0.len())
    }

    /// Drops every actor's entries after `tick`.
    pub fn truncate_histories(&mut self, tick: u64) {
        let mut chronicles = self.specs_world.write_component::<Chronicle>();
        for chronicle in (&mut chronicles).join() {
            chronicle.0.truncate_after(tick);
        }
    }

    /// "you" for the player, the species name for anything else.
    pub fn name_of(&self, entity: Entity) -> String {
        if entity == self.player {
            return "you".to_string();
        }
        self.specs_world
            .read_component::<Monster>()
            .get(entity)
            .map(|monster| format!("the {}", monster.name))
            .unwrap_or_else(|| "something".to_string())
    }

    pub fn is_hostile_to(&self, attacker: Entity, defender: Entity) -> bool {
        let kinds = self.specs_world.read_component::<ActorKind>();
        match (kinds.get(attacker), kinds.get(defender)) {
            (Some(a), Some(d)) => a != d,
            _ => false,
        }
    }

    /// A living actor hostile to the player standing at `point` on the
    /// active floor.
    pub fn hostile_at(&self, point: Point) -> Option<Entity> {
        let floor = self.active_floor();
        let occupants: Vec<Entity> = self.with_dungeon(|dungeon| {
            dungeon
                .floor(floor)
                .occupants(point)
                .iter()
                .map(|o| o.entity)
                .collect()
        });
        occupants.into_iter().find(|entity| {
            self.is_hostile_to(self.player, *entity) && self.state(*entity) == ActorState::Alive
        })
    }

    pub fn items_at(&self, point: Point, floor: FloorId) -> Vec<Entity> {
        let entities = self.specs_world.entities();
        let positions = self.specs_world.read_component::<Position>();
        let items = self.specs_world.read_component::<Item>();
        (&entities, &positions, &items)
            .join()
            .filter(|(_, pos, _)| pos.floor == floor && pos.point == point)
            .map(|(entity, _, _)| entity)
            .collect()
    }

    /// Enemies on `floor`, in spawn order.
    pub fn enemies_on(&self, floor: FloorId) -> Vec<Entity> {
        let entities = self.specs_world.entities();
        let positions = self.specs_world.read_component::<Position>();
        let monsters = self.specs_world.read_component::<MonsterTag>();
        (&entities, &positions, &monsters)
            .join()
            .filter(|(_, pos, _)| pos.floor == floor)
            .map(|(entity, _, _)| entity)
            .collect()
    }

    /// Moves `entity` to `dest` on its own floor, keeping tile occupancy
    /// balanced. Fails without side effects if `dest` is off the grid or
    /// blocked.
    pub fn relocate(&mut self, entity: Entity, dest: Point) -> GameResult<()> {
        let Some(pos) = self.position(entity) else {
            return Ok(());
        };
        if dest == pos.point {
            return Ok(());
        }
        let blocking = self.specs_world.read_component::<Blocker>().contains(entity);
        {
            let mut dungeon = self.specs_world.write_resource::<Dungeon>();
            let floor = dungeon.floor_mut(pos.floor);
            if !floor.in_bounds(dest) {
                return Err(GameError::OutOfBounds(dest));
            }
            if !floor.is_open(dest) {
                return Err(GameError::BlockedDestination(dest));
            }
            floor.unblock(pos.point, entity);
            floor.block(dest, entity, blocking);
        }
        self.set_position(entity, pos.floor, dest);
        Ok(())
    }

    /// Moves `entity` to `dest` on `floor`, or to the nearest open cell when
    /// `dest` is taken. Returns where it landed.
    pub fn relocate_near(&mut self, entity: Entity, floor: FloorId, dest: Point) -> Point {
        let Some(pos) = self.position(entity) else {
            return dest;
        };
        let blocking = self.specs_world.read_component::<Blocker>().contains(entity);
        let (landing_floor, landing) = {
            let mut dungeon = self.specs_world.write_resource::<Dungeon>();
            dungeon.floor_mut(pos.floor).unblock(pos.point, entity);
            let target = dungeon.floor_mut(floor);
            let landing = if target.is_open(dest) {
                Some(dest)
            } else {
                target.nearest_open(dest)
            };
            match landing {
                Some(point) => {
                    target.block(point, entity, blocking);
                    (floor, point)
                }
                None => {
                    dungeon
                        .floor_mut(pos.floor)
                        .block(pos.point, entity, blocking);
                    (pos.floor, pos.point)
                }
            }
        };
        self.set_position(entity, landing_floor, landing);
        landing
    }

    fn set_position(&mut self, entity: Entity, floor: FloorId, point: Point) {
        {
            let mut positions = self.specs_world.write_component::<Position>();
            if let Some(pos) = positions.get_mut(entity) {
                pos.point = point;
                pos.floor = floor;
            }
        }

        let mut viewsheds = self.specs_world.write_component::<Viewshed>();
        if let Some(vs) = viewsheds.get_mut(entity) {
            vs.dirty = true;
        }
    }

    pub(crate) fn mark_sight_dirty(&mut self) {
        let mut viewsheds = self.specs_world.write_component::<Viewshed>();
        if let Some(vs) = viewsheds.get_mut(self.player) {
            vs.dirty = true;
        }
    }

    pub(crate) fn set_active_floor(&mut self, floor: FloorId) {
        self.specs_world.insert(ActiveFloor(floor));
    }

    pub(crate) fn clear_history(&mut self, entity: Entity) {
        let mut chronicles = self.specs_world.write_component::<Chronicle>();
        if let Some(chronicle) = chronicles.get_mut(entity) {
            chronicle.0.clear();
        }
    }

    pub fn player_visible_points(&self) -> Vec<Point> {
        self.specs_world
            .read_component::<Viewshed>()
            .get(self.player)
            .map(|vs| vs.visible.clone())
            .unwrap_or_default()
    }

    pub fn player_sees(&self, point: Point) -> bool {
        self.specs_world
            .read_component::<Viewshed>()
            .get(self.player)
            .is_some_and(|vs| vs.visible.contains(&point))
    }

    /// Every revealed tile on the active floor, flagged when in view.
    pub fn visible_tiles(&self) -> Vec<TileView> {
        let visible: HashSet<Point> = self.player_visible_points().into_iter().collect();
        let floor = self.active_floor();
        self.with_dungeon(|dungeon| {
            let floor = dungeon.floor(floor);
            floor
                .points()
                .filter_map(|point| {
                    let tile = floor.tile_at(point)?;
                    let in_view = visible.contains(&point);
                    if (!in_view && !tile.revealed) || tile.terrain == Terrain::Empty {
                        return None;
                    }
                    Some(TileView {
                        point,
                        glyph: tile.glyph(),
                        fg: tile.fg(),
                        visible: in_view,
                    })
                })
                .collect()
        })
    }

    /// Entities in the player's view, lowest draw order first.
    pub fn visible_entities(&self) -> Vec<EntityView> {
        let visible: HashSet<Point> = self.player_visible_points().into_iter().collect();
        let floor = self.active_floor();
        let positions = self.specs_world.read_component::<Position>();
        let renderables = self.specs_world.read_component::<Renderable>();
        let mut views: Vec<EntityView> = (&positions, &renderables)
            .join()
            .filter(|(pos, _)| pos.floor == floor && visible.contains(&pos.point))
            .map(|(pos, renderable)| EntityView {
                point: pos.point,
                glyph: renderable.glyph,
                color: renderable.color,
                order: renderable.order,
            })
            .collect();
        views.sort_by_key(|view| view.order);
        views
    }

    pub fn hp_line(&self) -> String {
        let v = self.player_vitals();
        meter("HP", v.hp, v.max_hp)
    }

    pub fn tp_line(&self) -> String {
        let v = self.player_vitals();
        meter("TP", v.tp, v.max_tp)
    }

    pub fn xp_line(&self) -> String {
        let p = self.progression();
        format!("XP: {} (level {})", p.xp, p.level)
    }
}

fn meter(label: &str, value: i32, max: i32) -> String {
    let filled = value.clamp(0, max.max(0)) as usize;
    let empty = (max - value).max(0) as usize;
    format!(
        "{label}: {}{} ({value}/{max})",
        "|".repeat(filled),
        " ".repeat(empty)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{arena, spawn};

    #[test]
    fn player_occupies_spawn_tile() {
        let world = arena();
        let point = world.player_point();
        let occupants = world.with_dungeon(|d| d.floor(FloorId(0)).occupants(point).to_vec());
        assert_eq!(occupants.len(), 1);
        assert_eq!(occupants[0].entity, world.player_entity());
        assert!(occupants[0].blocking);
    }

    #[test]
    fn relocate_keeps_occupancy_balanced() {
        let mut world = arena();
        let player = world.player_entity();
        let from = world.player_point();
        let to = from + Point::new(1, 0);
        world.relocate(player, to).unwrap();
        world.with_dungeon(|d| {
            let floor = d.floor(FloorId(0));
            assert!(floor.occupants(from).is_empty());
            assert_eq!(floor.occupants(to)[0].entity, player);
        });
    }

    #[test]
    fn relocate_refuses_occupied_and_out_of_bounds_cells() {
        let mut world = arena();
        let player = world.player_entity();
        let blocked = world.player_point() + Point::new(0, 1);
        spawn(&mut world, Species::Sentry, blocked);
        assert!(matches!(
            world.relocate(player, blocked),
            Err(GameError::BlockedDestination(_))
        ));
        assert!(matches!(
            world.relocate(player, Point::new(-4, 2)),
            Err(GameError::OutOfBounds(_))
        ));
    }

    #[test]
    fn player_sees_adjacent_enemy() {
        let mut world = arena();
        let point = world.player_point() + Point::new(2, 0);
        spawn(&mut world, Species::Sentry, point);
        world.refresh_visibility();
        assert!(world.player_sees(point));
        assert!(world.visible_entities().iter().any(|view| view.point == point));
        assert!(!world.visible_tiles().is_empty());
    }

    #[test]
    fn meters_render_bars() {
        assert_eq!(meter("HP", 3, 5), "HP: |||   (3/5)");
    }
}
