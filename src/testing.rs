//! Fixtures shared by the unit tests.

use bracket_geometry::prelude::Point;
use specs::prelude::Entity;

use crate::{
    config::GameConfig,
    data::monsters::{MonsterTemplate, Species},
    ecs::{EcsWorld, resources::Rules},
    game::Game,
    map::{Dungeon, Floor, FloorId, Terrain},
};

pub const ARENA_SIZE: i32 = 20;

pub fn config() -> GameConfig {
    GameConfig {
        seed: 7,
        ..GameConfig::default()
    }
}

/// One walled 20x20 room; the player starts at its centre.
pub fn arena() -> EcsWorld {
    arena_with(|_| {})
}

pub fn arena_with(tweak: impl FnOnce(&mut Rules)) -> EcsWorld {
    let dungeon = Dungeon::from_floors(vec![Floor::open_room(FloorId(0), ARENA_SIZE, ARENA_SIZE)]);
    let mut world = EcsWorld::new(dungeon, &config());
    let mut rules = world.rules();
    tweak(&mut rules);
    world.set_rules(rules);
    world
}

/// Two rooms joined by stairs: down at (15,15) on the first, up at (4,4)
/// on the second.
pub fn tower() -> EcsWorld {
    let mut top = Floor::open_room(FloorId(0), ARENA_SIZE, ARENA_SIZE);
    let down = Point::new(15, 15);
    top.set_terrain(down, Terrain::StairsDown);
    top.stairs_down = Some(down);

    let mut bottom = Floor::open_room(FloorId(1), ARENA_SIZE, ARENA_SIZE);
    let up = Point::new(4, 4);
    bottom.set_terrain(up, Terrain::StairsUp);
    bottom.stairs_up = Some(up);

    EcsWorld::new(Dungeon::from_floors(vec![top, bottom]), &config())
}

pub fn spawn(world: &mut EcsWorld, species: Species, point: Point) -> Entity {
    let floor = world.active_floor();
    world.spawn_monster(&MonsterTemplate::for_species(species), point, floor)
}

pub fn game_in(world: EcsWorld) -> Game {
    Game::from_world(world, config().journal_capacity)
}
