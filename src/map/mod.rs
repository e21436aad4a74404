#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};

use bracket_geometry::prelude::{Point, Rect};
use bracket_random::prelude::RandomNumberGenerator;
use bracket_terminal::prelude::{BLACK, RGB};
use smallvec::SmallVec;
use specs::prelude::Entity;

use crate::config::GameConfig;

pub const DEFAULT_MAP_WIDTH: i32 = 40;
pub const DEFAULT_MAP_HEIGHT: i32 = 30;

/// The eight compass steps, orthogonals first.
pub const NEIGHBOURS: [Point; 8] = [
    Point { x: 0, y: -1 },
    Point { x: 1, y: 0 },
    Point { x: 0, y: 1 },
    Point { x: -1, y: 0 },
    Point { x: 1, y: -1 },
    Point { x: 1, y: 1 },
    Point { x: -1, y: 1 },
    Point { x: -1, y: -1 },
];

pub const DIAGONALS: [Point; 4] = [
    Point { x: 1, y: -1 },
    Point { x: 1, y: 1 },
    Point { x: -1, y: 1 },
    Point { x: -1, y: -1 },
];

fn corridor_path(start: Point, end: Point) -> Vec<Point> {
    let mut path = Vec::new();
    let mut cursor = start;
    path.push(cursor);

    while cursor.x != end.x {
        cursor.x += if end.x > cursor.x { 1 } else { -1 };
        path.push(cursor);
    }

    while cursor.y != end.y {
        cursor.y += if end.y > cursor.y { 1 } else { -1 };
        path.push(cursor);
    }

    path
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct FloorId(pub u32);

/// Room and corridor layout of one floor before it is painted into tiles.
#[derive(Clone, Debug)]
pub struct Substrate {
    pub width: i32,
    pub height: i32,
    pub rooms: Vec<Rect>,
    pub corridors: Vec<Vec<Point>>,
    pub doors: Vec<Point>,
}

impl Substrate {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            rooms: Vec::new(),
            corridors: Vec::new(),
            doors: Vec::new(),
        }
    }

    pub fn procedural(width: i32, height: i32, rng: &mut RandomNumberGenerator) -> Self {
        const MAX_ROOMS: usize = 12;
        const MIN_ROOM_W: i32 = 4;
        const MAX_ROOM_W: i32 = 9;
        const MIN_ROOM_H: i32 = 3;
        const MAX_ROOM_H: i32 = 7;

        let mut substrate = Self::new(width, height);

        for _ in 0..MAX_ROOMS {
            let room_w = rng.range(MIN_ROOM_W, MAX_ROOM_W);
            let room_h = rng.range(MIN_ROOM_H, MAX_ROOM_H);
            let x_max = width - room_w - 1;
            let y_max = height - room_h - 1;
            if x_max <= 1 || y_max <= 1 {
                continue;
            }

            let candidate = Rect::with_size(rng.range(1, x_max), rng.range(1, y_max), room_w, room_h);

            // Keep a wall between rooms so doors stay meaningful.
            let padded = Rect::with_size(candidate.x1 - 1, candidate.y1 - 1, room_w + 2, room_h + 2);
            if substrate.rooms.iter().any(|room| room.intersect(&padded)) {
                continue;
            }

            if let Some(prev_center) = substrate.rooms.last().map(|room| room.center()) {
                substrate
                    .corridors
                    .push(corridor_path(prev_center, candidate.center()));
            }
            substrate.rooms.push(candidate);
        }

        if substrate.rooms.len() < 2 {
            return Self::demo_layout(width, height);
        }
        substrate.place_doors(rng);
        substrate
    }

    pub fn demo_layout(width: i32, height: i32) -> Self {
        let mut substrate = Self::new(width, height);
        let room_width = 6;
        let room_height = 5;
        let mut x = 1;
        while x + room_width < width - 1 {
            substrate
                .rooms
                .push(Rect::with_size(x, 2, room_width, room_height));
            x += room_width + 3;
        }

        if substrate.rooms.is_empty() {
            substrate
                .rooms
                .push(Rect::with_size(1, 1, (width - 2).max(1), (height - 2).max(1)));
        }

        for window in substrate.rooms.windows(2) {
            substrate
                .corridors
                .push(corridor_path(window[0].center(), window[1].center()));
        }

        substrate
    }

    fn inside_room(&self, point: Point) -> bool {
        self.rooms.iter().any(|room| {
            point.x >= room.x1 && point.x < room.x2 && point.y >= room.y1 && point.y < room.y2
        })
    }

    /// Hangs a door on roughly half of the corridors, at the first cell that
    /// leaves a room.
    fn place_doors(&mut self, rng: &mut RandomNumberGenerator) {
        let mut doors = Vec::new();
        for corridor in &self.corridors {
            if rng.range(0, 2) == 0 {
                continue;
            }
            let exit = corridor
                .windows(2)
                .find(|pair| self.inside_room(pair[0]) && !self.inside_room(pair[1]))
                .map(|pair| pair[1]);
            if let Some(point) = exit {
                doors.push(point);
            }
        }
        self.doors = doors;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Terrain {
    Floor,
    Wall,
    Door { open: bool },
    StairsUp,
    StairsDown,
    Empty,
}

impl Terrain {
    pub fn blocks_move(self) -> bool {
        matches!(
            self,
            Terrain::Wall | Terrain::Empty | Terrain::Door { open: false }
        )
    }

    pub fn blocks_sight(self) -> bool {
        matches!(
            self,
            Terrain::Wall | Terrain::Empty | Terrain::Door { open: false }
        )
    }

    pub fn glyph(self) -> u16 {
        match self {
            Terrain::Floor => b'.' as u16,
            Terrain::Wall => b'#' as u16,
            Terrain::Door { open: false } => b'+' as u16,
            Terrain::Door { open: true } => b'\'' as u16,
            Terrain::StairsUp => b'<' as u16,
            Terrain::StairsDown => b'>' as u16,
            Terrain::Empty => b' ' as u16,
        }
    }

    pub fn color(self) -> RGB {
        match self {
            Terrain::Wall => RGB::from_u8(42, 161, 152),
            Terrain::Door { .. } => RGB::from_u8(181, 137, 0),
            Terrain::StairsUp | Terrain::StairsDown => RGB::from_u8(238, 232, 213),
            _ => RGB::from_u8(147, 161, 161),
        }
    }
}

/// A non-owning reference from a tile to an entity standing on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Occupant {
    pub entity: Entity,
    pub blocking: bool,
}

#[derive(Clone, Debug)]
pub struct Tile {
    pub terrain: Terrain,
    pub revealed: bool,
    pub occupants: SmallVec<[Occupant; 2]>,
}

impl Default for Tile {
    fn default() -> Self {
        Tile::new(Terrain::Empty)
    }
}

impl Tile {
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            revealed: false,
            occupants: SmallVec::new(),
        }
    }

    pub fn glyph(&self) -> u16 {
        self.terrain.glyph()
    }

    pub fn fg(&self) -> RGB {
        self.terrain.color()
    }

    pub fn bg(&self) -> RGB {
        RGB::named(BLACK)
    }

    pub fn blocks_move(&self) -> bool {
        self.terrain.blocks_move() || self.occupants.iter().any(|o| o.blocking)
    }

    pub fn blocks_sight(&self) -> bool {
        self.terrain.blocks_sight()
    }

    pub fn is_occupied(&self) -> bool {
        !self.occupants.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Floor {
    pub id: FloorId,
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<Tile>,
    pub stairs_up: Option<Point>,
    pub stairs_down: Option<Point>,
    pub spawn: Point,
}

impl Floor {
    pub fn empty(id: FloorId, width: i32, height: i32) -> Self {
        let size = (width * height) as usize;
        Self {
            id,
            width,
            height,
            tiles: vec![Tile::default(); size],
            stairs_up: None,
            stairs_down: None,
            spawn: Point::new(width / 2, height / 2),
        }
    }

    /// A single walled room filling the whole grid.
    pub fn open_room(id: FloorId, width: i32, height: i32) -> Self {
        let mut floor = Self::empty(id, width, height);
        for y in 0..height {
            for x in 0..width {
                let edge = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                let terrain = if edge { Terrain::Wall } else { Terrain::Floor };
                floor.set_terrain(Point::new(x, y), terrain);
            }
        }
        floor
    }

    pub fn from_substrate(
        id: FloorId,
        substrate: &Substrate,
        has_up: bool,
        has_down: bool,
    ) -> Self {
        let mut floor = Self::empty(id, substrate.width, substrate.height);

        for room in &substrate.rooms {
            room.for_each(|pt| floor.set_terrain(pt, Terrain::Floor));
        }
        for corridor in &substrate.corridors {
            for &pt in corridor {
                floor.set_terrain(pt, Terrain::Floor);
            }
        }
        floor.wall_in();
        for &door in &substrate.doors {
            floor.set_terrain(door, Terrain::Door { open: false });
        }

        let first = substrate.rooms.first().map(|room| room.center());
        let last = substrate.rooms.last().map(|room| room.center());
        floor.spawn = first.unwrap_or(floor.spawn);
        if has_up {
            floor.stairs_up = first;
        }
        if has_down {
            floor.stairs_down = last;
        }
        if let Some(point) = floor.stairs_up {
            floor.set_terrain(point, Terrain::StairsUp);
        }
        if let Some(point) = floor.stairs_down {
            floor.set_terrain(point, Terrain::StairsDown);
        }
        floor
    }

    /// Raises walls around every carved cell; the rest stays empty void.
    fn wall_in(&mut self) {
        let carved: Vec<Point> = self
            .points()
            .filter(|p| self.terrain(*p) == Some(Terrain::Floor))
            .collect();
        for point in carved {
            for step in NEIGHBOURS {
                let next = point + step;
                if self.terrain(next) == Some(Terrain::Empty) {
                    self.set_terrain(next, Terrain::Wall);
                }
            }
        }
    }

    fn idx(&self, point: Point) -> Option<usize> {
        if self.in_bounds(point) {
            Some((point.y * self.width + point.x) as usize)
        } else {
            None
        }
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }

    pub fn points(&self) -> impl Iterator<Item = Point> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Point::new(x, y)))
    }

    pub fn set_terrain(&mut self, point: Point, terrain: Terrain) {
        if let Some(tile) = self.tile_at_mut(point) {
            tile.terrain = terrain;
        }
    }

    pub fn terrain(&self, point: Point) -> Option<Terrain> {
        self.tile_at(point).map(|tile| tile.terrain)
    }

    pub fn tile_at(&self, point: Point) -> Option<&Tile> {
        self.idx(point).map(|idx| &self.tiles[idx])
    }

    pub fn tile_at_mut(&mut self, point: Point) -> Option<&mut Tile> {
        self.idx(point).map(|idx| &mut self.tiles[idx])
    }

    pub fn reveal_point(&mut self, point: Point) {
        if let Some(tile) = self.tile_at_mut(point) {
            tile.revealed = true;
        }
    }

    /// Walkable terrain, ignoring occupants.
    pub fn is_walkable(&self, point: Point) -> bool {
        self.tile_at(point)
            .is_some_and(|tile| !tile.terrain.blocks_move())
    }

    /// Walkable and free of blocking occupants.
    pub fn is_open(&self, point: Point) -> bool {
        self.tile_at(point).is_some_and(|tile| !tile.blocks_move())
    }

    pub fn blocks_sight(&self, point: Point) -> bool {
        self.tile_at(point).is_none_or(|tile| tile.blocks_sight())
    }

    pub fn occupants(&self, point: Point) -> &[Occupant] {
        self.tile_at(point)
            .map(|tile| tile.occupants.as_slice())
            .unwrap_or(&[])
    }

    /// Registers `entity` on the tile at `point`.
    pub fn block(&mut self, point: Point, entity: Entity, blocking: bool) {
        if let Some(tile) = self.tile_at_mut(point) {
            if !tile.occupants.iter().any(|o| o.entity == entity) {
                tile.occupants.push(Occupant { entity, blocking });
            }
        }
    }

    /// Removes `entity` from the tile at `point`.
    pub fn unblock(&mut self, point: Point, entity: Entity) {
        if let Some(tile) = self.tile_at_mut(point) {
            tile.occupants.retain(|o| o.entity != entity);
        }
    }

    pub fn open_door(&mut self, point: Point) -> bool {
        match self.tile_at_mut(point) {
            Some(tile) if tile.terrain == (Terrain::Door { open: false }) => {
                tile.terrain = Terrain::Door { open: true };
                true
            }
            _ => false,
        }
    }

    pub fn walkable_points(&self) -> Vec<Point> {
        self.points().filter(|p| self.is_walkable(*p)).collect()
    }

    /// A random open cell, or `None` when the floor is full.
    pub fn find_open_point(&self, rng: &mut RandomNumberGenerator) -> Option<Point> {
        let open: Vec<Point> = self
            .points()
            .filter(|p| self.is_open(*p) && !self.tile_at(*p).is_some_and(Tile::is_occupied))
            .collect();
        if open.is_empty() {
            return None;
        }
        let idx = rng.range(0, open.len() as i32) as usize;
        Some(open[idx])
    }

    /// Breadth-first search outward from `origin` for the closest open cell.
    pub fn nearest_open(&self, origin: Point) -> Option<Point> {
        if !self.in_bounds(origin) {
            return None;
        }
        let mut seen = HashSet::from([origin]);
        let mut frontier = VecDeque::from([origin]);
        while let Some(point) = frontier.pop_front() {
            if self.is_open(point) {
                return Some(point);
            }
            for step in NEIGHBOURS {
                let next = point + step;
                if self.is_walkable(next) && seen.insert(next) {
                    frontier.push_back(next);
                }
            }
        }
        None
    }
}

#[derive(Clone, Debug, Default)]
pub struct Dungeon {
    pub floors: Vec<Floor>,
}

impl Dungeon {
    pub fn from_floors(floors: Vec<Floor>) -> Self {
        Self { floors }
    }

    /// Builds every floor of a run. Floor 0 only leads down, the last floor
    /// only up, every floor between both.
    pub fn generate(config: &GameConfig, rng: &mut RandomNumberGenerator) -> Self {
        let count = config.floors.max(1);
        let floors = (0..count)
            .map(|idx| {
                let substrate = Substrate::procedural(config.map_width, config.map_height, rng);
                Floor::from_substrate(FloorId(idx), &substrate, idx > 0, idx + 1 < count)
            })
            .collect();
        Self { floors }
    }

    /// Panics on a floor that was never generated.
    pub fn floor(&self, id: FloorId) -> &Floor {
        &self.floors[id.0 as usize]
    }

    pub fn floor_mut(&mut self, id: FloorId) -> &mut Floor {
        &mut self.floors[id.0 as usize]
    }

    pub fn spawn_point(&self, floor: FloorId) -> Point {
        self.floor(floor).spawn
    }

    pub fn is_last(&self, floor: FloorId) -> bool {
        floor.0 as usize + 1 == self.floors.len()
    }

    /// Where the stairs at `point` lead, if there are stairs there.
    pub fn stair_destination(&self, floor: FloorId, point: Point) -> Option<(FloorId, Point)> {
        let current = self.floor(floor);
        if current.stairs_down == Some(point) {
            let below = FloorId(floor.0 + 1);
            let landing = self.floors.get(below.0 as usize)?.stairs_up?;
            return Some((below, landing));
        }
        if current.stairs_up == Some(point) && floor.0 > 0 {
            let above = FloorId(floor.0 - 1);
            let landing = self.floor(above).stairs_down?;
            return Some((above, landing));
        }
        None
    }
}
