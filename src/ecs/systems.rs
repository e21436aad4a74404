use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::{Algorithm2D, BaseMap, DistanceAlg, field_of_view};
use smallvec::SmallVec;
use specs::prelude::*;

use crate::map::{Dungeon, Floor, NEIGHBOURS};

use super::{
    components::{PlayerTag, Position, Viewshed},
    resources::ActiveFloor,
};

/// Recomputes every dirty viewshed on the active floor.
#[derive(Default)]
pub struct FovSystem;

impl<'a> System<'a> for FovSystem {
    type SystemData = (
        ReadExpect<'a, Dungeon>,
        ReadExpect<'a, ActiveFloor>,
        WriteStorage<'a, Viewshed>,
        ReadStorage<'a, Position>,
    );

    fn run(&mut self, (dungeon, active, mut viewsheds, positions): Self::SystemData) {
        let floor = dungeon.floor(active.0);
        let map = FloorFov { floor };
        for (viewshed, pos) in (&mut viewsheds, &positions).join() {
            if !viewshed.dirty || pos.floor != active.0 {
                continue;
            }
            viewshed.visible = field_of_view(pos.point, viewshed.radius, &map)
                .into_iter()
                .filter(|point| floor.in_bounds(*point))
                .collect();
            viewshed.dirty = false;
        }
    }
}

/// Marks whatever the player sees as revealed on the map.
#[derive(Default)]
pub struct RevealSystem;

impl<'a> System<'a> for RevealSystem {
    type SystemData = (
        WriteExpect<'a, Dungeon>,
        ReadExpect<'a, ActiveFloor>,
        ReadStorage<'a, Viewshed>,
        ReadStorage<'a, PlayerTag>,
    );

    fn run(&mut self, (mut dungeon, active, viewsheds, players): Self::SystemData) {
        let floor = dungeon.floor_mut(active.0);
        for (viewshed, _) in (&viewsheds, &players).join() {
            for point in &viewshed.visible {
                floor.reveal_point(*point);
            }
        }
    }
}

struct FloorFov<'a> {
    floor: &'a Floor,
}

impl BaseMap for FloorFov<'_> {
    fn is_opaque(&self, idx: usize) -> bool {
        let point = self.index_to_point2d(idx);
        self.floor.blocks_sight(point)
    }

    fn get_available_exits(&self, idx: usize) -> SmallVec<[(usize, f32); 10]> {
        let mut exits = SmallVec::new();
        let point = self.index_to_point2d(idx);
        for step in NEIGHBOURS {
            let dest = point + step;
            if self.in_bounds(dest) && self.floor.is_walkable(dest) {
                let cost = if step.x != 0 && step.y != 0 { 1.4 } else { 1.0 };
                exits.push((self.point2d_to_index(dest), cost));
            }
        }
        exits
    }

    fn get_pathing_distance(&self, idx1: usize, idx2: usize) -> f32 {
        let p1 = self.index_to_point2d(idx1);
        let p2 = self.index_to_point2d(idx2);
        DistanceAlg::Pythagoras.distance2d(p1, p2)
    }
}

impl Algorithm2D for FloorFov<'_> {
    fn dimensions(&self) -> Point {
        Point::new(self.floor.width, self.floor.height)
    }

    fn in_bounds(&self, point: Point) -> bool {
        self.floor.in_bounds(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{FloorId, Terrain};

    #[test]
    fn walls_hide_what_lies_behind() {
        let mut floor = Floor::open_room(FloorId(0), 15, 15);
        for y in 0..15 {
            floor.set_terrain(Point::new(9, y), Terrain::Wall);
        }
        let map = FloorFov { floor: &floor };
        let seen = field_of_view(Point::new(5, 7), 8, &map);
        assert!(seen.contains(&Point::new(8, 7)));
        assert!(seen.contains(&Point::new(9, 7)));
        assert!(!seen.contains(&Point::new(11, 7)));
    }

    #[test]
    fn closed_doors_block_sight() {
        let mut floor = Floor::open_room(FloorId(0), 15, 15);
        for y in 0..15 {
            floor.set_terrain(Point::new(9, y), Terrain::Wall);
        }
        floor.set_terrain(Point::new(9, 7), Terrain::Door { open: false });
        let map = FloorFov { floor: &floor };
        assert!(!field_of_view(Point::new(8, 7), 6, &map).contains(&Point::new(10, 7)));
        floor.open_door(Point::new(9, 7));
        let map = FloorFov { floor: &floor };
        assert!(field_of_view(Point::new(8, 7), 6, &map).contains(&Point::new(10, 7)));
    }

    #[test]
    fn exits_skip_walls() {
        let floor = Floor::open_room(FloorId(0), 5, 5);
        let map = FloorFov { floor: &floor };
        let corner = map.point2d_to_index(Point::new(1, 1));
        assert_eq!(map.get_available_exits(corner).len(), 3);
    }
}
