//! Player actions other than skills. Each validates first and leaves the
//! world untouched on error.

use bracket_geometry::prelude::Point;
use specs::prelude::{Entity, WorldExt};

use crate::{
    data::items::ItemEffect,
    error::{GameError, GameResult},
    map::{Dungeon, FloorId},
};

use super::{
    EcsWorld,
    components::{ActorState, Item},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Bumped,
    Waited,
}

impl EcsWorld {
    /// Queues a step, or bumps whatever hostile stands in the way. Actors
    /// never trade places.
    pub fn player_step(&mut self, delta: Point) -> GameResult<StepOutcome> {
        if delta == Point::new(0, 0) {
            return Ok(StepOutcome::Waited);
        }
        let target = self.player_point() + delta;
        let floor = self.active_floor();
        if !self.with_dungeon(|d| d.floor(floor).in_bounds(target)) {
            return Err(GameError::OutOfBounds(target));
        }
        if let Some(enemy) = self.hostile_at(target) {
            let player = self.player;
            self.bump(player, enemy);
            return Ok(StepOutcome::Bumped);
        }
        if !self.with_dungeon(|d| d.floor(floor).is_open(target)) {
            return Err(GameError::BlockedDestination(target));
        }
        let player = self.player;
        self.add_pending_move(player, delta);
        Ok(StepOutcome::Moved)
    }

    /// Picks up the first item underfoot and applies it.
    pub fn pickup(&mut self) -> GameResult<()> {
        let pos = self.player_position();
        let item = self
            .items_at(pos.point, pos.floor)
            .into_iter()
            .next()
            .ok_or(GameError::NothingHere("pick up"))?;
        let Some(Item { kind, name }) = self
            .specs_world
            .read_component::<Item>()
            .get(item)
            .cloned()
        else {
            return Err(GameError::NothingHere("pick up"));
        };

        let player = self.player;
        match kind.template().effect {
            ItemEffect::Heal { amount } => self.add_pending_hp(player, amount, None),
            ItemEffect::Restore { amount } => self.add_pending_tp(player, amount),
            ItemEffect::Victory => self.set_state(player, ActorState::Victorious),
        }
        self.log(format!("You pick up the {name}."));
        self.remove_item(item, pos.point, pos.floor);
        Ok(())
    }

    fn remove_item(&mut self, item: Entity, point: Point, floor: FloorId) {
        self.specs_world
            .write_resource::<Dungeon>()
            .floor_mut(floor)
            .unblock(point, item);
        if let Err(err) = self.specs_world.delete_entity(item) {
            log::warn!("could not remove {item:?}: {err}");
        }
    }

    pub fn open_door(&mut self, direction: Point) -> GameResult<()> {
        let target = self.player_point() + direction;
        let floor = self.active_floor();
        if !self.with_dungeon_mut(|d| d.floor_mut(floor).open_door(target)) {
            return Err(GameError::NothingHere("open"));
        }
        self.mark_sight_dirty();
        self.log("The door creaks open.");
        Ok(())
    }

    /// Takes the stairs underfoot. The player's history does not survive
    /// the trip.
    pub fn use_stairs(&mut self) -> GameResult<StairTrip> {
        let pos = self.player_position();
        let (floor, landing) = self
            .with_dungeon(|d| d.stair_destination(pos.floor, pos.point))
            .ok_or(GameError::NothingHere("climb"))?;

        let player = self.player;
        self.relocate_near(player, floor, landing);
        self.set_active_floor(floor);
        self.clear_history(player);
        if floor.0 > pos.floor.0 {
            self.log(format!("You descend to floor {}.", floor.0 + 1));
        } else {
            self.log(format!("You climb back to floor {}.", floor.0 + 1));
        }
        Ok(StairTrip {
            from: pos.floor,
            to: floor,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StairTrip {
    pub from: FloorId,
    pub to: FloorId,
}
