use bracket_geometry::prelude::{Point, line2d_bresenham};
use specs::prelude::{Entity, WorldExt};

use crate::{
    data::skills::SkillKind,
    error::{GameError, GameResult},
    map::{DIAGONALS, Dungeon},
};

use super::{EcsWorld, components::Stasis, resources::Rules, turn::capitalize};

/// Clamps an arbitrary offset to one of the eight compass steps.
pub fn unit(direction: Point) -> Point {
    Point::new(direction.x.signum(), direction.y.signum())
}

impl EcsWorld {
    /// Casts a player skill. Nothing is spent unless every check passes:
    /// the skill must be known, affordable and have something to act on.
    /// Costs and effects land immediately, bypassing the deferred channel.
    pub fn cast(&mut self, skill: SkillKind, direction: Point) -> GameResult<()> {
        if !self.player_knows(skill) {
            return Err(GameError::SkillLocked(skill));
        }
        let spec = skill.spec();
        let tp = self.player_vitals().tp;
        if tp < spec.cost {
            return Err(GameError::InsufficientResource {
                have: tp,
                need: spec.cost,
            });
        }
        let direction = unit(direction);
        if skill.is_directed() && direction == Point::new(0, 0) {
            return Err(GameError::InvalidTarget(spec.name));
        }

        let rules = (*self.specs_world.read_resource::<Rules>()).clone();
        match skill {
            SkillKind::Rewind => Err(GameError::InvalidTarget(spec.name)),
            SkillKind::Freeze => self.freeze(direction, &rules),
            SkillKind::Push => self.push(direction, &rules),
            SkillKind::DiagonalBurst => self.diagonal_burst(),
            SkillKind::Teleport => self.teleport(direction, &rules),
        }
    }

    fn spend(&mut self, skill: SkillKind) {
        let player = self.player;
        self.add_pending_tp(player, -skill.spec().cost);
        self.update_tp(player);
    }

    fn strike(&mut self, target: Entity, damage: i32) {
        let player = self.player;
        self.add_pending_hp(target, -damage, Some(player));
        self.update_hp(target);
    }

    fn freeze(&mut self, direction: Point, rules: &Rules) -> GameResult<()> {
        let target = self.player_point() + direction;
        let enemy = self
            .hostile_at(target)
            .ok_or(GameError::InvalidTarget("Freeze"))?;
        self.spend(SkillKind::Freeze);
        {
            let mut stasis = self.specs_world.write_component::<Stasis>();
            if let Some(s) = stasis.get_mut(enemy) {
                s.turns = rules.freeze_turns;
            }
        }
        self.log(format!(
            "{} is frozen in time.",
            capitalize(&self.name_of(enemy))
        ));
        Ok(())
    }

    /// Hits the first enemy along the line and shoves it away, stopping
    /// short of walls and other actors.
    fn push(&mut self, direction: Point, rules: &Rules) -> GameResult<()> {
        let origin = self.player_point();
        let floor = self.active_floor();
        let mut enemy = None;
        for point in ray(origin, direction, rules.push_range) {
            if let Some(found) = self.hostile_at(point) {
                enemy = Some((found, point));
                break;
            }
            if !self.with_dungeon(|d| d.floor(floor).is_walkable(point)) {
                break;
            }
        }
        let (enemy, at) = enemy.ok_or(GameError::InvalidTarget("Push"))?;

        self.spend(SkillKind::Push);
        self.strike(enemy, SkillKind::Push.spec().damage);
        let landing = {
            let dungeon = self.specs_world.read_resource::<Dungeon>();
            let floor = dungeon.floor(floor);
            (1..=rules.push_distance)
                .map(|step| at + direction * step)
                .take_while(|point| floor.is_open(*point))
                .last()
        };
        let name = capitalize(&self.name_of(enemy));
        match landing {
            Some(point) => {
                self.add_pending_move(enemy, point - at);
                self.update_pos(enemy);
                self.log(format!("{name} is hurled backwards."));
            }
            None => self.log(format!("{name} staggers but holds its ground.")),
        }
        Ok(())
    }

    fn diagonal_burst(&mut self) -> GameResult<()> {
        let origin = self.player_point();
        let targets: Vec<Entity> = DIAGONALS
            .iter()
            .filter_map(|step| self.hostile_at(origin + *step))
            .collect();
        if targets.is_empty() {
            return Err(GameError::InvalidTarget("Diagonal Burst"));
        }

        self.spend(SkillKind::DiagonalBurst);
        let damage = SkillKind::DiagonalBurst.spec().damage;
        for target in targets {
            self.strike(target, damage);
            self.log(format!(
                "The burst tears through {}.",
                self.name_of(target)
            ));
        }
        Ok(())
    }

    /// Jumps to the farthest open cell along the line, never through walls.
    fn teleport(&mut self, direction: Point, rules: &Rules) -> GameResult<()> {
        let origin = self.player_point();
        let floor = self.active_floor();
        let dest = self.with_dungeon(|dungeon| {
            let floor = dungeon.floor(floor);
            ray(origin, direction, rules.teleport_range)
                .take_while(|point| floor.is_walkable(*point))
                .filter(|point| floor.is_open(*point))
                .last()
        });
        let dest = dest.ok_or(GameError::InvalidTarget("Teleport"))?;

        self.spend(SkillKind::Teleport);
        let player = self.player;
        self.add_pending_move(player, dest - origin);
        self.update_pos(player);
        self.log("You blink through the seconds between.");
        Ok(())
    }
}

/// Cells from `origin` towards `direction`, up to `range` steps, excluding
/// `origin` itself.
fn ray(origin: Point, direction: Point, range: i32) -> impl Iterator<Item = Point> {
    line2d_bresenham(origin, origin + direction * range)
        .into_iter()
        .filter(move |point| *point != origin)
}
