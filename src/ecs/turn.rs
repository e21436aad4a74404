//! The per-actor turn: snapshot, apply deferred effects, clear them.

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;
use specs::prelude::{Entity, WorldExt};

use crate::{
    ai::{self, BehaviorContext, Decision},
    data::{
        monsters::DeathRite,
        skills::{level_for_xp, skills_for_level},
    },
    map::Dungeon,
    time::Snapshot,
};

use super::{
    EcsWorld,
    components::{
        ActorState, Brain, Chronicle, Monster, Pending, Position, Progression, Remains,
        Skillbook, Stasis, Vitals,
    },
};

/// What happened while an actor's turn resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub frozen: bool,
    pub moved: bool,
    pub died: bool,
}

impl EcsWorld {
    /// Stores the actor's current hp, tp and position under the current
    /// tick, evicting whatever fell past its ring's horizon.
    pub fn record(&mut self, entity: Entity) {
        let tick = self.now();
        let vitals = self.specs_world.read_component::<Vitals>();
        let positions = self.specs_world.read_component::<Position>();
        let mut chronicles = self.specs_world.write_component::<Chronicle>();
        if let (Some(v), Some(pos), Some(chronicle)) = (
            vitals.get(entity),
            positions.get(entity),
            chronicles.get_mut(entity),
        ) {
            chronicle.0.record(
                tick,
                Snapshot {
                    hp: v.hp,
                    tp: v.tp,
                    point: pos.point,
                },
            );
        }
    }

    /// Runs one turn for `entity`. The snapshot is taken before any pending
    /// effect lands, so rewinding to this tick undoes them.
    pub fn resolve_turn(&mut self, entity: Entity) -> TurnReport {
        let mut report = TurnReport::default();
        self.record(entity);
        self.update_hp(entity);
        self.update_tp(entity);
        self.update_xp(entity);
        if self.thaw(entity) {
            report.frozen = true;
            self.pending_mut(entity, |p| p.pos = Point::new(0, 0));
        } else {
            report.moved = self.update_pos(entity);
        }

        let source = self
            .pending_mut(entity, std::mem::take)
            .and_then(|pending| pending.source);
        if self.state(entity) == ActorState::Dead {
            self.on_death(entity, source);
            report.died = true;
        }
        report
    }

    /// Applies the pending hp delta. A delta that would take hp below zero
    /// is dropped whole; returns `false` in that case.
    pub fn update_hp(&mut self, entity: Entity) -> bool {
        let delta = self
            .pending_mut(entity, |p| std::mem::take(&mut p.hp))
            .unwrap_or(0);
        if delta == 0 {
            return true;
        }
        let applied = self.vitals_mut(entity, |v| {
            if v.hp + delta < 0 {
                return None;
            }
            v.hp = (v.hp + delta).min(v.max_hp);
            Some(v.hp)
        });
        match applied.flatten() {
            Some(0) => {
                self.set_state(entity, ActorState::Dead);
                true
            }
            Some(_) => true,
            None => {
                log::debug!("hp delta {delta} rejected for {entity:?}");
                false
            }
        }
    }

    /// Same rule as [`Self::update_hp`], for time points.
    pub fn update_tp(&mut self, entity: Entity) -> bool {
        let delta = self
            .pending_mut(entity, |p| std::mem::take(&mut p.tp))
            .unwrap_or(0);
        if delta == 0 {
            return true;
        }
        let applied = self
            .vitals_mut(entity, |v| {
                if v.tp + delta < 0 {
                    return false;
                }
                v.tp = (v.tp + delta).min(v.max_tp);
                true
            })
            .unwrap_or(false);
        if !applied {
            log::debug!("tp delta {delta} rejected for {entity:?}");
        }
        applied
    }

    fn update_xp(&mut self, entity: Entity) {
        let delta = self
            .pending_mut(entity, |p| std::mem::take(&mut p.xp))
            .unwrap_or(0);
        if delta == 0 {
            return;
        }

        let reached = {
            let mut progressions = self.specs_world.write_component::<Progression>();
            let Some(progression) = progressions.get_mut(entity) else {
                return;
            };
            progression.xp += delta;
            let level = level_for_xp(progression.xp);
            if level <= progression.level {
                return;
            }
            progression.level = level;
            level
        };

        self.log(format!("You reach level {reached}."));
        let learned: Vec<_> = {
            let mut books = self.specs_world.write_component::<Skillbook>();
            let Some(book) = books.get_mut(entity) else {
                return;
            };
            skills_for_level(reached)
                .filter(|skill| book.learn(*skill))
                .collect()
        };
        for skill in learned {
            let spec = skill.spec();
            self.log(format!(
                "You learn {} ({}): {}",
                spec.name, spec.key, spec.description
            ));
        }
    }

    /// Moves by the pending offset. Blocked or off-grid destinations are
    /// skipped; returns whether the actor moved.
    pub fn update_pos(&mut self, entity: Entity) -> bool {
        let delta = self
            .pending_mut(entity, |p| std::mem::replace(&mut p.pos, Point::new(0, 0)))
            .unwrap_or(Point::new(0, 0));
        if delta == Point::new(0, 0) {
            return false;
        }
        let Some(pos) = self.position(entity) else {
            return false;
        };
        match self.relocate(entity, pos.point + delta) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("{entity:?} stays put: {err}");
                false
            }
        }
    }

    /// Burns one frozen turn. Returns `true` while the actor was frozen
    /// going into this turn.
    fn thaw(&mut self, entity: Entity) -> bool {
        let remaining = {
            let mut stasis = self.specs_world.write_component::<Stasis>();
            match stasis.get_mut(entity) {
                Some(s) if s.turns > 0 => {
                    s.turns -= 1;
                    s.turns
                }
                _ => return false,
            }
        };
        let name = capitalize(&self.name_of(entity));
        if remaining == 0 {
            self.log(format!("{name} slips back into the flow of time."));
        } else {
            self.log(format!("{name} is stuck in time."));
        }
        true
    }

    fn on_death(&mut self, entity: Entity, killer: Option<Entity>) {
        if entity == self.player {
            self.log("You died, lost to the winds of time.");
            return;
        }

        let monster = self
            .specs_world
            .read_component::<Monster>()
            .get(entity)
            .cloned();
        let rite = self
            .specs_world
            .read_component::<Remains>()
            .get(entity)
            .map(|remains| remains.rite);
        let Some(pos) = self.position(entity) else {
            return;
        };
        if let Some(monster) = &monster {
            self.log(format!("The {} shatters.", monster.name));
        }

        if let (Some(killer), Some(monster)) = (killer, &monster) {
            if killer != entity {
                let reward = monster.xp_reward;
                self.pending_mut(killer, |p| p.xp += reward);
            }
        }

        self.specs_world
            .write_resource::<Dungeon>()
            .floor_mut(pos.floor)
            .unblock(pos.point, entity);
        if let Err(err) = self.specs_world.delete_entity(entity) {
            log::warn!("could not remove {entity:?}: {err}");
        }

        if let Some(DeathRite::Drop { item, chance }) = rite {
            let roll = self
                .specs_world
                .write_resource::<RandomNumberGenerator>()
                .range(0, 100);
            if (roll as f32) < chance * 100.0 {
                self.spawn_item(item, pos.point, pos.floor);
                self.log(format!("It leaves behind a {}.", item.template().name));
            }
        }
    }

    /// Lets every enemy on the active floor decide and then resolve its
    /// turn, in spawn order.
    pub fn enemy_phase(&mut self) {
        let floor = self.active_floor();
        for enemy in self.enemies_on(floor) {
            if self.state(enemy) == ActorState::Alive && self.frozen_turns(enemy) == 0 {
                self.act(enemy);
            }
            self.resolve_turn(enemy);
        }
    }

    fn act(&mut self, enemy: Entity) {
        if self.player_state() != ActorState::Alive {
            return;
        }
        let Some(pos) = self.position(enemy) else {
            return;
        };
        let own_tp = self.vitals(enemy).map_or(0, |v| v.tp);
        let ctx = BehaviorContext::new(self.player_point(), self.player_sees(pos.point));
        let decision = {
            let dungeon = self.specs_world.read_resource::<Dungeon>();
            let mut rng = self.specs_world.write_resource::<RandomNumberGenerator>();
            let mut brains = self.specs_world.write_component::<Brain>();
            let Some(brain) = brains.get_mut(enemy) else {
                return;
            };
            ai::decide(
                brain,
                pos.point,
                own_tp,
                &ctx,
                dungeon.floor(pos.floor),
                &mut rng,
            )
        };

        let player = self.player;
        match decision {
            Decision::Wait => {}
            Decision::Bump => {
                self.bump(enemy, player);
            }
            Decision::Step(step) => self.add_pending_move(enemy, step),
            Decision::Drain { cost } => {
                self.sap_player(enemy, cost);
            }
        }
    }

    /// Queues an hp change for the target's next turn.
    pub fn add_pending_hp(&mut self, entity: Entity, delta: i32, source: Option<Entity>) {
        self.pending_mut(entity, |p| {
            p.hp += delta;
            if source.is_some() {
                p.source = source;
            }
        });
    }

    pub fn add_pending_tp(&mut self, entity: Entity, delta: i32) {
        self.pending_mut(entity, |p| p.tp += delta);
    }

    pub fn add_pending_move(&mut self, entity: Entity, delta: Point) {
        self.pending_mut(entity, |p| p.pos = p.pos + delta);
    }

    /// Throws away everything queued for `entity` except xp.
    pub fn discard_pending(&mut self, entity: Entity) {
        self.pending_mut(entity, |p| {
            *p = Pending {
                xp: p.xp,
                ..Pending::default()
            };
        });
    }
}

pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
