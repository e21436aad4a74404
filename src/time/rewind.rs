//! The player's rewind: a modal preview over their own history that either
//! commits to a past tick or is abandoned.

use bracket_geometry::prelude::Point;

use crate::{
    data::skills::SkillKind,
    ecs::EcsWorld,
    error::{GameError, GameResult},
};

use super::Snapshot;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum RewindPhase {
    #[default]
    Idle,
    Previewing,
    Committed,
    Cancelled,
}

/// What the player is looking at while choosing a tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Preview {
    pub tick: u64,
    pub snapshot: Snapshot,
    pub left_enabled: bool,
    pub right_enabled: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RewindResolution {
    /// The world went back to `tick`. `displaced_to` is set when the old
    /// cell was taken and the player landed elsewhere.
    Restored {
        tick: u64,
        displaced_to: Option<Point>,
    },
    /// Committed on the present tick; nothing happened.
    Discarded,
}

#[derive(Debug)]
pub struct RewindSession {
    now: u64,
    horizon: u64,
    cursor: u64,
    phase: RewindPhase,
}

impl RewindSession {
    /// Opens a preview on the present tick. Recording the player's current
    /// state first makes the present reachable from the preview.
    pub fn begin(world: &mut EcsWorld) -> GameResult<Self> {
        if !world.player_knows(SkillKind::Rewind) {
            return Err(GameError::SkillLocked(SkillKind::Rewind));
        }
        let rules = world.rules();
        let tp = world.player_vitals().tp;
        if tp < rules.rewind_cost {
            return Err(GameError::InsufficientResource {
                have: tp,
                need: rules.rewind_cost,
            });
        }

        let player = world.player_entity();
        world.record(player);
        let now = world.now();
        Ok(Self {
            now,
            horizon: now.saturating_sub(rules.rewind_limit),
            cursor: now,
            phase: RewindPhase::Previewing,
        })
    }

    pub fn phase(&self) -> RewindPhase {
        self.phase
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn preview(&self, world: &EcsWorld) -> GameResult<Preview> {
        let snapshot = world.player_snapshot(self.cursor)?;
        Ok(self.preview_of(snapshot))
    }

    fn preview_of(&self, snapshot: Snapshot) -> Preview {
        Preview {
            tick: self.cursor,
            snapshot,
            left_enabled: self.cursor > self.horizon,
            right_enabled: self.cursor < self.now,
        }
    }

    /// Moves the cursor one tick into the past. The cursor stays put when
    /// that tick is beyond the horizon or was never recorded.
    pub fn step_back(&mut self, world: &EcsWorld) -> GameResult<Preview> {
        if self.cursor <= self.horizon {
            return Err(GameError::NoHistoryAtTick(self.cursor.saturating_sub(1)));
        }
        self.step_to(world, self.cursor - 1)
    }

    pub fn step_forward(&mut self, world: &EcsWorld) -> GameResult<Preview> {
        if self.cursor >= self.now {
            return Err(GameError::NoHistoryAtTick(self.cursor + 1));
        }
        self.step_to(world, self.cursor + 1)
    }

    fn step_to(&mut self, world: &EcsWorld, tick: u64) -> GameResult<Preview> {
        let snapshot = world.player_snapshot(tick)?;
        self.cursor = tick;
        Ok(self.preview_of(snapshot))
    }

    /// Sends the world back to the cursor's tick. Only hp and position come
    /// back; time points are what the rewind costs.
    pub fn commit(mut self, world: &mut EcsWorld) -> GameResult<RewindResolution> {
        if self.cursor == self.now {
            self.phase = RewindPhase::Cancelled;
            return Ok(RewindResolution::Discarded);
        }
        let snapshot = world.player_snapshot(self.cursor)?;
        let cost = world.rules().rewind_cost;
        let tp = world.player_vitals().tp;
        if tp < cost {
            return Err(GameError::InsufficientResource {
                have: tp,
                need: cost,
            });
        }

        let player = world.player_entity();
        world.add_pending_tp(player, -cost);
        world.update_tp(player);
        world.restore_clock(self.cursor);
        world.truncate_histories(self.cursor);
        world.discard_pending(player);
        world.vitals_mut(player, |v| v.hp = snapshot.hp.min(v.max_hp));

        let floor = world.player_position().floor;
        let landing = world.relocate_near(player, floor, snapshot.point);
        let displaced_to = (landing != snapshot.point).then_some(landing);
        if let Some(point) = displaced_to {
            world.log(format!(
                "Your old place is taken; you reappear at {},{}.",
                point.x, point.y
            ));
        }
        world.resolve_turn(player);
        self.phase = RewindPhase::Committed;
        log::info!("rewound from {} to {}", self.now, self.cursor);
        Ok(RewindResolution::Restored {
            tick: self.cursor,
            displaced_to,
        })
    }

    pub fn cancel(mut self) -> RewindPhase {
        self.phase = RewindPhase::Cancelled;
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::monsters::Species,
        testing::{arena, spawn},
    };

    /// Walks the player east `steps` times, one cycle each.
    fn walk(world: &mut EcsWorld, steps: usize) {
        let player = world.player_entity();
        for _ in 0..steps {
            world.player_step(Point::new(1, 0)).unwrap();
            world.resolve_turn(player);
            world.advance_clock();
        }
    }

    #[test]
    fn locked_or_unaffordable_rewind_never_opens() {
        let mut world = arena();
        let player = world.player_entity();
        world.vitals_mut(player, |v| v.tp = 1);
        assert!(matches!(
            RewindSession::begin(&mut world),
            Err(GameError::InsufficientResource { have: 1, need: 2 })
        ));
    }

    #[test]
    fn cursor_moves_within_recorded_ticks() {
        let mut world = arena();
        walk(&mut world, 3);
        let mut session = RewindSession::begin(&mut world).unwrap();
        assert_eq!(session.cursor(), 3);

        let preview = session.step_back(&world).unwrap();
        assert_eq!(preview.tick, 2);
        assert!(preview.left_enabled);
        assert!(preview.right_enabled);

        session.step_back(&world).unwrap();
        let oldest = session.step_back(&world).unwrap();
        assert_eq!(oldest.tick, 0);
        assert!(session.step_back(&world).is_err());
        assert_eq!(session.cursor(), 0);

        let forward = session.step_forward(&world).unwrap();
        assert_eq!(forward.tick, 1);
    }

    #[test]
    fn cursor_stops_at_present() {
        let mut world = arena();
        walk(&mut world, 1);
        let mut session = RewindSession::begin(&mut world).unwrap();
        let preview = session.preview(&world).unwrap();
        assert!(!preview.right_enabled);
        assert!(matches!(
            session.step_forward(&world),
            Err(GameError::NoHistoryAtTick(2))
        ));
    }

    #[test]
    fn unrecorded_tick_keeps_cursor() {
        let mut world = arena();
        walk(&mut world, 2);
        let player = world.player_entity();
        world.clear_history(player);
        let mut session = RewindSession::begin(&mut world).unwrap();
        assert!(session.step_back(&world).is_err());
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn commit_at_present_is_identity() {
        let mut world = arena();
        walk(&mut world, 2);
        let before = (world.player_vitals(), world.player_point(), world.now());
        let session = RewindSession::begin(&mut world).unwrap();
        let outcome = session.commit(&mut world).unwrap();
        assert_eq!(outcome, RewindResolution::Discarded);
        assert_eq!(
            (world.player_vitals(), world.player_point(), world.now()),
            before
        );
    }

    #[test]
    fn commit_restores_hp_and_position_but_charges_tp() {
        let mut world = arena();
        let start = world.player_point();
        let player = world.player_entity();
        walk(&mut world, 2);
        world.add_pending_hp(player, -4, None);
        world.resolve_turn(player);
        world.advance_clock();

        let mut session = RewindSession::begin(&mut world).unwrap();
        for _ in 0..3 {
            session.step_back(&world).unwrap();
        }
        let outcome = session.commit(&mut world).unwrap();
        assert_eq!(
            outcome,
            RewindResolution::Restored {
                tick: 0,
                displaced_to: None
            }
        );
        assert_eq!(world.player_point(), start);
        assert_eq!(world.player_vitals().hp, 10);
        assert_eq!(world.player_vitals().tp, 3);
        assert_eq!(world.now(), 0);
        assert_eq!(world.player_snapshot(0).unwrap().tp, 3);
        assert!(world.player_snapshot(1).is_err());
    }

    #[test]
    fn occupied_past_displaces_to_nearest_open_cell() {
        let mut world = arena();
        let start = world.player_point();
        walk(&mut world, 1);
        spawn(&mut world, Species::Knight, start);

        let mut session = RewindSession::begin(&mut world).unwrap();
        session.step_back(&world).unwrap();
        world.drain_combat_log();
        let outcome = session.commit(&mut world).unwrap();
        let RewindResolution::Restored {
            displaced_to: Some(landing),
            ..
        } = outcome
        else {
            panic!("expected displacement, got {outcome:?}");
        };
        assert_ne!(landing, start);
        assert_eq!(world.player_point(), landing);
        let dx = (landing.x - start.x).abs();
        let dy = (landing.y - start.y).abs();
        assert_eq!(dx.max(dy), 1);
        let notice = format!(
            "Your old place is taken; you reappear at {},{}.",
            landing.x, landing.y
        );
        assert!(world.drain_combat_log().contains(&notice));
    }

    #[test]
    fn free_past_lands_without_notice() {
        let mut world = arena();
        walk(&mut world, 1);
        let mut session = RewindSession::begin(&mut world).unwrap();
        session.step_back(&world).unwrap();
        world.drain_combat_log();
        session.commit(&mut world).unwrap();
        assert!(
            world
                .drain_combat_log()
                .iter()
                .all(|entry| !entry.starts_with("Your old place is taken"))
        );
    }

    #[test]
    fn cancel_changes_nothing() {
        let mut world = arena();
        walk(&mut world, 3);
        let before = (world.player_vitals(), world.player_point(), world.now());
        let mut session = RewindSession::begin(&mut world).unwrap();
        session.step_back(&world).unwrap();
        assert_eq!(session.cancel(), RewindPhase::Cancelled);
        assert_eq!(
            (world.player_vitals(), world.player_point(), world.now()),
            before
        );
    }
}
