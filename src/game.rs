//! The scene loop behind the terminal: commands in, one full cycle out.

use bracket_geometry::prelude::Point;
use bracket_random::prelude::RandomNumberGenerator;

use crate::{
    config::GameConfig,
    data::{opening_lines, skills::SkillKind},
    ecs::{EcsWorld, components::ActorState, turn::capitalize},
    error::GameError,
    map::Dungeon,
    time::{
        Clock,
        rewind::{Preview, RewindPhase, RewindResolution, RewindSession},
    },
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Step(i32, i32),
    Wait,
    Rewind,
    RewindBack,
    RewindForward,
    Confirm,
    Cancel,
    Cast(SkillKind, Point),
    Pickup,
    Open(Point),
    UseStairs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Exploring,
    Previewing,
    Dead,
    Victorious,
}

pub struct Game {
    ecs: EcsWorld,
    rewind: Option<RewindSession>,
    preview: Option<Preview>,
    journal: Vec<String>,
    journal_capacity: usize,
}

impl Game {
    pub fn new(config: &GameConfig) -> Self {
        let config = config.clone().sanitized();
        let mut rng = RandomNumberGenerator::seeded(config.seed);
        let dungeon = Dungeon::generate(&config, &mut rng);
        let mut ecs = EcsWorld::new(dungeon, &config);
        ecs.populate(&config);
        ecs.refresh_visibility();
        log::info!("new run with seed {:#x}", config.seed);

        let mut game = Self::from_world(ecs, config.journal_capacity);
        for line in opening_lines().into_iter().rev() {
            game.push_log_entry(line);
        }
        game
    }

    pub fn from_world(ecs: EcsWorld, journal_capacity: usize) -> Self {
        Self {
            ecs,
            rewind: None,
            preview: None,
            journal: Vec::new(),
            journal_capacity: journal_capacity.max(1),
        }
    }

    pub fn world(&self) -> &EcsWorld {
        &self.ecs
    }

    /// Newest entry first.
    pub fn journal(&self) -> &[String] {
        &self.journal
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn rewind_phase(&self) -> RewindPhase {
        self.rewind
            .as_ref()
            .map_or(RewindPhase::Idle, RewindSession::phase)
    }

    pub fn status(&self) -> GameStatus {
        match self.ecs.player_state() {
            ActorState::Dead => GameStatus::Dead,
            ActorState::Victorious => GameStatus::Victorious,
            ActorState::Alive if self.rewind.is_some() => GameStatus::Previewing,
            ActorState::Alive => GameStatus::Exploring,
        }
    }

    /// Applies one command. Returns `true` when it consumed a cycle, i.e.
    /// every enemy acted and the clock advanced.
    pub fn handle(&mut self, command: Command) -> bool {
        if matches!(self.status(), GameStatus::Dead | GameStatus::Victorious) {
            return false;
        }
        if self.rewind.is_some() {
            return self.handle_rewind(command);
        }

        let outcome = match command {
            Command::Step(dx, dy) => self.ecs.player_step(Point::new(dx, dy)).map(|_| ()),
            Command::Wait => Ok(()),
            Command::Cast(skill, direction) => self.ecs.cast(skill, direction),
            Command::Pickup => self.ecs.pickup(),
            Command::Open(direction) => self.ecs.open_door(direction),
            Command::UseStairs => self.ecs.use_stairs().map(|_| ()),
            Command::Rewind => {
                self.begin_rewind();
                return false;
            }
            Command::RewindBack | Command::RewindForward | Command::Confirm | Command::Cancel => {
                return false;
            }
        };

        match outcome {
            Ok(()) => {
                let player = self.ecs.player_entity();
                self.ecs.resolve_turn(player);
                self.end_cycle();
                true
            }
            Err(err) => {
                self.report(&err);
                self.flush_combat_log();
                false
            }
        }
    }

    fn begin_rewind(&mut self) {
        let opened = RewindSession::begin(&mut self.ecs)
            .and_then(|session| Ok((session.preview(&self.ecs)?, session)));
        match opened {
            Ok((preview, session)) => {
                self.preview = Some(preview);
                self.rewind = Some(session);
                self.push_log_entry("Time unspools around you. Choose a moment.");
            }
            Err(err) => self.report(&err),
        }
    }

    /// Only rewind commands mean anything while previewing; the rest of the
    /// world holds still.
    fn handle_rewind(&mut self, command: Command) -> bool {
        match command {
            Command::RewindBack | Command::RewindForward => {
                let Some(session) = self.rewind.as_mut() else {
                    return false;
                };
                let stepped = if command == Command::RewindBack {
                    session.step_back(&self.ecs)
                } else {
                    session.step_forward(&self.ecs)
                };
                match stepped {
                    Ok(preview) => self.preview = Some(preview),
                    Err(err) => log::debug!("preview step refused: {err}"),
                }
                false
            }
            Command::Confirm => {
                let Some(session) = self.rewind.take() else {
                    return false;
                };
                self.preview = None;
                match session.commit(&mut self.ecs) {
                    Ok(RewindResolution::Restored { tick, .. }) => {
                        self.push_log_entry(format!("You return to {}.", Clock::format(tick)));
                        self.end_cycle();
                        true
                    }
                    Ok(RewindResolution::Discarded) => {
                        self.push_log_entry("The present holds.");
                        false
                    }
                    Err(err) => {
                        self.report(&err);
                        false
                    }
                }
            }
            Command::Cancel => {
                if let Some(session) = self.rewind.take() {
                    session.cancel();
                }
                self.preview = None;
                self.push_log_entry("You let the moment pass.");
                false
            }
            _ => false,
        }
    }

    /// Enemies judge sight against where the player is now, so the player's
    /// view is refreshed before they act.
    fn end_cycle(&mut self) {
        self.ecs.refresh_visibility();
        self.ecs.enemy_phase();
        self.ecs.advance_clock();
        self.ecs.refresh_visibility();
        self.flush_combat_log();
    }

    /// Refused actions are journaled, except stepping off the map, which
    /// fails silently.
    fn report(&mut self, err: &GameError) {
        log::debug!("action refused: {err:?}");
        if matches!(err, GameError::OutOfBounds(_)) {
            return;
        }
        self.push_log_entry(format!("{}.", capitalize(&err.to_string())));
    }

    fn flush_combat_log(&mut self) {
        for entry in self.ecs.drain_combat_log() {
            self.push_log_entry(entry);
        }
    }

    fn push_log_entry<S: Into<String>>(&mut self, entry: S) {
        self.journal.insert(0, entry.into());
        self.journal.truncate(self.journal_capacity);
    }

    pub fn time_line(&self) -> String {
        match &self.preview {
            Some(preview) => format!(
                "{}Time: {}{}",
                if preview.left_enabled { "< " } else { "  " },
                Clock::format(preview.tick),
                if preview.right_enabled { " >" } else { "  " },
            ),
            None => format!("Time: {}", Clock::format(self.ecs.now())),
        }
    }

    pub fn hp_line(&self) -> String {
        self.ecs.hp_line()
    }

    pub fn tp_line(&self) -> String {
        self.ecs.tp_line()
    }

    pub fn xp_line(&self) -> String {
        self.ecs.xp_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ai::EnemyMode,
        data::{
            items::ItemKind,
            monsters::{MonsterTemplate, Species},
        },
        map::{Floor, FloorId, Terrain},
        testing::{ARENA_SIZE, arena, arena_with, config, game_in, spawn},
    };

    #[test]
    fn fresh_run_is_exploring() {
        let game = Game::new(&config());
        assert_eq!(game.status(), GameStatus::Exploring);
        assert_eq!(game.world().now(), 0);
        assert_eq!(game.time_line(), "Time: 0:00");
        assert!(!game.journal().is_empty());
    }

    #[test]
    fn same_seed_same_dungeon() {
        let a = Game::new(&config());
        let b = Game::new(&config());
        assert_eq!(a.world().player_point(), b.world().player_point());
        let enemies = |g: &Game| {
            g.world()
                .enemies_on(FloorId(0))
                .into_iter()
                .filter_map(|e| g.world().position(e))
                .map(|p| p.point)
                .collect::<Vec<_>>()
        };
        assert_eq!(enemies(&a), enemies(&b));
    }

    #[test]
    fn waiting_advances_the_clock() {
        let mut game = game_in(arena());
        assert!(game.handle(Command::Wait));
        assert!(game.handle(Command::Wait));
        assert_eq!(game.world().now(), 2);
        assert_eq!(game.time_line(), "Time: 0:02");
    }

    #[test]
    fn walking_into_walls_costs_nothing() {
        let mut game = game_in(arena());
        let origin = game.world().player_point();
        for _ in 0..12 {
            game.handle(Command::Step(0, -1));
        }
        assert_eq!(game.world().player_point().y, 1);
        assert_eq!(game.world().player_point().x, origin.x);
        assert_eq!(game.world().now(), 9);
    }

    #[test]
    fn stepping_off_the_map_is_silent() {
        let mut world = arena();
        let edge = Point::new(0, 10);
        world.with_dungeon_mut(|d| d.floor_mut(FloorId(0)).set_terrain(edge, Terrain::Floor));
        let player = world.player_entity();
        world.relocate(player, edge).unwrap();
        let mut game = game_in(world);

        assert!(!game.handle(Command::Step(-1, 0)));
        assert_eq!(game.world().player_point(), edge);
        assert_eq!(game.world().now(), 0);
        assert!(game.journal().is_empty());
    }

    #[test]
    fn knight_bump_does_not_swap() {
        let mut world = arena_with(|rules| rules.hit_threshold = 0);
        let origin = world.player_point();
        let knight = spawn(&mut world, Species::Knight, origin + Point::new(1, 0));
        let mut game = game_in(world);
        assert!(game.handle(Command::Step(1, 0)));
        let world = game.world();
        assert_eq!(world.player_point(), origin);
        assert_eq!(world.position(knight).unwrap().point, origin + Point::new(1, 0));
        assert_eq!(world.vitals(knight).unwrap().hp, 1);
        assert_eq!(world.player_vitals().hp, 10);
        assert_eq!(world.pending(world.player_entity()).hp, -1);
    }

    #[test]
    fn frozen_enemy_does_not_act() {
        let mut world = arena_with(|rules| rules.hit_threshold = 0);
        world.teach_player(SkillKind::Freeze);
        let origin = world.player_point();
        let sentry = spawn(&mut world, Species::Sentry, origin + Point::new(1, 0));
        world.refresh_visibility();
        let mut game = game_in(world);

        assert!(game.handle(Command::Cast(SkillKind::Freeze, Point::new(1, 0))));
        assert_eq!(game.journal()[0], "The Eternal Sentry is stuck in time.");
        assert_eq!(game.journal()[1], "The Eternal Sentry is frozen in time.");
        assert_eq!(game.world().player_vitals().tp, 4);
        assert_eq!(game.world().player_vitals().hp, 10);
        assert_eq!(game.world().position(sentry).unwrap().point, origin + Point::new(1, 0));

        game.handle(Command::Wait);
        game.handle(Command::Wait);
        assert_eq!(game.world().player_vitals().hp, 10);
        assert_eq!(game.world().frozen_turns(sentry), 0);
        assert_eq!(
            game.journal()[0],
            "The Eternal Sentry slips back into the flow of time."
        );

        game.handle(Command::Wait);
        game.handle(Command::Wait);
        assert_eq!(game.world().player_vitals().hp, 9);
    }

    #[test]
    fn rewind_round_trip_restores_the_past() {
        let mut game = game_in(arena());
        let start = game.world().player_point();
        game.handle(Command::Step(1, 0));
        game.handle(Command::Step(1, 0));
        assert_eq!(game.world().now(), 2);

        assert!(!game.handle(Command::Rewind));
        assert_eq!(game.status(), GameStatus::Previewing);
        assert_eq!(game.rewind_phase(), RewindPhase::Previewing);
        game.handle(Command::RewindBack);
        game.handle(Command::RewindBack);
        assert_eq!(game.preview().unwrap().snapshot.point, start);
        assert_eq!(game.time_line(), "  Time: 0:00 >");

        assert!(game.handle(Command::Confirm));
        assert_eq!(game.status(), GameStatus::Exploring);
        assert_eq!(game.world().player_point(), start);
        assert_eq!(game.world().player_vitals().tp, 3);
        assert_eq!(game.world().now(), 1);
    }

    #[test]
    fn preview_then_cancel_changes_nothing() {
        let mut world = arena();
        let origin = world.player_point();
        spawn(&mut world, Species::Sentry, origin + Point::new(4, 0));
        let mut game = game_in(world);
        game.handle(Command::Step(-1, 0));
        game.handle(Command::Step(-1, 0));
        let before = (
            game.world().player_vitals(),
            game.world().player_point(),
            game.world().now(),
        );

        game.handle(Command::Rewind);
        game.handle(Command::RewindBack);
        assert!(!game.handle(Command::Step(1, 0)));
        assert!(!game.handle(Command::Wait));
        assert!(!game.handle(Command::Cancel));
        let after = (
            game.world().player_vitals(),
            game.world().player_point(),
            game.world().now(),
        );
        assert_eq!(before, after);
        assert_eq!(game.status(), GameStatus::Exploring);
        assert_eq!(game.rewind_phase(), RewindPhase::Idle);
    }

    #[test]
    fn confirming_the_present_is_free() {
        let mut game = game_in(arena());
        game.handle(Command::Wait);
        game.handle(Command::Rewind);
        assert!(!game.handle(Command::Confirm));
        assert_eq!(game.world().player_vitals().tp, 5);
        assert_eq!(game.world().now(), 1);
    }

    #[test]
    fn enemies_hold_still_during_preview() {
        let mut world = arena();
        let origin = world.player_point();
        let sentry = spawn(&mut world, Species::Sentry, origin + Point::new(3, 0));
        let mut game = game_in(world);
        game.handle(Command::Wait);
        let held = game.world().position(sentry).unwrap().point;
        game.handle(Command::Rewind);
        for _ in 0..5 {
            game.handle(Command::RewindBack);
            game.handle(Command::Wait);
        }
        assert_eq!(game.world().position(sentry).unwrap().point, held);
        assert_eq!(game.world().now(), 1);
    }

    #[test]
    fn history_stays_bounded() {
        let mut game = game_in(arena());
        for _ in 0..40 {
            game.handle(Command::Wait);
        }
        let player = game.world().player_entity();
        assert!(game.world().history_len(player) <= 11);
        assert!(game.world().player_snapshot(39).is_ok());
        assert!(game.world().player_snapshot(29).is_ok());
        assert!(game.world().player_snapshot(28).is_err());
    }

    #[test]
    fn full_rewind_window_is_reachable() {
        let mut game = game_in(arena());
        for _ in 0..20 {
            game.handle(Command::Wait);
        }
        game.handle(Command::Rewind);
        for _ in 0..10 {
            game.handle(Command::RewindBack);
        }
        let deepest = *game.preview().unwrap();
        assert_eq!(deepest.tick, 10);
        assert!(!deepest.left_enabled);

        game.handle(Command::RewindBack);
        assert_eq!(game.preview().unwrap().tick, 10);
    }

    #[test]
    fn enemies_judge_sight_from_the_new_floor() {
        let mut top = Floor::open_room(FloorId(0), ARENA_SIZE, ARENA_SIZE);
        let down = Point::new(8, 5);
        top.set_terrain(down, Terrain::StairsDown);
        top.stairs_down = Some(down);

        let mut bottom = Floor::open_room(FloorId(1), ARENA_SIZE, ARENA_SIZE);
        let up = Point::new(4, 4);
        bottom.set_terrain(up, Terrain::StairsUp);
        bottom.stairs_up = Some(up);
        for y in 1..ARENA_SIZE - 1 {
            bottom.set_terrain(Point::new(6, y), Terrain::Wall);
        }

        let mut world = EcsWorld::new(Dungeon::from_floors(vec![top, bottom]), &config());
        let player = world.player_entity();
        world.relocate(player, down).unwrap();
        world.refresh_visibility();
        let lair = Point::new(8, 4);
        assert!(world.player_sees(lair));
        let golem = world.spawn_monster(
            &MonsterTemplate::for_species(Species::Golem),
            lair,
            FloorId(1),
        );

        let mut game = game_in(world);
        assert!(game.handle(Command::UseStairs));
        let world = game.world();
        assert_eq!(world.active_floor(), FloorId(1));
        assert_eq!(world.player_point(), up);
        assert!(!world.player_sees(lair));
        assert_eq!(world.enemy_mode(golem), Some(EnemyMode::Wander));
        assert!(world.position(golem).unwrap().point.x > 6);
    }

    #[test]
    fn killing_a_sentry_pays_out() {
        let mut world = arena_with(|rules| rules.hit_threshold = 0);
        let origin = world.player_point();
        let sentry = spawn(&mut world, Species::Sentry, origin + Point::new(1, 0));
        let mut game = game_in(world);
        game.handle(Command::Step(1, 0));
        game.handle(Command::Step(1, 0));
        assert!(game.world().position(sentry).is_none());
        game.handle(Command::Wait);
        assert_eq!(game.world().progression().xp, 2);
    }

    #[test]
    fn picking_up_the_hourglass_ends_the_run() {
        let mut world = arena();
        let pos = world.player_position();
        world.spawn_item(ItemKind::Hourglass, pos.point, pos.floor);
        let mut game = game_in(world);
        assert!(game.handle(Command::Pickup));
        assert_eq!(game.status(), GameStatus::Victorious);
        assert!(!game.handle(Command::Wait));
    }

    #[test]
    fn failed_actions_are_journaled() {
        let mut game = game_in(arena());
        assert!(!game.handle(Command::Pickup));
        assert_eq!(game.journal()[0], "There is nothing here to pick up.");
        assert!(!game.handle(Command::Cast(SkillKind::Teleport, Point::new(1, 0))));
        assert_eq!(game.journal()[0], "You have not learned Teleport.");
        assert_eq!(game.world().now(), 0);
    }
}
