mod ai;
mod config;
mod data;
mod ecs;
mod error;
mod game;
mod input;
mod logging;
mod map;
mod render;
mod scripted_input;
#[cfg(test)]
mod testing;
mod time;

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use bracket_geometry::prelude::Point;
use bracket_terminal::prelude::*;
use clap::Parser;

use config::GameConfig;
use game::{Game, GameStatus};
use input::{KeyMapper, KeyPress};
use render::{StatusPanel, draw_banner, draw_entities, draw_log, draw_map, draw_preview};
use scripted_input::ScriptedInput;

const MAP_ORIGIN_X: i32 = 1;
const MAP_ORIGIN_Y: i32 = 6;
const PROMPT_ROW: i32 = 37;
const LOG_PANEL_START: i32 = 39;

/// A turn-based roguelike where you can rewind your own timeline.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Seed for dungeon generation and dice
    #[arg(long)]
    seed: Option<u64>,
    /// JSON file overriding the default tunables
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
    /// Play a key script headlessly and print the journal
    #[arg(long)]
    script: Option<PathBuf>,
    /// Where terminal sessions write their log
    #[arg(long, default_value = "chronotherium.log")]
    log_file: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Scene {
    Title,
    Playing,
    Ended,
}

struct ChronoState {
    config: GameConfig,
    game: Game,
    keys: KeyMapper,
    scene: Scene,
    panel: StatusPanel,
}

impl ChronoState {
    fn new(config: GameConfig) -> Self {
        let game = Game::new(&config);
        Self {
            config,
            game,
            keys: KeyMapper::default(),
            scene: Scene::Title,
            panel: StatusPanel::new(),
        }
    }

    fn restart(&mut self) {
        self.config.seed = self.config.seed.wrapping_add(1);
        self.game = Game::new(&self.config);
        self.keys = KeyMapper::default();
        self.scene = Scene::Playing;
        log::info!("restarted with seed {:#x}", self.config.seed);
    }

    fn handle_input(&mut self, ctx: &mut BTerm) {
        let Some(key) = ctx.key else {
            return;
        };
        let press = KeyPress { key, shift: ctx.shift };
        match self.scene {
            Scene::Title => match key {
                VirtualKeyCode::Escape => ctx.quit(),
                VirtualKeyCode::Return | VirtualKeyCode::Space => self.scene = Scene::Playing,
                _ => {}
            },
            Scene::Playing => {
                let previewing = self.game.status() == GameStatus::Previewing;
                if key == VirtualKeyCode::Escape && !previewing && self.keys.awaiting().is_none() {
                    ctx.quit();
                    return;
                }
                if let Some(command) = self.keys.translate(press, previewing) {
                    self.game.handle(command);
                }
                if matches!(
                    self.game.status(),
                    GameStatus::Dead | GameStatus::Victorious
                ) {
                    self.scene = Scene::Ended;
                }
            }
            Scene::Ended => match key {
                VirtualKeyCode::R => self.restart(),
                VirtualKeyCode::Escape | VirtualKeyCode::Q => ctx.quit(),
                _ => {}
            },
        }
    }

    fn draw_scene(&self, ctx: &mut BTerm) {
        let origin = Point::new(MAP_ORIGIN_X, MAP_ORIGIN_Y);
        match self.scene {
            Scene::Title => draw_banner(
                ctx,
                "CHRONOTHERIUM",
                &[
                    "Descend the Palace of Hours.",
                    "Rewind your own past when the present goes wrong.",
                    "",
                    "[enter] begin   [esc] quit",
                ],
            ),
            Scene::Playing | Scene::Ended => {
                self.panel.draw(ctx, &self.game);
                let world = self.game.world();
                draw_map(ctx, &world.visible_tiles(), origin);
                draw_entities(ctx, &world.visible_entities(), origin);
                if let Some(preview) = self.game.preview() {
                    draw_preview(ctx, preview, origin, PROMPT_ROW);
                } else if let Some(pending) = self.keys.awaiting() {
                    ctx.print_color(
                        2,
                        PROMPT_ROW,
                        RGB::named(YELLOW),
                        RGB::named(BLACK),
                        pending.prompt(),
                    );
                }
                draw_log(ctx, self.game.journal(), LOG_PANEL_START);

                if self.scene == Scene::Ended {
                    let title = match self.game.status() {
                        GameStatus::Victorious => "The golden hourglass is yours",
                        _ => "Lost to the winds of time",
                    };
                    draw_banner(ctx, title, &["[r] try again   [esc] quit"]);
                }
            }
        }
    }
}

impl GameState for ChronoState {
    fn tick(&mut self, ctx: &mut BTerm) {
        self.handle_input(ctx);
        ctx.cls();
        self.draw_scene(ctx);
    }
}

/// Feeds a key script through the same key map the terminal uses and
/// prints the journal, oldest entry first.
fn run_script(config: &GameConfig, path: &Path) -> anyhow::Result<()> {
    let script = ScriptedInput::from_file(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    log::info!("running {} scripted keys", script.len());

    let mut game = Game::new(config);
    let mut keys = KeyMapper::default();
    let mut consumed = 0;
    for press in script {
        let previewing = game.status() == GameStatus::Previewing;
        if let Some(command) = keys.translate(press, previewing) {
            if game.handle(command) {
                consumed += 1;
            }
        }
    }

    for entry in game.journal().iter().rev() {
        println!("{entry}");
    }
    println!("--");
    println!("{}", game.time_line());
    println!("{}", game.hp_line());
    println!("{}", game.tp_line());
    println!("{}", game.xp_line());
    println!("{consumed} cycles, status {:?}", game.status());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => GameConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    if let Some(script) = &args.script {
        logging::init(args.verbose, None);
        return run_script(&config, script);
    }

    logging::init(args.verbose, Some(&args.log_file));
    let context = BTermBuilder::simple80x50()
        .with_title("Chronotherium")
        .build()
        .map_err(|err| anyhow!("could not open terminal: {err}"))?;
    main_loop(context, ChronoState::new(config)).map_err(|err| anyhow!("{err}"))
}
