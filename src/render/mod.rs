use bracket_geometry::prelude::Point;
use bracket_terminal::prelude::*;

use crate::{
    ecs::{EntityView, TileView},
    game::Game,
    time::rewind::Preview,
};

/// The boxed panel above the map: vitals, clock and floor.
pub struct StatusPanel;

impl StatusPanel {
    pub const fn new() -> Self {
        Self
    }

    pub fn draw(&self, ctx: &mut BTerm, game: &Game) {
        let (width, _) = ctx.get_char_size();
        ctx.draw_box(0, 0, width - 1, 5, RGB::named(GRAY), RGB::named(BLACK));

        let floor = game.world().active_floor();
        ctx.print_color(
            2,
            1,
            RGB::named(WHITE),
            RGB::named(BLACK),
            format!("Palace of Hours, floor {}", floor.0 + 1),
        );
        let time_color = if game.preview().is_some() {
            RGB::named(GOLD)
        } else {
            RGB::named(LIGHT_BLUE)
        };
        ctx.print_color(40, 1, time_color, RGB::named(BLACK), game.time_line());
        ctx.print_color(2, 2, RGB::from_u8(220, 50, 47), RGB::named(BLACK), game.hp_line());
        ctx.print_color(2, 3, RGB::from_u8(108, 113, 196), RGB::named(BLACK), game.tp_line());
        ctx.print_color(2, 4, RGB::named(LIGHT_GREEN), RGB::named(BLACK), game.xp_line());
    }
}

pub fn draw_log(ctx: &mut BTerm, log: &[String], start_y: i32) {
    let (width, height) = ctx.get_char_size();
    let rows = (height as i32 - start_y - 3).max(1) as usize;
    let top = (start_y - 1).max(0);
    ctx.draw_box(
        0,
        top,
        width - 1,
        rows as i32 + 2,
        RGB::named(DARK_GRAY),
        RGB::named(BLACK),
    );
    ctx.print_color(2, top + 1, RGB::named(WHITE), RGB::named(BLACK), "Journal");
    for (row, entry) in log.iter().take(rows).enumerate() {
        let fg = if row == 0 {
            RGB::named(WHITE)
        } else {
            RGB::named(GRAY)
        };
        ctx.print_color(2, top + 2 + row as i32, fg, RGB::named(BLACK), entry);
    }
}

/// Tiles in view in full colour, remembered ones dimmed, everything else
/// left black.
pub fn draw_map(ctx: &mut BTerm, tiles: &[TileView], origin: Point) {
    for tile in tiles {
        let fg = if tile.visible {
            tile.fg
        } else {
            RGB::named(DARK_GRAY)
        };
        ctx.set(
            origin.x + tile.point.x,
            origin.y + tile.point.y,
            fg,
            RGB::named(BLACK),
            tile.glyph,
        );
    }
}

pub fn draw_entities(ctx: &mut BTerm, entities: &[EntityView], origin: Point) {
    for view in entities {
        ctx.set(
            origin.x + view.point.x,
            origin.y + view.point.y,
            view.color,
            RGB::named(BLACK),
            view.glyph,
        );
    }
}

/// The player's past self at the previewed tick, plus what it would
/// restore.
pub fn draw_preview(ctx: &mut BTerm, preview: &Preview, origin: Point, row: i32) {
    let point = preview.snapshot.point;
    ctx.set(
        origin.x + point.x,
        origin.y + point.y,
        RGB::named(GOLD),
        RGB::named(MIDNIGHT_BLUE),
        to_cp437('@'),
    );
    ctx.print_color(
        2,
        row,
        RGB::named(GOLD),
        RGB::named(BLACK),
        format!(
            "Rewind: {} hp at {},{}  [left/right] choose  [enter] commit  [esc] cancel",
            preview.snapshot.hp, point.x, point.y
        ),
    );
}

/// A centred box with a title and a few lines, for the title, death and
/// victory screens.
pub fn draw_banner(ctx: &mut BTerm, title: &str, lines: &[&str]) {
    let (width, height) = ctx.get_char_size();
    let inner = lines
        .iter()
        .map(|line| line.len())
        .chain(std::iter::once(title.len()))
        .max()
        .unwrap_or(0) as i32
        + 4;
    let box_h = lines.len() as i32 + 3;
    let x = (width as i32 - inner) / 2;
    let y = (height as i32 - box_h) / 2;
    ctx.draw_box(x, y, inner, box_h, RGB::named(GOLD), RGB::named(BLACK));
    ctx.print_color_centered(y + 1, RGB::named(YELLOW), RGB::named(BLACK), title);
    for (row, line) in lines.iter().enumerate() {
        ctx.print_color_centered(
            y + 2 + row as i32,
            RGB::named(WHITE),
            RGB::named(BLACK),
            line,
        );
    }
}
