use bracket_geometry::prelude::Point;
use bracket_terminal::prelude::VirtualKeyCode;

use crate::{data::skills::SkillKind, game::Command};

/// A key as the game sees it, with the shift state for `<` and `>`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub key: VirtualKeyCode,
    pub shift: bool,
}

impl KeyPress {
    pub const fn plain(key: VirtualKeyCode) -> Self {
        Self { key, shift: false }
    }

    pub const fn shifted(key: VirtualKeyCode) -> Self {
        Self { key, shift: true }
    }
}

/// A command that still needs a direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Directed {
    Cast(SkillKind),
    Open,
}

impl Directed {
    pub fn prompt(self) -> String {
        match self {
            Directed::Cast(skill) => format!("{} in which direction?", skill.spec().name),
            Directed::Open => "Open in which direction?".to_string(),
        }
    }

    fn complete(self, direction: Point) -> Command {
        match self {
            Directed::Cast(skill) => Command::Cast(skill, direction),
            Directed::Open => Command::Open(direction),
        }
    }
}

/// Turns key presses into commands. Directed skills take two presses, so
/// the mapper remembers what is waiting for a direction.
#[derive(Debug, Default)]
pub struct KeyMapper {
    awaiting: Option<Directed>,
}

impl KeyMapper {
    pub fn awaiting(&self) -> Option<Directed> {
        self.awaiting
    }

    pub fn translate(&mut self, press: KeyPress, previewing: bool) -> Option<Command> {
        if previewing {
            self.awaiting = None;
            return rewind_key(press.key);
        }
        if let Some(pending) = self.awaiting.take() {
            return direction(press.key).map(|dir| pending.complete(dir));
        }

        if let Some(dir) = direction(press.key) {
            return Some(Command::Step(dir.x, dir.y));
        }
        match press.key {
            VirtualKeyCode::Period | VirtualKeyCode::Comma if press.shift => {
                Some(Command::UseStairs)
            }
            VirtualKeyCode::Period | VirtualKeyCode::Numpad5 | VirtualKeyCode::Space => {
                Some(Command::Wait)
            }
            VirtualKeyCode::R => Some(Command::Rewind),
            VirtualKeyCode::G => Some(Command::Pickup),
            VirtualKeyCode::O => {
                self.awaiting = Some(Directed::Open);
                None
            }
            VirtualKeyCode::X => Some(Command::Cast(SkillKind::DiagonalBurst, Point::new(0, 0))),
            VirtualKeyCode::F => self.prompt(SkillKind::Freeze),
            VirtualKeyCode::P => self.prompt(SkillKind::Push),
            VirtualKeyCode::T => self.prompt(SkillKind::Teleport),
            _ => None,
        }
    }

    fn prompt(&mut self, skill: SkillKind) -> Option<Command> {
        self.awaiting = Some(Directed::Cast(skill));
        None
    }
}

fn rewind_key(key: VirtualKeyCode) -> Option<Command> {
    match key {
        VirtualKeyCode::Left | VirtualKeyCode::H | VirtualKeyCode::Numpad4 => {
            Some(Command::RewindBack)
        }
        VirtualKeyCode::Right | VirtualKeyCode::L | VirtualKeyCode::Numpad6 => {
            Some(Command::RewindForward)
        }
        VirtualKeyCode::Return => Some(Command::Confirm),
        VirtualKeyCode::Escape | VirtualKeyCode::R => Some(Command::Cancel),
        _ => None,
    }
}

/// Numpad, vi keys and arrows.
fn direction(key: VirtualKeyCode) -> Option<Point> {
    let (dx, dy) = match key {
        VirtualKeyCode::Left | VirtualKeyCode::H | VirtualKeyCode::Numpad4 => (-1, 0),
        VirtualKeyCode::Right | VirtualKeyCode::L | VirtualKeyCode::Numpad6 => (1, 0),
        VirtualKeyCode::Up | VirtualKeyCode::K | VirtualKeyCode::Numpad8 => (0, -1),
        VirtualKeyCode::Down | VirtualKeyCode::J | VirtualKeyCode::Numpad2 => (0, 1),
        VirtualKeyCode::Y | VirtualKeyCode::Numpad7 => (-1, -1),
        VirtualKeyCode::U | VirtualKeyCode::Numpad9 => (1, -1),
        VirtualKeyCode::B | VirtualKeyCode::Numpad1 => (-1, 1),
        VirtualKeyCode::N | VirtualKeyCode::Numpad3 => (1, 1),
        _ => return None,
    };
    Some(Point::new(dx, dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(VirtualKeyCode::H, Command::Step(-1, 0))]
    #[case(VirtualKeyCode::Numpad9, Command::Step(1, -1))]
    #[case(VirtualKeyCode::Period, Command::Wait)]
    #[case(VirtualKeyCode::G, Command::Pickup)]
    #[case(VirtualKeyCode::R, Command::Rewind)]
    fn single_keys(#[case] key: VirtualKeyCode, #[case] expected: Command) {
        let mut mapper = KeyMapper::default();
        assert_eq!(mapper.translate(KeyPress::plain(key), false), Some(expected));
    }

    #[test]
    fn shifted_period_takes_stairs() {
        let mut mapper = KeyMapper::default();
        let press = KeyPress::shifted(VirtualKeyCode::Period);
        assert_eq!(mapper.translate(press, false), Some(Command::UseStairs));
    }

    #[test]
    fn directed_skill_waits_for_direction() {
        let mut mapper = KeyMapper::default();
        assert_eq!(mapper.translate(KeyPress::plain(VirtualKeyCode::F), false), None);
        assert_eq!(mapper.awaiting(), Some(Directed::Cast(SkillKind::Freeze)));
        assert_eq!(
            mapper.translate(KeyPress::plain(VirtualKeyCode::L), false),
            Some(Command::Cast(SkillKind::Freeze, Point::new(1, 0)))
        );
        assert_eq!(mapper.awaiting(), None);
    }

    #[test]
    fn non_direction_abandons_prompt() {
        let mut mapper = KeyMapper::default();
        mapper.translate(KeyPress::plain(VirtualKeyCode::O), false);
        assert_eq!(mapper.translate(KeyPress::plain(VirtualKeyCode::G), false), None);
        assert_eq!(mapper.awaiting(), None);
    }

    #[rstest]
    #[case(VirtualKeyCode::Left, Some(Command::RewindBack))]
    #[case(VirtualKeyCode::L, Some(Command::RewindForward))]
    #[case(VirtualKeyCode::Return, Some(Command::Confirm))]
    #[case(VirtualKeyCode::Escape, Some(Command::Cancel))]
    #[case(VirtualKeyCode::G, None)]
    fn preview_keys(#[case] key: VirtualKeyCode, #[case] expected: Option<Command>) {
        let mut mapper = KeyMapper::default();
        assert_eq!(mapper.translate(KeyPress::plain(key), true), expected);
    }
}
