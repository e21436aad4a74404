use bracket_terminal::prelude::VirtualKeyCode;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use crate::input::KeyPress;

/// Key presses read from a script, one character per key. Lines starting
/// with `#` are comments.
pub struct ScriptedInput {
    script_commands: Vec<KeyPress>,
    current_command_index: usize,
}

impl ScriptedInput {
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut script_commands = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let trimmed_line = line.trim();
            if trimmed_line.is_empty() || trimmed_line.starts_with('#') {
                continue;
            }

            for char_code in trimmed_line.chars() {
                match char_to_keypress(char_code) {
                    Some(press) => script_commands.push(press),
                    None => log::warn!("unknown key in script: {char_code:?}"),
                }
            }
        }

        Ok(Self {
            script_commands,
            current_command_index: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.script_commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script_commands.is_empty()
    }
}

impl Iterator for ScriptedInput {
    type Item = KeyPress;

    fn next(&mut self) -> Option<KeyPress> {
        let press = self.script_commands.get(self.current_command_index).copied()?;
        self.current_command_index += 1;
        Some(press)
    }
}

fn char_to_keypress(c: char) -> Option<KeyPress> {
    let key = match c {
        'h' => VirtualKeyCode::H,
        'j' => VirtualKeyCode::J,
        'k' => VirtualKeyCode::K,
        'l' => VirtualKeyCode::L,
        'y' => VirtualKeyCode::Y,
        'u' => VirtualKeyCode::U,
        'b' => VirtualKeyCode::B,
        'n' => VirtualKeyCode::N,
        '.' => VirtualKeyCode::Period,
        '>' => return Some(KeyPress::shifted(VirtualKeyCode::Period)),
        '<' => return Some(KeyPress::shifted(VirtualKeyCode::Comma)),
        'r' => VirtualKeyCode::R,
        'g' => VirtualKeyCode::G,
        'o' => VirtualKeyCode::O,
        'f' => VirtualKeyCode::F,
        'p' => VirtualKeyCode::P,
        'x' => VirtualKeyCode::X,
        't' => VirtualKeyCode::T,
        '[' => VirtualKeyCode::Left,
        ']' => VirtualKeyCode::Right,
        '=' => VirtualKeyCode::Return,
        '~' | '\x1B' => VirtualKeyCode::Escape,
        _ => return None,
    };
    Some(KeyPress::plain(key))
}
