use crate::map::FloorId;

/// The floor the player is on; only its actors take turns.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveFloor(pub FloorId);

/// Messages produced while resolving a cycle, drained into the journal.
#[derive(Default)]
pub struct CombatLog {
    pub entries: Vec<String>,
}

impl CombatLog {
    pub fn push<S: Into<String>>(&mut self, entry: S) {
        let entry = entry.into();
        log::debug!("{entry}");
        self.entries.push(entry);
    }
}

/// The numeric rules of a run, shared by every system.
#[derive(Clone, Debug)]
pub struct Rules {
    pub max_record: u64,
    pub rewind_limit: u64,
    pub rewind_cost: i32,
    pub hit_threshold: i32,
    pub resist_threshold: i32,
    pub drain_amount: i32,
    pub freeze_turns: u32,
    pub push_range: i32,
    pub push_distance: i32,
    pub teleport_range: i32,
}

impl From<&crate::config::GameConfig> for Rules {
    fn from(config: &crate::config::GameConfig) -> Self {
        Self {
            max_record: config.max_record,
            rewind_limit: config.rewind_limit,
            rewind_cost: config.rewind_cost,
            hit_threshold: config.hit_threshold,
            resist_threshold: config.resist_threshold,
            drain_amount: config.drain_amount,
            freeze_turns: config.freeze_turns,
            push_range: config.push_range,
            push_distance: config.push_distance,
            teleport_range: config.teleport_range,
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::from(&crate::config::GameConfig::default())
    }
}
