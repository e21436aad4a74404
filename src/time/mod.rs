pub mod history;
pub mod rewind;

pub use history::{HistoryRing, Snapshot};

/// How many ticks back a history ring reaches by default.
pub const MAX_RECORD: u64 = 10;

/// The discrete game clock. One tick is one full turn cycle: the player's
/// action plus every enemy's.
///
/// Each game owns its own clock as a specs resource, so every actor's
/// history is keyed by the same counter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    tick: u64,
}

impl Clock {
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    pub const fn now(&self) -> u64 {
        self.tick
    }

    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Moves the clock backwards. Only a committed rewind does this.
    pub fn restore(&mut self, tick: u64) {
        log::debug!("clock restored from {} to {tick}", self.tick);
        self.tick = tick;
    }

    /// Renders a tick as `M:SS`, one tick per second.
    pub fn format(tick: u64) -> String {
        let elapsed = chrono::Duration::seconds(tick as i64);
        format!(
            "{}:{:02}",
            elapsed.num_minutes(),
            elapsed.num_seconds() % 60
        )
    }
}
