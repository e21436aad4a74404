use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::GameResult,
    map::{DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH},
    time::MAX_RECORD,
};

/// Tunables for one run. Every field has a default so a config file only
/// needs the values it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub seed: u64,
    pub floors: u32,
    pub map_width: i32,
    pub map_height: i32,
    pub enemies_per_floor: usize,
    pub player_hp: i32,
    pub player_tp: i32,
    pub player_bump_damage: i32,
    pub sight_radius: i32,
    /// Oldest tick a history ring keeps, relative to the newest record.
    pub max_record: u64,
    pub rewind_limit: u64,
    pub rewind_cost: i32,
    /// A d6 roll must exceed this for a bump to land.
    pub hit_threshold: i32,
    /// A d6 roll above this lets the player shrug off a drain.
    pub resist_threshold: i32,
    pub drain_amount: i32,
    pub freeze_turns: u32,
    pub push_range: i32,
    pub push_distance: i32,
    pub teleport_range: i32,
    pub journal_capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x7d21_2020,
            floors: 3,
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
            enemies_per_floor: 6,
            player_hp: 10,
            player_tp: 5,
            player_bump_damage: 1,
            sight_radius: 8,
            max_record: MAX_RECORD,
            rewind_limit: MAX_RECORD,
            rewind_cost: 2,
            hit_threshold: 2,
            resist_threshold: 4,
            drain_amount: 2,
            freeze_turns: 3,
            push_range: 3,
            push_distance: 2,
            teleport_range: 5,
            journal_capacity: 8,
        }
    }
}

impl GameConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> GameResult<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> GameResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config.sanitized())
    }

    /// The preview can never reach further back than the ring remembers.
    pub fn sanitized(mut self) -> Self {
        self.rewind_limit = self.rewind_limit.min(self.max_record);
        self.floors = self.floors.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GameConfig::from_json(r#"{ "seed": 7, "rewind_cost": 3 }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.rewind_cost, 3);
        assert_eq!(config.max_record, GameConfig::default().max_record);
    }

    #[test]
    fn rewind_limit_is_capped_by_history() {
        let config =
            GameConfig::from_json(r#"{ "max_record": 4, "rewind_limit": 12 }"#).unwrap();
        assert_eq!(config.rewind_limit, 4);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(GameConfig::from_json("{ seed: }").is_err());
    }
}
