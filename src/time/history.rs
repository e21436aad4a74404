use std::collections::BTreeMap;

use bracket_geometry::prelude::Point;

use crate::error::{GameError, GameResult};

/// An actor's hp, tp and position at one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub hp: i32,
    pub tp: i32,
    pub point: Point,
}

/// Bounded per-actor history keyed by clock tick.
///
/// Recording at tick `t` evicts the entry at `t - horizon - 1`, so ticks
/// `t - horizon ..= t` stay reachable and the ring holds at most
/// `horizon + 1` entries once the clock only moves forward.
#[derive(Clone, Debug)]
pub struct HistoryRing {
    horizon: u64,
    entries: BTreeMap<u64, Snapshot>,
}

impl HistoryRing {
    pub fn new(horizon: u64) -> Self {
        Self {
            horizon,
            entries: BTreeMap::new(),
        }
    }

    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    pub fn record(&mut self, tick: u64, snapshot: Snapshot) {
        self.entries.insert(tick, snapshot);
        if let Some(stale) = tick.checked_sub(self.horizon + 1) {
            self.entries.remove(&stale);
        }
    }

    pub fn snapshot_at(&self, tick: u64) -> GameResult<Snapshot> {
        self.entries
            .get(&tick)
            .copied()
            .ok_or(GameError::NoHistoryAtTick(tick))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Forgets everything recorded after `tick`.
    pub fn truncate_after(&mut self, tick: u64) {
        let _abandoned = self.entries.split_off(&(tick + 1));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn oldest(&self) -> Option<u64> {
        self.entries.keys().next().copied()
    }

    pub fn newest(&self) -> Option<u64> {
        self.entries.keys().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snap(hp: i32) -> Snapshot {
        Snapshot {
            hp,
            tp: 0,
            point: Point::new(hp, 0),
        }
    }

    #[test]
    fn missing_tick_is_not_found() {
        let mut ring = HistoryRing::new(10);
        ring.record(3, snap(3));
        assert!(matches!(
            ring.snapshot_at(4),
            Err(GameError::NoHistoryAtTick(4))
        ));
        assert_eq!(ring.snapshot_at(3).unwrap(), snap(3));
    }

    #[test]
    fn same_tick_overwrites() {
        let mut ring = HistoryRing::new(10);
        ring.record(5, snap(1));
        ring.record(5, snap(2));
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.snapshot_at(5).unwrap().hp, 2);
    }

    #[test]
    fn truncate_drops_future_entries() {
        let mut ring = HistoryRing::new(10);
        for tick in 0..8 {
            ring.record(tick, snap(tick as i32));
        }
        ring.truncate_after(4);
        assert_eq!(ring.newest(), Some(4));
        assert!(ring.snapshot_at(5).is_err());
        assert!(ring.snapshot_at(4).is_ok());
    }

    #[test]
    fn clear_empties_ring() {
        let mut ring = HistoryRing::new(10);
        ring.record(0, snap(0));
        ring.clear();
        assert!(ring.is_empty());
    }

    #[test]
    fn full_horizon_stays_reachable() {
        let mut ring = HistoryRing::new(10);
        for tick in 0..=20 {
            ring.record(tick, snap(tick as i32));
        }
        assert_eq!(ring.len(), 11);
        assert_eq!(ring.oldest(), Some(10));
        assert!(ring.snapshot_at(10).is_ok());
        assert!(ring.snapshot_at(9).is_err());
    }

    proptest! {
        #[test]
        fn ring_never_exceeds_horizon(horizon in 1u64..16, turns in 0u64..64) {
            let mut ring = HistoryRing::new(horizon);
            for tick in 0..turns {
                ring.record(tick, snap(tick as i32));
                prop_assert!(ring.len() as u64 <= horizon + 1);
            }
        }

        #[test]
        fn only_recent_ticks_survive(horizon in 1u64..16, extra in 1u64..32) {
            let mut ring = HistoryRing::new(horizon);
            let now = horizon + extra;
            for tick in 0..=now {
                ring.record(tick, snap(tick as i32));
            }
            for tick in 0..=now {
                let reachable = ring.snapshot_at(tick).is_ok();
                prop_assert_eq!(reachable, tick >= now - horizon);
            }
        }
    }
}
