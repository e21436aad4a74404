use bracket_geometry::prelude::Point;
use thiserror::Error;

use crate::data::skills::SkillKind;

/// Every way a player action can fail during play.
///
/// None of these are fatal: callers log them to the journal and treat the
/// action as a no-op.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("{x},{y} lies beyond the edge of the floor", x = .0.x, y = .0.y)]
    OutOfBounds(Point),
    #[error("no state recorded for tick {0}")]
    NoHistoryAtTick(u64),
    #[error("not enough time points: {have} of {need}")]
    InsufficientResource { have: i32, need: i32 },
    #[error("{0} has nothing to act on")]
    InvalidTarget(&'static str),
    #[error("{x},{y} is occupied", x = .0.x, y = .0.y)]
    BlockedDestination(Point),
    #[error("you have not learned {}", .0.spec().name)]
    SkillLocked(SkillKind),
    #[error("there is nothing here to {0}")]
    NothingHere(&'static str),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GameResult<T> = Result<T, GameError>;
