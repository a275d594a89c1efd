use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Evaluation order for adversary candidates; earlier entries win ties.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    pub fn is_cardinal(self) -> bool {
        self != Self::None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Empty,
    Wall,
    Item,
    PowerItem,
}

impl CellKind {
    pub fn from_tile(tile: u8) -> Option<Self> {
        match tile {
            b' ' => Some(Self::Empty),
            b'#' => Some(Self::Wall),
            b'.' => Some(Self::Item),
            b'o' => Some(Self::PowerItem),
            _ => None,
        }
    }

    pub fn tile(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Wall => '#',
            Self::Item => '.',
            Self::PowerItem => 'o',
        }
    }

    pub fn is_collectible(self) -> bool {
        matches!(self, Self::Item | Self::PowerItem)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Lost,
    LevelCleared,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostColor {
    Red,
    Pink,
    Blue,
    Orange,
}

/// Discrete inputs accepted by the state machine between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    TogglePause,
    Continue,
    Restart,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickInput {
    pub requested: Option<Direction>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AgentView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: u8,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub color: GhostColor,
    pub vulnerable: bool,
    #[serde(rename = "vulnerableTicks")]
    pub vulnerable_ticks: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct WorldInit {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
    #[serde(rename = "tickRate")]
    pub tick_rate: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    RunStarted,
    ItemConsumed {
        x: i32,
        y: i32,
    },
    PowerItemConsumed {
        x: i32,
        y: i32,
    },
    AdversaryEliminated {
        #[serde(rename = "ghostId")]
        ghost_id: u8,
    },
    LifeLost {
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    LevelCleared {
        level: u32,
    },
    PowerModeTick {
        remaining: u32,
    },
    RunLost {
        score: u32,
        level: u32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: Phase,
    pub score: u32,
    pub lives: u32,
    pub level: u32,
    #[serde(rename = "powerModeTicks")]
    pub power_mode_ticks: u32,
    pub tiles: Vec<String>,
    pub agent: AgentView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<GameEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub score: u32,
    pub level: u32,
    #[serde(rename = "livesRemaining")]
    pub lives_remaining: u32,
    #[serde(rename = "itemsConsumed")]
    pub items_consumed: u32,
    #[serde(rename = "adversariesEliminated")]
    pub adversaries_eliminated: u32,
    #[serde(rename = "powerItemsConsumed")]
    pub power_items_consumed: u32,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: u64,
    #[serde(rename = "completedAt")]
    pub completed_at: DateTime<Utc>,
}
