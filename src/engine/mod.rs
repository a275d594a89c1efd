use crate::constants::{
    ELIMINATION_SCORE, GHOST_COUNT, ITEM_SCORE, POWER_DURATION_TICKS, POWER_ITEM_SCORE,
    POWER_PULSE_INTERVAL_TICKS, START_LEVEL, START_LIVES,
};
use crate::types::{
    AgentView, CellKind, Command, Direction, GameEvent, GhostColor, GhostView, Phase, Snapshot,
    TickInput, Vec2, WorldInit,
};
use crate::world::{to_world_init, Grid, AGENT_START, GHOST_HOMES};

mod interaction_system;
mod movement_system;
mod utils;

#[cfg(test)]
mod tests;

pub use self::movement_system::choose_ghost_move;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    pub pos: Vec2,
    pub dir: Direction,
    /// Standing intent: retried every tick until the turn becomes possible.
    pub requested: Option<Direction>,
}

impl Agent {
    fn at_start() -> Self {
        Self {
            pos: AGENT_START,
            dir: Direction::None,
            requested: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ghost {
    pub id: u8,
    pub color: GhostColor,
    pub home: Vec2,
    pub pos: Vec2,
    pub dir: Direction,
    pub vulnerable: bool,
    pub vulnerable_ticks: u32,
}

impl Ghost {
    fn at_home(id: u8, color: GhostColor, home: Vec2) -> Self {
        Self {
            id,
            color,
            home,
            pos: home,
            dir: Direction::Up,
            vulnerable: false,
            vulnerable_ticks: 0,
        }
    }

    fn clear_vulnerable(&mut self) {
        self.vulnerable = false;
        self.vulnerable_ticks = 0;
    }

    fn view(&self) -> GhostView {
        GhostView {
            id: self.id,
            x: self.pos.x,
            y: self.pos.y,
            dir: self.dir,
            color: self.color,
            vulnerable: self.vulnerable,
            vulnerable_ticks: self.vulnerable_ticks,
        }
    }
}

fn home_ghosts() -> Vec<Ghost> {
    GHOST_HOMES
        .iter()
        .take(GHOST_COUNT)
        .enumerate()
        .map(|(idx, (color, home))| Ghost::at_home(idx as u8 + 1, *color, *home))
        .collect()
}

/// Result of one transition: the next state and the events it produced.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub state: GameState,
    pub events: Vec<GameEvent>,
}

impl StepOutcome {
    fn unchanged(state: &GameState) -> Self {
        Self {
            state: state.clone(),
            events: Vec::new(),
        }
    }
}

/// Complete simulation state. Transitions never mutate `self`; they return a new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub grid: Grid,
    pub agent: Agent,
    pub ghosts: Vec<Ghost>,
    pub score: u32,
    pub lives: u32,
    pub level: u32,
    pub power_mode: bool,
    pub power_ticks: u32,
    pub phase: Phase,
    pub tick: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            grid: Grid::initial(),
            agent: Agent::at_start(),
            ghosts: home_ghosts(),
            score: 0,
            lives: START_LIVES,
            level: START_LEVEL,
            power_mode: false,
            power_ticks: 0,
            phase: Phase::Idle,
            tick: 0,
        }
    }

    pub fn get_world_init(&self) -> WorldInit {
        to_world_init(&self.grid)
    }

    /// Advances one tick. Outside the running phase this is the identity transition.
    pub fn step(&self, input: &TickInput) -> StepOutcome {
        if self.phase != Phase::Running {
            return StepOutcome::unchanged(self);
        }
        let mut next = self.clone();
        let mut events = Vec::new();
        next.tick += 1;

        if let Some(dir) = input.requested.filter(|dir| dir.is_cardinal()) {
            next.agent.requested = Some(dir);
        }

        if next.move_agent() {
            next.consume_item(&mut events);
        }
        next.move_ghosts();
        next.update_power_mode(&mut events);
        next.resolve_collisions(&mut events);
        next.check_level_cleared(&mut events);

        StepOutcome {
            state: next,
            events,
        }
    }

    /// Applies an input-surface command between ticks.
    pub fn apply_command(&self, command: Command) -> StepOutcome {
        match (self.phase, command) {
            (Phase::Idle, Command::Move(dir)) if dir.is_cardinal() => {
                let mut next = self.clone();
                next.phase = Phase::Running;
                StepOutcome {
                    state: next,
                    events: vec![GameEvent::RunStarted],
                }
            }
            (Phase::Running, Command::Move(dir)) if dir.is_cardinal() => {
                let mut next = self.clone();
                next.agent.requested = Some(dir);
                StepOutcome {
                    state: next,
                    events: Vec::new(),
                }
            }
            (Phase::Running, Command::TogglePause) => self.with_phase(Phase::Paused),
            (Phase::Paused, Command::TogglePause) => self.with_phase(Phase::Running),
            (Phase::LevelCleared, Command::Continue) => {
                let mut next = self.clone();
                next.start_next_level();
                StepOutcome {
                    state: next,
                    events: Vec::new(),
                }
            }
            (Phase::Lost, Command::Restart) => StepOutcome {
                state: Self::new(),
                events: Vec::new(),
            },
            _ => StepOutcome::unchanged(self),
        }
    }

    pub fn build_snapshot(&self, events: Vec<GameEvent>) -> Snapshot {
        Snapshot {
            tick: self.tick,
            phase: self.phase,
            score: self.score,
            lives: self.lives,
            level: self.level,
            power_mode_ticks: if self.power_mode { self.power_ticks } else { 0 },
            tiles: self.grid.tiles(),
            agent: AgentView {
                x: self.agent.pos.x,
                y: self.agent.pos.y,
                dir: self.agent.dir,
            },
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
            events,
        }
    }

    fn with_phase(&self, phase: Phase) -> StepOutcome {
        let mut next = self.clone();
        next.phase = phase;
        StepOutcome {
            state: next,
            events: Vec::new(),
        }
    }

    // Level was already incremented by the win check; score and lives carry over.
    fn start_next_level(&mut self) {
        self.grid.reset();
        self.agent = Agent::at_start();
        self.ghosts = home_ghosts();
        self.power_mode = false;
        self.power_ticks = 0;
        self.phase = Phase::Running;
    }
}
