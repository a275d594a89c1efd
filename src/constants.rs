pub const TICK_RATE: u32 = 3;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

// All countdowns below are measured in ticks at TICK_RATE.
pub const POWER_DURATION_TICKS: u32 = 30;
pub const POWER_PULSE_INTERVAL_TICKS: u32 = 9;

pub const ITEM_SCORE: u32 = 10;
pub const POWER_ITEM_SCORE: u32 = 50;
pub const ELIMINATION_SCORE: u32 = 200;

pub const START_LIVES: u32 = 3;
pub const START_LEVEL: u32 = 1;

pub const GHOST_COUNT: usize = 4;
