use super::*;

impl GameState {
    pub(super) fn consume_item(&mut self, events: &mut Vec<GameEvent>) {
        let Vec2 { x, y } = self.agent.pos;
        match self.grid.cell_kind(x, y) {
            CellKind::Item => {
                self.grid.clear_cell(x, y);
                self.score += ITEM_SCORE;
                events.push(GameEvent::ItemConsumed { x, y });
            }
            CellKind::PowerItem => {
                self.grid.clear_cell(x, y);
                self.score += POWER_ITEM_SCORE;
                self.activate_power_mode();
                events.push(GameEvent::PowerItemConsumed { x, y });
            }
            CellKind::Empty | CellKind::Wall => {}
        }
    }

    fn activate_power_mode(&mut self) {
        self.power_mode = true;
        self.power_ticks = POWER_DURATION_TICKS;
        for ghost in &mut self.ghosts {
            ghost.vulnerable = true;
            ghost.vulnerable_ticks = POWER_DURATION_TICKS;
        }
    }

    /// Global expiry clears every ghost, whatever its own countdown says.
    pub(super) fn update_power_mode(&mut self, events: &mut Vec<GameEvent>) {
        if !self.power_mode || self.power_ticks == 0 {
            return;
        }
        self.power_ticks -= 1;
        if self.power_ticks == 0 {
            self.power_mode = false;
            for ghost in &mut self.ghosts {
                ghost.clear_vulnerable();
            }
        } else if self.power_ticks % POWER_PULSE_INTERVAL_TICKS == 0 {
            events.push(GameEvent::PowerModeTick {
                remaining: self.power_ticks,
            });
        }
    }

    pub(super) fn resolve_collisions(&mut self, events: &mut Vec<GameEvent>) {
        for idx in 0..self.ghosts.len() {
            if self.phase == Phase::Lost {
                break;
            }
            if self.ghosts[idx].pos != self.agent.pos {
                continue;
            }

            if self.ghosts[idx].vulnerable {
                self.score += ELIMINATION_SCORE;
                let ghost = &mut self.ghosts[idx];
                ghost.pos = ghost.home;
                ghost.clear_vulnerable();
                events.push(GameEvent::AdversaryEliminated { ghost_id: ghost.id });
                continue;
            }

            self.lives = self.lives.saturating_sub(1);
            events.push(GameEvent::LifeLost {
                lives_left: self.lives,
            });
            if self.lives == 0 {
                self.phase = Phase::Lost;
                events.push(GameEvent::RunLost {
                    score: self.score,
                    level: self.level,
                });
            } else {
                self.agent = Agent::at_start();
            }
        }
    }

    pub(super) fn check_level_cleared(&mut self, events: &mut Vec<GameEvent>) {
        if self.phase != Phase::Running || self.grid.remaining_collectibles() > 0 {
            return;
        }
        self.phase = Phase::LevelCleared;
        self.level += 1;
        events.push(GameEvent::LevelCleared { level: self.level });
    }
}
