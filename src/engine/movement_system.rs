use super::utils::{manhattan, neighbor};
use super::*;

impl GameState {
    /// Try-turn, then try-advance. Returns whether the agent changed cells.
    pub(super) fn move_agent(&mut self) -> bool {
        if let Some(requested) = self.agent.requested {
            let turn_to = neighbor(&self.grid, self.agent.pos, requested);
            if self.grid.is_traversable(turn_to.x, turn_to.y) {
                self.agent.dir = requested;
            }
        }

        if !self.agent.dir.is_cardinal() {
            return false;
        }
        let target = neighbor(&self.grid, self.agent.pos, self.agent.dir);
        if !self.grid.is_traversable(target.x, target.y) {
            return false;
        }
        self.agent.pos = target;
        true
    }

    /// Every decision reads the same pre-move ghost list; results are committed together.
    pub(super) fn move_ghosts(&mut self) {
        let target = self.agent.pos;
        let decisions: Vec<Option<(Direction, Vec2)>> = self
            .ghosts
            .iter()
            .map(|ghost| choose_ghost_move(&self.grid, ghost, target))
            .collect();

        for (ghost, decision) in self.ghosts.iter_mut().zip(decisions) {
            if let Some((dir, pos)) = decision {
                ghost.dir = dir;
                ghost.pos = pos;
            }
            if ghost.vulnerable {
                ghost.vulnerable_ticks = ghost.vulnerable_ticks.saturating_sub(1);
                if ghost.vulnerable_ticks == 0 {
                    ghost.vulnerable = false;
                }
            }
        }
    }
}

/// Greedy one-step choice: pursue the target, or flee it while vulnerable.
/// `None` when every neighbouring cell is blocked. Ties keep the earlier
/// direction in up, down, left, right order.
pub fn choose_ghost_move(grid: &Grid, ghost: &Ghost, target: Vec2) -> Option<(Direction, Vec2)> {
    let mut best: Option<(Direction, Vec2, i32)> = None;
    for dir in Direction::CARDINALS {
        let pos = neighbor(grid, ghost.pos, dir);
        if !grid.is_traversable(pos.x, pos.y) {
            continue;
        }
        let distance = manhattan(pos.x, pos.y, target.x, target.y);
        let better = match best {
            None => true,
            Some((_, _, best_distance)) if ghost.vulnerable => distance > best_distance,
            Some((_, _, best_distance)) => distance < best_distance,
        };
        if better {
            best = Some((dir, pos, distance));
        }
    }
    best.map(|(dir, pos, _)| (dir, pos))
}
