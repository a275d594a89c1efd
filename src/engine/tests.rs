use super::*;
use crate::world::GRID_WIDTH;

fn running_state() -> GameState {
    let outcome = GameState::new().apply_command(Command::Move(Direction::Left));
    assert_eq!(outcome.state.phase, Phase::Running);
    outcome.state
}

fn place_agent(state: &mut GameState, x: i32, y: i32, dir: Direction) {
    state.agent.pos = Vec2 { x, y };
    state.agent.dir = dir;
    state.agent.requested = None;
}

fn request(dir: Direction) -> TickInput {
    TickInput {
        requested: Some(dir),
    }
}

fn clear_collectibles_except(state: &mut GameState, keep: Vec2) {
    for y in 0..state.grid.height() {
        for x in 0..state.grid.width() {
            if (x, y) != (keep.x, keep.y) && state.grid.cell_kind(x, y).is_collectible() {
                state.grid.set_cell(x, y, CellKind::Empty);
            }
        }
    }
}

fn event_points(events: &[GameEvent]) -> u32 {
    events
        .iter()
        .map(|event| match event {
            GameEvent::ItemConsumed { .. } => ITEM_SCORE,
            GameEvent::PowerItemConsumed { .. } => POWER_ITEM_SCORE,
            GameEvent::AdversaryEliminated { .. } => ELIMINATION_SCORE,
            _ => 0,
        })
        .sum()
}

#[test]
fn new_state_starts_idle_with_three_lives() {
    let state = GameState::new();
    assert_eq!(state.phase, Phase::Idle);
    assert_eq!(state.lives, 3);
    assert_eq!(state.level, 1);
    assert_eq!(state.score, 0);
    assert_eq!(state.ghosts.len(), 4);
    assert!(state.ghosts.iter().all(|ghost| ghost.pos == ghost.home));
    assert_eq!(state.agent.pos, AGENT_START);
}

#[test]
fn first_direction_starts_run_without_buffering_it() {
    let idle = GameState::new();
    assert_eq!(
        idle.apply_command(Command::Move(Direction::None)).state.phase,
        Phase::Idle
    );
    assert_eq!(idle.apply_command(Command::TogglePause).state.phase, Phase::Idle);

    let outcome = idle.apply_command(Command::Move(Direction::Up));
    assert_eq!(outcome.state.phase, Phase::Running);
    assert_eq!(outcome.events, vec![GameEvent::RunStarted]);
    assert_eq!(outcome.state.agent.requested, None);
}

#[test]
fn direction_input_only_buffers_while_running() {
    let running = running_state();
    let buffered = running.apply_command(Command::Move(Direction::Right)).state;
    assert_eq!(buffered.agent.requested, Some(Direction::Right));

    let paused = buffered.apply_command(Command::TogglePause).state;
    assert_eq!(paused.phase, Phase::Paused);
    let ignored = paused.apply_command(Command::Move(Direction::Left)).state;
    assert_eq!(ignored.agent.requested, Some(Direction::Right));

    let resumed = ignored.apply_command(Command::TogglePause).state;
    assert_eq!(resumed.phase, Phase::Running);
}

#[test]
fn step_is_pure_and_frozen_outside_running() {
    let running = running_state();
    let before = running.clone();
    let _ = running.step(&request(Direction::Left));
    assert_eq!(running, before);

    let paused = running.apply_command(Command::TogglePause).state;
    let outcome = paused.step(&request(Direction::Left));
    assert_eq!(outcome.state, paused);
    assert!(outcome.events.is_empty());

    let idle = GameState::new();
    assert_eq!(idle.step(&TickInput::default()).state, idle);
}

#[test]
fn agent_moving_onto_item_scores_ten_and_clears_cell() {
    let state = running_state();
    let outcome = state.step(&request(Direction::Left));
    assert_eq!(outcome.state.agent.pos, Vec2 { x: 8, y: 15 });
    assert_eq!(outcome.state.score, 10);
    assert_eq!(outcome.state.grid.cell_kind(8, 15), CellKind::Empty);
    assert!(outcome
        .events
        .contains(&GameEvent::ItemConsumed { x: 8, y: 15 }));
    assert_eq!(
        outcome.state.grid.remaining_collectibles(),
        state.grid.remaining_collectibles() - 1
    );
}

#[test]
fn stationary_agent_does_not_consume_its_own_cell() {
    let state = running_state();
    assert_eq!(state.grid.cell_kind(9, 15), CellKind::Item);
    let outcome = state.step(&TickInput::default());
    assert_eq!(outcome.state.agent.pos, AGENT_START);
    assert_eq!(outcome.state.score, 0);
    assert_eq!(outcome.state.grid.cell_kind(9, 15), CellKind::Item);
}

#[test]
fn power_item_makes_every_ghost_vulnerable_for_thirty_ticks() {
    let mut state = running_state();
    state.ghosts[0].vulnerable = true;
    state.ghosts[0].vulnerable_ticks = 3;
    place_agent(&mut state, 1, 15, Direction::None);

    let mut events = Vec::new();
    state.consume_item(&mut events);

    assert_eq!(state.score, 50);
    assert!(state.power_mode);
    assert_eq!(state.power_ticks, 30);
    assert_eq!(state.ghosts.len(), 4);
    for ghost in &state.ghosts {
        assert!(ghost.vulnerable);
        assert_eq!(ghost.vulnerable_ticks, 30);
    }
    assert_eq!(state.grid.cell_kind(1, 15), CellKind::Empty);
    assert_eq!(events, vec![GameEvent::PowerItemConsumed { x: 1, y: 15 }]);
}

#[test]
fn power_item_tick_counts_down_both_timers_once() {
    let mut state = running_state();
    place_agent(&mut state, 2, 15, Direction::None);
    let outcome = state.step(&request(Direction::Left));
    let next = outcome.state;

    assert_eq!(next.agent.pos, Vec2 { x: 1, y: 15 });
    assert_eq!(next.score, 50);
    assert!(next.power_mode);
    assert_eq!(next.power_ticks, 29);
    assert!(next
        .ghosts
        .iter()
        .all(|ghost| ghost.vulnerable && ghost.vulnerable_ticks == 29));
    assert!(outcome
        .events
        .contains(&GameEvent::PowerItemConsumed { x: 1, y: 15 }));
}

#[test]
fn buffered_turn_waits_for_an_opening() {
    let mut state = running_state();
    state.ghosts.clear();
    place_agent(&mut state, 2, 1, Direction::Right);

    state = state.step(&request(Direction::Down)).state;
    assert_eq!(state.agent.pos, Vec2 { x: 3, y: 1 });
    assert_eq!(state.agent.dir, Direction::Right);
    assert_eq!(state.agent.requested, Some(Direction::Down));

    state = state.step(&TickInput::default()).state;
    assert_eq!(state.agent.pos, Vec2 { x: 4, y: 1 });
    state = state.step(&TickInput::default()).state;
    assert_eq!(state.agent.pos, Vec2 { x: 5, y: 1 });

    state = state.step(&TickInput::default()).state;
    assert_eq!(state.agent.dir, Direction::Down);
    assert_eq!(state.agent.pos, Vec2 { x: 5, y: 2 });
}

#[test]
fn blocked_agent_stays_put_and_keeps_direction() {
    let mut state = running_state();
    state.ghosts.clear();
    place_agent(&mut state, 1, 1, Direction::Up);
    let next = state.step(&TickInput::default()).state;
    assert_eq!(next.agent.pos, Vec2 { x: 1, y: 1 });
    assert_eq!(next.agent.dir, Direction::Up);
}

#[test]
fn agent_wraps_through_tunnel_row() {
    let mut state = running_state();
    state.ghosts.clear();

    place_agent(&mut state, 0, 9, Direction::Left);
    let next = state.step(&TickInput::default()).state;
    assert_eq!(next.agent.pos, Vec2 { x: GRID_WIDTH - 1, y: 9 });

    place_agent(&mut state, GRID_WIDTH - 1, 9, Direction::Right);
    let next = state.step(&TickInput::default()).state;
    assert_eq!(next.agent.pos, Vec2 { x: 0, y: 9 });

    // Turning into the tunnel is judged on the wrapped cell as well.
    place_agent(&mut state, 0, 9, Direction::None);
    let next = state.step(&request(Direction::Left)).state;
    assert_eq!(next.agent.dir, Direction::Left);
    assert_eq!(next.agent.pos, Vec2 { x: GRID_WIDTH - 1, y: 9 });
}

fn ghost_at(x: i32, y: i32, vulnerable: bool) -> Ghost {
    let mut ghost = Ghost::at_home(1, GhostColor::Red, Vec2 { x: 9, y: 9 });
    ghost.pos = Vec2 { x, y };
    ghost.vulnerable = vulnerable;
    ghost.vulnerable_ticks = if vulnerable { 5 } else { 0 };
    ghost
}

#[test]
fn pursuing_ghost_minimizes_distance() {
    let grid = Grid::initial();
    let ghost = ghost_at(5, 3, false);
    assert_eq!(
        choose_ghost_move(&grid, &ghost, Vec2 { x: 8, y: 3 }),
        Some((Direction::Right, Vec2 { x: 6, y: 3 }))
    );
}

#[test]
fn fleeing_ghost_maximizes_distance() {
    let grid = Grid::initial();
    let ghost = ghost_at(5, 3, true);
    assert_eq!(
        choose_ghost_move(&grid, &ghost, Vec2 { x: 5, y: 0 }),
        Some((Direction::Down, Vec2 { x: 5, y: 4 }))
    );
}

#[test]
fn ghost_ties_prefer_up_down_left_right_order() {
    let grid = Grid::initial();
    let target = Vec2 { x: 5, y: 3 };
    assert_eq!(
        choose_ghost_move(&grid, &ghost_at(5, 3, false), target),
        Some((Direction::Up, Vec2 { x: 5, y: 2 }))
    );
    assert_eq!(
        choose_ghost_move(&grid, &ghost_at(5, 3, true), Vec2 { x: 8, y: 3 }),
        Some((Direction::Up, Vec2 { x: 5, y: 2 }))
    );
}

#[test]
fn enclosed_ghost_stays_in_place() {
    let grid = Grid::initial();
    assert_eq!(
        choose_ghost_move(&grid, &ghost_at(0, 0, false), Vec2 { x: 9, y: 15 }),
        None
    );

    let mut state = running_state();
    state.ghosts = vec![ghost_at(0, 0, false)];
    state.move_ghosts();
    assert_eq!(state.ghosts[0].pos, Vec2 { x: 0, y: 0 });
    assert_eq!(state.ghosts[0].dir, Direction::Up);
}

#[test]
fn ghost_moves_do_not_depend_on_list_order() {
    let mut state = running_state();
    place_agent(&mut state, 9, 15, Direction::None);
    let forward = {
        let mut next = state.clone();
        next.move_ghosts();
        next.ghosts
    };
    let reversed = {
        let mut next = state.clone();
        next.ghosts.reverse();
        next.move_ghosts();
        next.ghosts.reverse();
        next.ghosts
    };
    assert_eq!(forward, reversed);
}

#[test]
fn ghost_wraps_through_tunnel() {
    let grid = Grid::initial();
    let ghost = ghost_at(0, 9, false);
    // Only left (wrapping) and right are open; the target sits just past the edge.
    assert_eq!(
        choose_ghost_move(&grid, &ghost, Vec2 { x: GRID_WIDTH - 1, y: 9 }),
        Some((Direction::Left, Vec2 { x: GRID_WIDTH - 1, y: 9 }))
    );
}

#[test]
fn own_countdown_clears_ghost_before_global_timer() {
    let mut state = running_state();
    state.power_mode = true;
    state.power_ticks = 20;
    state.ghosts[0].vulnerable = true;
    state.ghosts[0].vulnerable_ticks = 1;
    state.ghosts[1].vulnerable = true;
    state.ghosts[1].vulnerable_ticks = 20;

    state.move_ghosts();
    assert!(!state.ghosts[0].vulnerable);
    assert!(state.ghosts[1].vulnerable);
    assert_eq!(state.ghosts[1].vulnerable_ticks, 19);
    assert!(state.power_mode);
}

#[test]
fn global_expiry_clears_all_ghosts() {
    let mut state = running_state();
    state.power_mode = true;
    state.power_ticks = 1;
    for ghost in &mut state.ghosts {
        ghost.vulnerable = true;
        ghost.vulnerable_ticks = 12;
    }
    let mut events = Vec::new();
    state.update_power_mode(&mut events);
    assert!(!state.power_mode);
    assert_eq!(state.power_ticks, 0);
    assert!(state
        .ghosts
        .iter()
        .all(|ghost| !ghost.vulnerable && ghost.vulnerable_ticks == 0));
    assert!(events.is_empty());
}

#[test]
fn power_mode_pulses_every_nine_ticks() {
    let mut state = running_state();
    state.power_mode = true;
    state.power_ticks = 10;
    let mut events = Vec::new();
    state.update_power_mode(&mut events);
    assert_eq!(events, vec![GameEvent::PowerModeTick { remaining: 9 }]);

    events.clear();
    state.update_power_mode(&mut events);
    assert!(events.is_empty());
    assert_eq!(state.power_ticks, 8);
}

#[test]
fn eating_vulnerable_ghost_sends_it_home() {
    let mut state = running_state();
    place_agent(&mut state, 5, 5, Direction::Left);
    state.ghosts[1].pos = Vec2 { x: 5, y: 5 };
    state.ghosts[1].vulnerable = true;
    state.ghosts[1].vulnerable_ticks = 12;
    state.score = 40;

    let mut events = Vec::new();
    state.resolve_collisions(&mut events);

    assert_eq!(state.score, 240);
    assert_eq!(state.ghosts[1].pos, state.ghosts[1].home);
    assert!(!state.ghosts[1].vulnerable);
    assert_eq!(state.ghosts[1].vulnerable_ticks, 0);
    assert_eq!(state.agent.pos, Vec2 { x: 5, y: 5 });
    assert_eq!(state.lives, 3);
    assert_eq!(
        events,
        vec![GameEvent::AdversaryEliminated {
            ghost_id: state.ghosts[1].id
        }]
    );
}

#[test]
fn losing_a_life_resets_only_the_agent() {
    let mut state = running_state();
    place_agent(&mut state, 5, 5, Direction::Left);
    state.agent.requested = Some(Direction::Up);
    state.ghosts[0].pos = Vec2 { x: 5, y: 5 };
    state.ghosts[1].pos = Vec2 { x: 5, y: 5 };
    let ghosts_before = state.ghosts.clone();

    let mut events = Vec::new();
    state.resolve_collisions(&mut events);

    assert_eq!(state.lives, 2);
    assert_eq!(state.phase, Phase::Running);
    assert_eq!(state.agent, Agent::at_start());
    assert_eq!(state.ghosts, ghosts_before);
    assert_eq!(events, vec![GameEvent::LifeLost { lives_left: 2 }]);
}

#[test]
fn last_life_lost_ends_the_run() {
    let mut state = running_state();
    state.lives = 1;
    state.score = 120;
    place_agent(&mut state, 1, 1, Direction::None);
    state.ghosts.truncate(1);
    state.ghosts[0].pos = Vec2 { x: 2, y: 1 };

    let outcome = state.step(&TickInput::default());
    let next = outcome.state;
    assert_eq!(next.ghosts[0].pos, Vec2 { x: 1, y: 1 });
    assert_eq!(next.lives, 0);
    assert_eq!(next.phase, Phase::Lost);
    assert_eq!(next.score, 120);
    assert!(outcome
        .events
        .contains(&GameEvent::RunLost { score: 120, level: 1 }));

    let frozen = next.step(&request(Direction::Right));
    assert_eq!(frozen.state, next);
    assert_eq!(next.apply_command(Command::TogglePause).state, next);
    assert_eq!(next.apply_command(Command::Continue).state, next);
}

#[test]
fn stacked_ghosts_cannot_take_more_than_the_last_life() {
    let mut state = running_state();
    state.lives = 1;
    place_agent(&mut state, 5, 5, Direction::None);
    state.ghosts[0].pos = Vec2 { x: 5, y: 5 };
    state.ghosts[2].pos = Vec2 { x: 5, y: 5 };

    let mut events = Vec::new();
    state.resolve_collisions(&mut events);
    assert_eq!(state.lives, 0);
    assert_eq!(state.phase, Phase::Lost);
    let losses = events
        .iter()
        .filter(|event| matches!(event, GameEvent::LifeLost { .. }))
        .count();
    assert_eq!(losses, 1);
}

#[test]
fn restart_only_from_lost() {
    let running = running_state();
    assert_eq!(running.apply_command(Command::Restart).state, running);

    let mut lost = running.clone();
    lost.phase = Phase::Lost;
    lost.lives = 0;
    lost.score = 900;
    lost.level = 3;
    let restarted = lost.apply_command(Command::Restart).state;
    assert_eq!(restarted, GameState::new());
}

#[test]
fn clearing_last_collectible_advances_level() {
    let mut state = running_state();
    state.lives = 2;
    clear_collectibles_except(&mut state, Vec2 { x: 8, y: 15 });
    assert_eq!(state.grid.remaining_collectibles(), 1);
    state.score = 500;

    let outcome = state.step(&request(Direction::Left));
    let cleared = outcome.state;
    assert_eq!(cleared.phase, Phase::LevelCleared);
    assert_eq!(cleared.level, 2);
    assert_eq!(cleared.score, 510);
    assert_eq!(cleared.grid.remaining_collectibles(), 0);
    assert!(outcome.events.contains(&GameEvent::LevelCleared { level: 2 }));

    assert_eq!(cleared.step(&TickInput::default()).state, cleared);

    let next_level = cleared.apply_command(Command::Continue).state;
    assert_eq!(next_level.phase, Phase::Running);
    assert_eq!(next_level.level, 2);
    assert_eq!(next_level.score, 510);
    assert_eq!(next_level.lives, 2);
    assert_eq!(next_level.grid, Grid::initial());
    assert_eq!(next_level.agent, Agent::at_start());
    assert!(!next_level.power_mode);
    assert!(next_level
        .ghosts
        .iter()
        .all(|ghost| ghost.pos == ghost.home && !ghost.vulnerable));
}

#[test]
fn level_is_not_cleared_while_collectibles_remain() {
    let mut state = running_state();
    clear_collectibles_except(&mut state, Vec2 { x: 1, y: 1 });
    let next = state.step(&request(Direction::Left)).state;
    assert_eq!(next.phase, Phase::Running);
    assert_eq!(next.level, 1);
}

#[test]
fn same_inputs_replay_to_same_states() {
    let script = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];
    let run = || {
        let mut state = running_state();
        let mut trail = Vec::new();
        for tick in 0..200usize {
            let input = if tick % 5 == 0 {
                request(script[(tick / 5) % script.len()])
            } else {
                TickInput::default()
            };
            state = state.step(&input).state;
            trail.push(state.clone());
        }
        trail
    };
    assert_eq!(run(), run());
}

#[test]
fn score_only_moves_by_event_amounts() {
    let script = [
        Direction::Left,
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
        Direction::Up,
    ];
    let mut state = running_state();
    for tick in 0..600usize {
        let input = request(script[(tick / 7) % script.len()]);
        let outcome = state.step(&input);
        assert!(outcome.state.score >= state.score);
        assert_eq!(outcome.state.score - state.score, event_points(&outcome.events));
        assert!(outcome.state.lives <= 3);
        assert!(outcome
            .state
            .grid
            .is_traversable(outcome.state.agent.pos.x, outcome.state.agent.pos.y));
        state = match outcome.state.phase {
            Phase::LevelCleared => outcome.state.apply_command(Command::Continue).state,
            Phase::Lost => break,
            _ => outcome.state,
        };
    }
}

#[test]
fn snapshot_reflects_state() {
    let mut state = running_state();
    state.power_mode = true;
    state.power_ticks = 7;
    state.ghosts[2].vulnerable = true;
    let snapshot = state.build_snapshot(vec![GameEvent::RunStarted]);
    assert_eq!(snapshot.phase, Phase::Running);
    assert_eq!(snapshot.lives, 3);
    assert_eq!(snapshot.power_mode_ticks, 7);
    assert_eq!(snapshot.tiles.len(), state.grid.height() as usize);
    assert_eq!(snapshot.agent.x, AGENT_START.x);
    assert_eq!(snapshot.ghosts.len(), 4);
    assert_eq!(snapshot.ghosts[2].color, GhostColor::Blue);
    assert!(snapshot.ghosts[2].vulnerable);
    assert_eq!(snapshot.events, vec![GameEvent::RunStarted]);

    let json = serde_json::to_value(&snapshot).expect("snapshot serializes");
    assert_eq!(json["phase"], "running");
    assert_eq!(json["powerModeTicks"], 7);
    assert_eq!(json["events"][0]["type"], "run_started");
}
