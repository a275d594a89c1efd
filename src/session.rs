use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::engine::{GameState, StepOutcome};
use crate::stats_store::StoreError;
use crate::types::{Command, GameEvent, Phase, SessionReport, Snapshot, TickInput};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("report queue is full")]
    Full,
    #[error("report queue is closed")]
    Closed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Receives end-of-run statistics. Implementations must not block the caller.
pub trait ReportSink: Send {
    fn submit(&mut self, report: SessionReport) -> Result<(), SinkError>;
}

/// Hands reports to a background writer through a bounded queue.
pub struct ChannelSink {
    tx: mpsc::Sender<SessionReport>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<SessionReport>) -> Self {
        Self { tx }
    }
}

impl ReportSink for ChannelSink {
    fn submit(&mut self, report: SessionReport) -> Result<(), SinkError> {
        self.tx.try_send(report).map_err(|error| match error {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub items_consumed: u32,
    pub power_items_consumed: u32,
    pub adversaries_eliminated: u32,
}

impl RunStats {
    pub fn observe(&mut self, event: &GameEvent) {
        match event {
            GameEvent::ItemConsumed { .. } => self.items_consumed += 1,
            GameEvent::PowerItemConsumed { .. } => self.power_items_consumed += 1,
            GameEvent::AdversaryEliminated { .. } => self.adversaries_eliminated += 1,
            _ => {}
        }
    }
}

/// Owns one player's run: the current state, the statistics accumulator and the
/// reporting boundary.
pub struct GameSession {
    state: GameState,
    stats: RunStats,
    run_started_at: DateTime<Utc>,
    run_active: bool,
    user_id: Option<String>,
    sink: Option<Box<dyn ReportSink>>,
    pending_events: Vec<GameEvent>,
}

impl GameSession {
    pub fn new(user_id: Option<String>, sink: Option<Box<dyn ReportSink>>) -> Self {
        Self {
            state: GameState::new(),
            stats: RunStats::default(),
            run_started_at: Utc::now(),
            run_active: false,
            user_id,
            sink,
            pending_events: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn command(&mut self, command: Command) -> Phase {
        let restarting = command == Command::Restart && self.state.phase == Phase::Lost;
        let outcome = self.state.apply_command(command);
        if restarting {
            self.stats = RunStats::default();
            self.run_started_at = Utc::now();
            self.run_active = false;
        }
        self.absorb(outcome);
        self.state.phase
    }

    pub fn tick(&mut self) -> Phase {
        let outcome = self.state.step(&TickInput::default());
        self.absorb(outcome);
        self.state.phase
    }

    /// Explicit stop: flushes a run that started but has not been reported yet.
    pub fn stop(&mut self) {
        if self.run_active {
            self.flush();
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let events = if include_events {
            std::mem::take(&mut self.pending_events)
        } else {
            Vec::new()
        };
        self.state.build_snapshot(events)
    }

    pub fn build_report(&self, user_id: &str, now: DateTime<Utc>) -> SessionReport {
        SessionReport {
            user_id: user_id.to_string(),
            score: self.state.score,
            level: self.state.level,
            lives_remaining: self.state.lives,
            items_consumed: self.stats.items_consumed,
            adversaries_eliminated: self.stats.adversaries_eliminated,
            power_items_consumed: self.stats.power_items_consumed,
            duration_seconds: (now - self.run_started_at).num_seconds().max(0) as u64,
            completed_at: now,
        }
    }

    fn absorb(&mut self, outcome: StepOutcome) {
        let StepOutcome { state, events } = outcome;
        self.state = state;
        for event in &events {
            self.stats.observe(event);
            if *event == GameEvent::RunStarted {
                self.run_started_at = Utc::now();
                self.run_active = true;
                info!(user = ?self.user_id, "run started");
            }
        }
        let lost = events
            .iter()
            .any(|event| matches!(event, GameEvent::RunLost { .. }));
        self.pending_events.extend(events);
        if lost && self.run_active {
            info!(
                user = ?self.user_id,
                score = self.state.score,
                level = self.state.level,
                "run lost"
            );
            self.flush();
        }
    }

    fn flush(&mut self) {
        self.run_active = false;
        let Some(user_id) = self
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            debug!("no user context; skipping session report");
            return;
        };
        let report = self.build_report(user_id, Utc::now());
        let Some(sink) = self.sink.as_mut() else {
            debug!(user = user_id, "no report sink attached");
            return;
        };
        if let Err(error) = sink.submit(report) {
            warn!(user = user_id, %error, "failed to submit session report");
        }
    }
}
