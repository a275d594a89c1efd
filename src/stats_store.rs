use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::session::{ReportSink, SinkError};
use crate::types::SessionReport;

const STORE_VERSION: u8 = 1;
const MAX_STORED_SESSIONS: usize = 5_000;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize stats: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(rename = "totalGamesPlayed")]
    pub total_games_played: u64,
    #[serde(rename = "highestScore")]
    pub highest_score: u32,
    #[serde(rename = "highestLevel")]
    pub highest_level: u32,
    #[serde(rename = "totalItemsEaten")]
    pub total_items_eaten: u64,
    #[serde(rename = "totalGhostsEaten")]
    pub total_ghosts_eaten: u64,
    #[serde(rename = "totalPowerItemsEaten")]
    pub total_power_items_eaten: u64,
    #[serde(rename = "totalPlaytime")]
    pub total_playtime: u64,
    #[serde(rename = "averageScore")]
    pub average_score: f64,
    #[serde(rename = "updatedAtMs")]
    pub updated_at_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub score: u32,
    pub level: u32,
    #[serde(rename = "livesRemaining")]
    pub lives_remaining: u32,
    #[serde(rename = "itemsEaten")]
    pub items_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    #[serde(rename = "powerItemsEaten")]
    pub power_items_eaten: u32,
    #[serde(rename = "gameDuration")]
    pub game_duration: u64,
    #[serde(rename = "completedAtMs")]
    pub completed_at_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub stats: Option<UserStats>,
    #[serde(rename = "recentGames")]
    pub recent_games: Vec<SessionRecord>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardEntry {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "highestScore")]
    pub highest_score: u32,
    #[serde(rename = "highestLevel")]
    pub highest_level: u32,
    #[serde(rename = "totalGamesPlayed")]
    pub total_games_played: u64,
    #[serde(rename = "averageScore")]
    pub average_score: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardResponse {
    #[serde(rename = "generatedAtIso")]
    pub generated_at_iso: String,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Clone, Debug, Serialize)]
struct StatsStoreFile<'a> {
    version: u8,
    users: &'a HashMap<String, UserStats>,
    sessions: &'a [SessionRecord],
}

#[derive(Clone, Debug, Deserialize)]
struct StatsStoreFileRaw {
    version: u8,
    #[serde(default)]
    users: HashMap<String, serde_json::Value>,
    #[serde(default)]
    sessions: Vec<serde_json::Value>,
}

/// JSON file holding every reported session plus per-user aggregates.
pub struct StatsStore {
    file_path: PathBuf,
    users: HashMap<String, UserStats>,
    sessions: Vec<SessionRecord>,
}

impl StatsStore {
    pub fn new(file_path: PathBuf) -> Self {
        let (users, sessions) = load_store(&file_path);
        Self {
            file_path,
            users,
            sessions,
        }
    }

    pub fn record(&mut self, report: &SessionReport) -> Result<(), StoreError> {
        let completed_at_ms = report.completed_at.timestamp_millis().max(0) as u64;
        self.sessions.push(SessionRecord {
            id: format!("session_{}_{}", report.user_id, completed_at_ms),
            user_id: report.user_id.clone(),
            score: report.score,
            level: report.level,
            lives_remaining: report.lives_remaining,
            items_eaten: report.items_consumed,
            ghosts_eaten: report.adversaries_eliminated,
            power_items_eaten: report.power_items_consumed,
            game_duration: report.duration_seconds,
            completed_at_ms,
        });
        if self.sessions.len() > MAX_STORED_SESSIONS {
            let overflow = self.sessions.len() - MAX_STORED_SESSIONS;
            self.sessions.drain(..overflow);
        }

        let current = self
            .users
            .entry(report.user_id.clone())
            .or_insert_with(|| UserStats {
                total_games_played: 0,
                highest_score: 0,
                highest_level: 0,
                total_items_eaten: 0,
                total_ghosts_eaten: 0,
                total_power_items_eaten: 0,
                total_playtime: 0,
                average_score: 0.0,
                updated_at_ms: completed_at_ms,
            });
        let games = current.total_games_played + 1;
        current.average_score = (current.average_score * current.total_games_played as f64
            + report.score as f64)
            / games as f64;
        current.total_games_played = games;
        current.highest_score = current.highest_score.max(report.score);
        current.highest_level = current.highest_level.max(report.level);
        current.total_items_eaten += report.items_consumed as u64;
        current.total_ghosts_eaten += report.adversaries_eliminated as u64;
        current.total_power_items_eaten += report.power_items_consumed as u64;
        current.total_playtime += report.duration_seconds;
        current.updated_at_ms = completed_at_ms;

        self.save()
    }

    pub fn profile(&self, user_id: &str, requested_limit: Option<usize>) -> ProfileResponse {
        let limit = requested_limit.unwrap_or(10).clamp(1, 50);
        let mut recent_games: Vec<SessionRecord> = self
            .sessions
            .iter()
            .filter(|session| session.user_id == user_id)
            .cloned()
            .collect();
        recent_games.sort_by(|a, b| b.completed_at_ms.cmp(&a.completed_at_ms));
        recent_games.truncate(limit);
        ProfileResponse {
            user_id: user_id.to_string(),
            stats: self.users.get(user_id).cloned(),
            recent_games,
        }
    }

    pub fn leaderboard(&self, requested_limit: Option<usize>) -> LeaderboardResponse {
        let limit = requested_limit.unwrap_or(10).clamp(1, 100);
        let mut entries: Vec<LeaderboardEntry> = self
            .users
            .iter()
            .map(|(user_id, stats)| LeaderboardEntry {
                user_id: user_id.clone(),
                highest_score: stats.highest_score,
                highest_level: stats.highest_level,
                total_games_played: stats.total_games_played,
                average_score: stats.average_score,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.highest_score
                .cmp(&a.highest_score)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        entries.truncate(limit);
        LeaderboardResponse {
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            entries,
        }
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let payload = StatsStoreFile {
            version: STORE_VERSION,
            users: &self.users,
            sessions: &self.sessions,
        };
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(&self.file_path, text).map_err(|source| StoreError::Write {
            path: self.file_path.display().to_string(),
            source,
        })
    }
}

impl ReportSink for StatsStore {
    fn submit(&mut self, report: SessionReport) -> Result<(), SinkError> {
        self.record(&report)?;
        Ok(())
    }
}

fn load_store(path: &Path) -> (HashMap<String, UserStats>, Vec<SessionRecord>) {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), %error, "failed to read stats store");
            }
            return (HashMap::new(), Vec::new());
        }
    };
    let parsed = match serde_json::from_str::<StatsStoreFileRaw>(&text) {
        Ok(value) if value.version == STORE_VERSION => value,
        Ok(value) => {
            warn!(path = %path.display(), version = value.version, "unsupported stats store version");
            return (HashMap::new(), Vec::new());
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to parse stats store");
            return (HashMap::new(), Vec::new());
        }
    };

    let mut users = HashMap::new();
    for (user_id, raw_value) in parsed.users {
        match serde_json::from_value::<UserStats>(raw_value) {
            Ok(stats) if stats.average_score.is_finite() && stats.average_score >= 0.0 => {
                users.insert(user_id, stats);
            }
            Ok(_) => warn!(user = %user_id, "dropping user stats with invalid average"),
            Err(error) => warn!(user = %user_id, %error, "failed to parse user stats"),
        }
    }

    let sessions = parsed
        .sessions
        .into_iter()
        .filter_map(|raw_value| match serde_json::from_value::<SessionRecord>(raw_value) {
            Ok(session) => Some(session),
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to parse session record");
                None
            }
        })
        .collect();

    (users, sessions)
}
