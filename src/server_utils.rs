use std::path::PathBuf;

const MAX_USER_ID_LEN: usize = 64;
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATS_DB_PATH: &str = ".data/stats.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub stats_db_path: PathBuf,
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let stats_db_path = lookup("STATS_DB_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATS_DB_PATH));
        let static_dir = lookup("STATIC_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        Self {
            port,
            stats_db_path,
            static_dir,
        }
    }
}

/// Accepts ids made of ASCII alphanumerics, `_`, `-` and `.`; anything else means
/// "no user".
pub fn sanitize_user_id(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_USER_ID_LEN {
        return None;
    }
    let valid = trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
    valid.then(|| trimmed.to_string())
}

pub fn parse_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.parse::<usize>().ok())
}
