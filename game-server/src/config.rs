use game_types::RoomSettings;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub words_file: Option<PathBuf>,
    pub public_dir: PathBuf,
    pub reveal_delay_ms: u64,
    pub default_rounds: u32,
    pub default_max_players: usize,
    pub room_idle_minutes: u64,
    pub connection_timeout_seconds: u64,
    pub keepalive_url: Option<String>,
    pub keepalive_interval_seconds: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 10000),
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            words_file: optional_env("WORDS_FILE").map(PathBuf::from),
            public_dir: PathBuf::from(
                env::var("PUBLIC_DIR").unwrap_or_else(|_| "./public".to_string()),
            ),
            reveal_delay_ms: parse_env("REVEAL_DELAY_MS", 2500),
            default_rounds: parse_env("DEFAULT_ROUNDS", 3),
            default_max_players: parse_env("DEFAULT_MAX_PLAYERS", 4),
            room_idle_minutes: parse_env("ROOM_IDLE_MINUTES", 60),
            connection_timeout_seconds: parse_env("CONNECTION_TIMEOUT_SECONDS", 300),
            keepalive_url: optional_env("KEEPALIVE_URL"),
            keepalive_interval_seconds: parse_env("KEEPALIVE_INTERVAL_SECONDS", 45),
        }
    }

    pub fn default_room_settings(&self) -> RoomSettings {
        RoomSettings {
            max_players: self.default_max_players,
            rounds: self.default_rounds,
        }
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn room_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.room_idle_minutes.saturating_mul(60))
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_seconds.max(1))
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or_else(|_| {
        warn!("Invalid {}={:?}, using {}", key, raw, default);
        default
    })
}
