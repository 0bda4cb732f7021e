use crate::game::constants::{
    BOT_INTERVAL_MS, GRID_SIZE, MAX_ROOM_ID_ATTEMPTS, ROOM_LIMIT, STEP_INTERVAL_MS,
};
use anyhow::bail;
use rand::distributions::{Alphanumeric, DistString};
use std::env;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8787;
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub grid_size: i32,
    pub room_limit: usize,
    pub step_interval: Duration,
    pub bot_interval: Duration,
    pub max_room_id_attempts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            room_limit: ROOM_LIMIT,
            step_interval: Duration::from_millis(STEP_INTERVAL_MS),
            bot_interval: Duration::from_millis(BOT_INTERVAL_MS),
            max_room_id_attempts: MAX_ROOM_ID_ATTEMPTS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.grid_size < 2 {
            bail!("grid size must be at least 2, got {}", self.grid_size);
        }
        if self.room_limit < 2 {
            bail!("room limit must leave space for the creator and the companion");
        }
        let cells = (self.grid_size as usize) * (self.grid_size as usize);
        if self.room_limit >= cells {
            bail!(
                "room limit {} must be below the {} cells of the grid",
                self.room_limit,
                cells
            );
        }
        if self.step_interval.is_zero() || self.bot_interval.is_zero() {
            bail!("step and bot intervals must be positive");
        }
        if self.max_room_id_attempts == 0 {
            bail!("room id generation needs at least one attempt");
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub engine: EngineConfig,
    pub session_secret: String,
    pub session_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let parsed = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = EngineConfig::default();

        let engine = EngineConfig {
            grid_size: parsed("GRID_SIZE")
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.grid_size),
            room_limit: parsed("ROOM_LIMIT")
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.room_limit),
            step_interval: parsed("STEP_INTERVAL_MS")
                .and_then(|value| value.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.step_interval),
            bot_interval: parsed("BOT_INTERVAL_MS")
                .and_then(|value| value.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.bot_interval),
            max_room_id_attempts: parsed("ROOM_ID_ATTEMPTS")
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.max_room_id_attempts),
        };
        engine.validate()?;

        let port = parsed("PORT")
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let session_ttl = parsed("SESSION_TTL_SECS")
            .and_then(|value| value.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_SESSION_TTL_SECS));
        let session_secret = match parsed("SESSION_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("SESSION_SECRET not set, tokens will not survive a restart");
                Alphanumeric.sample_string(&mut rand::thread_rng(), 48)
            }
        };

        Ok(Self {
            port,
            engine,
            session_secret,
            session_ttl,
        })
    }
}
