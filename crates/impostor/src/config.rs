//! Server configuration: a JSON file plus environment overrides.
//!
//! Resolution order, later wins:
//!
//! 1. [`ServerConfig::default`]
//! 2. the JSON file named by `IMPOSTOR_CONFIG`, if set
//! 3. `IMPOSTOR_BIND`, then `PORT` (replaces only the port)
//! 4. `IMPOSTOR_REVEAL_SECONDS`, `IMPOSTOR_TURN_SECONDS`,
//!    `IMPOSTOR_VOTE_SECONDS`, `IMPOSTOR_MIN_PLAYERS`, `IMPOSTOR_MAX_PLAYERS`
//!
//! The result is validated before it is returned.

use std::str::FromStr;
use std::time::Duration;

use impostor_game::GameConfig;
use serde::{Deserialize, Serialize};

use crate::ImpostorError;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Everything needed to start a server.
///
/// ```rust
/// use impostor::ServerConfig;
///
/// let config: ServerConfig =
///     serde_json::from_str(r#"{"bind": "127.0.0.1:9000", "game": {"max_players": 6}}"#).unwrap();
/// assert_eq!(config.game.max_players, 6);
/// assert_eq!(config.game.min_players, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind: String,
    /// Rules and timings shared by every room.
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ImpostorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through `lookup`, which stands in for the
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ImpostorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("IMPOSTOR_CONFIG") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(bind) = lookup("IMPOSTOR_BIND") {
            config.bind = bind;
        }
        if let Some(port) = parsed::<u16>(&lookup, "PORT")? {
            let host = config
                .bind
                .rsplit_once(':')
                .map_or(config.bind.as_str(), |(host, _)| host);
            config.bind = format!("{host}:{port}");
        }

        let game = &mut config.game;
        if let Some(delay) = seconds(&lookup, "IMPOSTOR_REVEAL_SECONDS")? {
            game.reveal_delay = delay;
        }
        if let Some(timeout) = seconds(&lookup, "IMPOSTOR_TURN_SECONDS")? {
            game.turn_timeout = timeout;
        }
        if let Some(timeout) = seconds(&lookup, "IMPOSTOR_VOTE_SECONDS")? {
            game.vote_timeout = timeout;
        }
        if let Some(min) = parsed(&lookup, "IMPOSTOR_MIN_PLAYERS")? {
            game.min_players = min;
        }
        if let Some(max) = parsed(&lookup, "IMPOSTOR_MAX_PLAYERS")? {
            game.max_players = max;
        }

        config.game.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &str) -> Result<Self, ImpostorError> {
        let text = std::fs::read_to_string(path).map_err(|source| ImpostorError::ConfigFile {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ImpostorError::ConfigParse {
            path: path.to_string(),
            source,
        })
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ImpostorError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ImpostorError::InvalidSetting { key, value }),
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<Duration>, ImpostorError> {
    let Some(secs) = parsed::<f64>(lookup, key)? else {
        return Ok(None);
    };
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|_| ImpostorError::InvalidSetting {
            key,
            value: secs.to_string(),
        })
}
