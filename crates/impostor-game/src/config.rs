//! Game configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// The vocabulary secret words are drawn from when none is configured.
pub const DEFAULT_WORDS: [&str; 16] = [
    "apple", "ocean", "mountain", "piano", "rocket", "coffee", "forest", "castle", "river",
    "guitar", "banana", "dragon", "island", "mirror", "sunset", "planet",
];

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Rules and timings shared by every room on a server.
///
/// Durations are written as (fractional) seconds in config files:
///
/// ```
/// # use impostor_game::GameConfig;
/// let config: GameConfig = serde_json::from_str(r#"{"turn_timeout": 20, "max_players": 6}"#).unwrap();
/// assert_eq!(config.turn_timeout.as_secs(), 20);
/// assert_eq!(config.max_players, 6);
/// assert_eq!(config.min_players, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Members needed before the host may start a game.
    pub min_players: usize,

    /// Members a room holds at most.
    pub max_players: usize,

    /// Pause between `gameStarted` and the first round.
    #[serde(with = "secs")]
    pub reveal_delay: Duration,

    /// How long a speaker holds the turn before being skipped.
    #[serde(with = "secs")]
    pub turn_timeout: Duration,

    /// How long the vote stays open.
    #[serde(with = "secs")]
    pub vote_timeout: Duration,

    /// Pause after an ejection before the next round starts.
    #[serde(with = "secs")]
    pub results_delay: Duration,

    /// Pause after the deciding ejection before `gameOver` is sent.
    #[serde(with = "secs")]
    pub game_over_delay: Duration,

    /// Display names are cut to this many characters.
    pub max_name_chars: usize,

    /// Clues are cut to this many characters.
    pub max_clue_chars: usize,

    /// Refuse `startGame` until every member is ready.
    pub require_all_ready: bool,

    /// Secret word vocabulary.
    pub words: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: 8,
            reveal_delay: Duration::from_secs(5),
            turn_timeout: Duration::from_secs(45),
            vote_timeout: Duration::from_secs(30),
            results_delay: Duration::from_millis(1500),
            game_over_delay: Duration::from_millis(1200),
            max_name_chars: 32,
            max_clue_chars: 200,
            require_all_ready: false,
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl GameConfig {
    /// Smallest room a game can be played in: one impostor, and enough
    /// others that one ejection does not end the game before it starts.
    pub const MIN_PLAYERS_FLOOR: usize = 3;

    /// Longest accepted delay or timeout.
    pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

    /// Checks the config for combinations no room could play with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < Self::MIN_PLAYERS_FLOOR {
            return Err(ConfigError::MinPlayersTooLow(self.min_players));
        }
        if self.max_players < self.min_players {
            return Err(ConfigError::MaxBelowMin {
                min: self.min_players,
                max: self.max_players,
            });
        }
        if self.words.iter().all(|w| w.trim().is_empty()) {
            return Err(ConfigError::NoWords);
        }
        if self.turn_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("turn_timeout"));
        }
        if self.vote_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("vote_timeout"));
        }
        for (field, value) in [
            ("reveal_delay", self.reveal_delay),
            ("turn_timeout", self.turn_timeout),
            ("vote_timeout", self.vote_timeout),
            ("results_delay", self.results_delay),
            ("game_over_delay", self.game_over_delay),
        ] {
            if value > Self::MAX_DURATION {
                return Err(ConfigError::DurationTooLong {
                    field,
                    max_secs: Self::MAX_DURATION.as_secs(),
                });
            }
        }
        if self.max_name_chars == 0 {
            return Err(ConfigError::ZeroLimit("max_name_chars"));
        }
        Ok(())
    }
}

/// Whole seconds in `duration`, rounded up. Used for announced deadlines.
pub(crate) fn whole_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
