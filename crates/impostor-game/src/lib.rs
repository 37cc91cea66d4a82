//! Game rules for the Impostor word game.
//!
//! Everything here is synchronous and free of I/O, so it can be driven
//! directly from tests:
//!
//! - [`Room`] — the round controller, one per room
//! - [`Roster`] — membership, host, ready flags and scores
//! - [`TurnScheduler`] — who speaks next during the clue phase
//! - [`VoteTally`] — ballots and ejection
//! - [`score_round`] — who earns points for a round
//! - [`Effects`] — what a transition asks the room actor to do
//!
//! ```
//! use impostor_game::{GameConfig, Phase, Room};
//! use impostor_protocol::{PlayerId, RoomId};
//!
//! let mut room = Room::with_seed(RoomId("kitchen".into()), GameConfig::default(), 7);
//! for id in 1..=3 {
//!     room.join(PlayerId(id), None).unwrap();
//! }
//! room.start_game(PlayerId(1)).unwrap();
//! assert_eq!(room.phase(), Phase::Reveal);
//! ```

mod config;
mod effect;
mod error;
mod roster;
mod room;
mod scoring;
mod turns;
mod votes;

pub use config::{DEFAULT_WORDS, GameConfig};
pub use effect::{Effect, Effects, TimerKind, TimerTicket};
pub use error::{ConfigError, GameError};
pub use room::{Phase, Room};
pub use roster::{DEFAULT_NAME, Departure, Player, Roster, sanitize_name};
pub use scoring::{ScoreAward, score_round};
pub use turns::{Clue, TurnScheduler};
pub use votes::{VoteOutcome, VoteTally};
