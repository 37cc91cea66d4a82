//! Error types for the game core.

use impostor_protocol::{ErrorKind, PlayerId};

use crate::Phase;

/// Why a command was refused. A refused command never changes the room.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The command is not valid in the room's current phase.
    #[error("cannot {action} during {phase}")]
    WrongPhase { action: &'static str, phase: Phase },

    /// A clue arrived from someone other than the current speaker.
    #[error("it is not your turn")]
    NotYourTurn,

    /// Only the host may start the game.
    #[error("only the host can start the game")]
    NotHost,

    /// The sender has been ejected this game.
    #[error("ejected players cannot act this game")]
    NotAlive,

    /// A vote named someone who is not an alive member.
    #[error("player {0} is not an alive member of this room")]
    InvalidTarget(PlayerId),

    /// The room is at capacity.
    #[error("room is full ({0} players)")]
    RoomFull(usize),

    /// Too few members to start.
    #[error("need at least {required} players to start, have {present}")]
    NotEnoughPlayers { required: usize, present: usize },

    /// The room requires every member to be ready before starting.
    #[error("not every player is ready")]
    NotAllReady,

    /// The player is already a member.
    #[error("player {0} is already in the room")]
    AlreadyJoined(PlayerId),

    /// The player is not a member.
    #[error("player {0} is not in the room")]
    UnknownPlayer(PlayerId),

    /// Joins are refused while a game runs.
    #[error("a game is already in progress")]
    GameInProgress,
}

impl GameError {
    /// The wire category reported to the client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTarget(_) => ErrorKind::InvalidTarget,
            Self::RoomFull(_) | Self::NotEnoughPlayers { .. } => ErrorKind::Capacity,
            Self::WrongPhase { .. }
            | Self::NotYourTurn
            | Self::NotHost
            | Self::NotAlive
            | Self::NotAllReady
            | Self::AlreadyJoined(_)
            | Self::UnknownPlayer(_)
            | Self::GameInProgress => ErrorKind::ProtocolViolation,
        }
    }
}

/// A [`GameConfig`](crate::GameConfig) that no room could play with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("min_players must be at least 3, got {0}")]
    MinPlayersTooLow(usize),

    #[error("max_players ({max}) is below min_players ({min})")]
    MaxBelowMin { min: usize, max: usize },

    #[error("word list is empty")]
    NoWords,

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("{field} must be at most {max_secs} seconds")]
    DurationTooLong { field: &'static str, max_secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            GameError::InvalidTarget(PlayerId(1)).kind(),
            ErrorKind::InvalidTarget
        );
        assert_eq!(GameError::RoomFull(8).kind(), ErrorKind::Capacity);
        assert_eq!(
            GameError::NotEnoughPlayers {
                required: 3,
                present: 2
            }
            .kind(),
            ErrorKind::Capacity
        );
        assert_eq!(GameError::NotYourTurn.kind(), ErrorKind::ProtocolViolation);
        assert_eq!(
            GameError::WrongPhase {
                action: "vote",
                phase: Phase::Lobby
            }
            .kind(),
            ErrorKind::ProtocolViolation
        );
    }

    #[test]
    fn test_error_messages() {
        let err = GameError::WrongPhase {
            action: "submit a clue",
            phase: Phase::Vote,
        };
        assert_eq!(err.to_string(), "cannot submit a clue during vote");
        assert_eq!(
            GameError::NotEnoughPlayers {
                required: 3,
                present: 1
            }
            .to_string(),
            "need at least 3 players to start, have 1"
        );
    }
}
