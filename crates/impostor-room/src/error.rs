//! Error types for the room layer.

use impostor_game::GameError;
use impostor_protocol::{ErrorKind, PlayerId, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("{0} not found")]
    NotFound(RoomId),

    /// The room's command channel is closed.
    #[error("{0} is unavailable")]
    Unavailable(RoomId),

    /// The player is not in any room.
    #[error("player {0} is not in a room")]
    NotInRoom(PlayerId),

    /// The requested room name is empty or too long.
    #[error("invalid room name {0:?}")]
    InvalidRoomId(String),

    /// A player can be in at most one room at a time.
    #[error("player {0} is already in {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The room refused the command under the game rules.
    #[error(transparent)]
    Rejected(#[from] GameError),
}

impl RoomError {
    /// The wire category reported to the client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Rejected(err) => err.kind(),
            Self::InvalidRoomId(_) => ErrorKind::Malformed,
            Self::NotFound(_)
            | Self::Unavailable(_)
            | Self::NotInRoom(_)
            | Self::AlreadyInRoom(..) => ErrorKind::ProtocolViolation,
        }
    }
}
