//! Unified error type for the Impostor server.

use impostor_game::ConfigError;
use impostor_protocol::ProtocolError;
use impostor_room::RoomError;
use impostor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each layer's variant generates the `From`
/// impl, so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ImpostorError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, not in a room, rejected).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The game settings are impossible to play with.
    #[error("invalid game config: {0}")]
    Config(#[from] ConfigError),

    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for a [`ServerConfig`](crate::ServerConfig).
    #[error("cannot parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// An environment override has a value of the wrong shape.
    #[error("invalid value {value:?} for {key}")]
    InvalidSetting { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use impostor_game::GameError;
    use impostor_protocol::{PlayerId, RoomId};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let err: ImpostorError = err.into();
        assert!(matches!(err, ImpostorError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let err: ImpostorError = err.into();
        assert!(matches!(err, ImpostorError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(RoomId("r1".into()));
        let err: ImpostorError = err.into();
        assert!(matches!(err, ImpostorError::Room(_)));
    }

    #[test]
    fn test_rejection_message_passes_through() {
        let err: ImpostorError = RoomError::from(GameError::NotYourTurn).into();
        assert_eq!(err.to_string(), GameError::NotYourTurn.to_string());
        let err: ImpostorError = RoomError::NotInRoom(PlayerId(3)).into();
        assert!(err.to_string().contains("P-3"));
    }

    #[test]
    fn test_from_config_error() {
        let err: ImpostorError = ConfigError::NoWords.into();
        assert!(matches!(err, ImpostorError::Config(_)));
        assert!(err.to_string().starts_with("invalid game config"));
    }

    #[test]
    fn test_invalid_setting_names_the_key() {
        let err = ImpostorError::InvalidSetting {
            key: "PORT",
            value: "eighty".into(),
        };
        assert_eq!(err.to_string(), r#"invalid value "eighty" for PORT"#);
    }
}
