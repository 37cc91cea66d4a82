//! # Impostor
//!
//! WebSocket server for the Impostor hidden-role word game: every player but
//! one knows the secret word, everyone gives a one-word clue in turn, and the
//! room votes on who is bluffing.
//!
//! This crate re-exports the layers and ties them together:
//!
//! - `impostor-transport` — WebSocket accept/send/recv
//! - `impostor-protocol` — JSON commands and events
//! - `impostor-game` — the per-room round controller
//! - `impostor-room` — room actors and the room registry
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use impostor::prelude::*;
//!
//! # async fn start() -> Result<(), ImpostorError> {
//! let config = ServerConfig::from_env()?;
//! let server = ImpostorServerBuilder::from_config(config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
pub mod logging;
mod server;

pub use config::{DEFAULT_BIND, ServerConfig};
pub use error::ImpostorError;
pub use server::{ImpostorServer, ImpostorServerBuilder};

pub use impostor_game as game;
pub use impostor_protocol as protocol;
pub use impostor_room as room;
pub use impostor_transport as transport;

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{ImpostorError, ImpostorServer, ImpostorServerBuilder, ServerConfig};
    pub use impostor_game::GameConfig;
    pub use impostor_protocol::{
        ClientCommand, ErrorKind, GameOverReason, PlayerId, Role, RoomId, ServerEvent,
    };
}
