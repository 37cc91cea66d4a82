//! `ImpostorServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room registry.

use std::sync::Arc;

use impostor_game::GameConfig;
use impostor_protocol::{Codec, JsonCodec, ServerEvent};
use impostor_room::RoomRegistry;
use impostor_transport::{Transport, WebSocketTransport};
use tokio::sync::{Mutex, broadcast};

use crate::handler::handle_connection;
use crate::{ImpostorError, ServerConfig};

/// Room-list updates a slow connection may fall behind by before it starts
/// skipping the oldest.
const LOBBY_CAPACITY: usize = 64;

/// Shared server state passed to each connection task.
///
/// The registry is behind a `Mutex`: joins and leaves are short and rare
/// next to in-room traffic, which goes straight to the room actor once
/// routed. `lobby` fans room-list updates out to every connection.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) lobby: broadcast::Sender<ServerEvent>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting an Impostor server.
///
/// # Example
///
/// ```rust,no_run
/// use impostor::prelude::*;
///
/// # async fn start() -> Result<(), ImpostorError> {
/// let server = ImpostorServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .game_config(GameConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ImpostorServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
    rng_seed: Option<u64>,
}

impl ImpostorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(ServerConfig::default())
    }

    /// Starts from a loaded [`ServerConfig`].
    pub fn from_config(config: ServerConfig) -> Self {
        Self {
            bind_addr: config.bind,
            game_config: config.game,
            rng_seed: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the rules and timings for every room.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Seeds every room's random draws so games are reproducible.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Validates the game config, binds the listener and returns a server
    /// ready to [`run`](ImpostorServer::run).
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<ImpostorServer<JsonCodec>, ImpostorError> {
        self.game_config.validate()?;

        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let rooms = match self.rng_seed {
            Some(seed) => RoomRegistry::with_seed(self.game_config, seed),
            None => RoomRegistry::new(self.game_config),
        };
        let (lobby, _) = broadcast::channel(LOBBY_CAPACITY);
        let state = Arc::new(ServerState {
            rooms: Mutex::new(rooms),
            lobby,
            codec: JsonCodec,
        });

        Ok(ImpostorServer { transport, state })
    }
}

impl Default for ImpostorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Impostor server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ImpostorServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl ImpostorServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ImpostorServerBuilder {
        ImpostorServerBuilder::new()
    }
}

impl<C: Codec> ImpostorServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the task is dropped.
    ///
    /// Each accepted connection gets its own task. A failed accept or
    /// WebSocket upgrade is logged and does not stop the loop.
    pub async fn run(mut self) -> Result<(), ImpostorError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Impostor server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
