//! Per-connection handler: welcome, command routing, and event delivery.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Derive the PlayerId from the connection id and send `welcome`
//!   2. Spawn a writer task that drains the player's event channel into
//!      the socket
//!   3. Loop: decode commands → registry (listRooms/join/leave) or the
//!      player's room (everything else)
//!   4. On exit, the membership guard removes the player from their room
//!
//! Every successful join or leave pushes a fresh `roomList` to all
//! connections through the server's lobby broadcast.
//!
//! Rooms never touch the socket. They push events into the same unbounded
//! channel the handler uses for direct replies, so a player sees replies
//! and room events in the order they were produced.

use std::sync::Arc;

use impostor_protocol::{ClientCommand, Codec, ErrorKind, PlayerId, ServerEvent};
use impostor_room::{PlayerAction, PlayerSender, RoomError, summarize_rooms};
use impostor_transport::{Connection, WebSocketConnection};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};

use crate::ImpostorError;
use crate::server::ServerState;

/// Drop guard that takes a player out of their room when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct MembershipGuard<C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for MembershipGuard<C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let left = state.rooms.lock().await.leave(player_id).await;
            match left {
                Ok(room_id) => {
                    tracing::info!(%player_id, %room_id, "disconnected player removed from room");
                    publish_room_list(&state).await;
                }
                Err(RoomError::NotInRoom(_)) => {}
                Err(e) => tracing::debug!(%player_id, error = %e, "leave on disconnect failed"),
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ImpostorError> {
    let conn = Arc::new(conn);
    let player_id = PlayerId(conn.id().into_inner());
    tracing::info!(%player_id, peer = %conn.peer_addr(), "player connected");

    // Welcome is queued before the writer starts so it is always first.
    let (events, outbox) = mpsc::unbounded_channel();
    let _ = events.send(ServerEvent::Welcome { id: player_id });
    let lobby = state.lobby.subscribe();
    tokio::spawn(write_events(
        Arc::clone(&conn),
        Arc::clone(&state),
        outbox,
        lobby,
    ));

    let _guard = MembershipGuard {
        player_id,
        state: Arc::clone(&state),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let command: ClientCommand = match state.codec.decode(&data) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode command");
                let _ = events.send(ServerEvent::error(ErrorKind::Malformed, e.to_string()));
                continue;
            }
        };

        handle_command(&state, player_id, command, &events).await;
    }

    // _guard drops here → leave fires; the writer ends once the room has
    // dropped its copy of the event channel.
    Ok(())
}

/// Applies one decoded command. Failures are reported to the sender as
/// `error` events and never close the connection.
async fn handle_command<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    command: ClientCommand,
    events: &PlayerSender,
) {
    let result = match command {
        ClientCommand::ListRooms => {
            let handles = state.rooms.lock().await.room_handles();
            let rooms = summarize_rooms(handles).await;
            let _ = events.send(ServerEvent::RoomList { rooms });
            Ok(())
        }

        ClientCommand::Join { room, name } => {
            let joined = state
                .rooms
                .lock()
                .await
                .join(player_id, &room, name, events.clone())
                .await;
            match joined {
                Ok(room_id) => {
                    tracing::info!(%player_id, %room_id, "player joined room");
                    publish_room_list(state).await;
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }

        ClientCommand::Leave => {
            let left = state.rooms.lock().await.leave(player_id).await;
            match left {
                Ok(room_id) => {
                    tracing::info!(%player_id, %room_id, "player left room");
                    publish_room_list(state).await;
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }

        command => match PlayerAction::from_command(command) {
            Some(action) => state.rooms.lock().await.route(player_id, action).await,
            None => Ok(()),
        },
    };

    if let Err(e) = result {
        tracing::debug!(%player_id, error = %e, "command rejected");
        let _ = events.send(ServerEvent::error(e.kind(), e.to_string()));
    }
}

/// Sends the current room list to every connection.
///
/// The registry lock is released before the rooms are asked for their
/// summaries.
async fn publish_room_list<C: Codec>(state: &ServerState<C>) {
    if state.lobby.receiver_count() == 0 {
        return;
    }
    let handles = state.rooms.lock().await.room_handles();
    let rooms = summarize_rooms(handles).await;
    let _ = state.lobby.send(ServerEvent::RoomList { rooms });
}

/// Encodes queued events and writes them to the socket, in order.
///
/// Direct replies and room events take priority over lobby updates. Stops
/// at the first failed write. Dropping the receiver makes every later room
/// broadcast to this player fail, which the room treats as a disconnect.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut outbox: mpsc::UnboundedReceiver<ServerEvent>,
    mut lobby: broadcast::Receiver<ServerEvent>,
) {
    loop {
        let event = tokio::select! {
            biased;
            event = outbox.recv() => match event {
                Some(event) => event,
                None => break,
            },
            update = lobby.recv() => match update {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(conn_id = %conn.id(), skipped, "room list updates skipped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}
