//! Room registry: creates, tracks, and routes players to rooms.

use std::collections::HashMap;

use impostor_game::{GameConfig, GameError, Room};
use impostor_protocol::{PlayerId, RoomId, RoomSummary};

use crate::room::spawn_room;
use crate::{PlayerAction, PlayerSender, RoomError, RoomHandle, RoomInfo};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Owns every live room and knows which room each player is in.
///
/// Rooms are created by the first join to a name and destroyed when their
/// last member leaves.
pub struct RoomRegistry {
    config: GameConfig,
    /// When set, room N (counting from 0) is seeded with `seed + N`.
    seed: Option<u64>,
    rooms_created: u64,

    /// Active rooms, keyed by room ID.
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each player to the room they're currently in.
    /// A player can be in at most ONE room at a time.
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl RoomRegistry {
    /// Creates an empty registry whose rooms draw from OS randomness.
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            seed: None,
            rooms_created: 0,
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    /// Creates an empty registry whose rooms are deterministically seeded.
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new(config)
        }
    }

    fn create_room(&mut self, room_id: RoomId) -> RoomHandle {
        let room = match self.seed {
            Some(seed) => Room::with_seed(
                room_id.clone(),
                self.config.clone(),
                seed.wrapping_add(self.rooms_created),
            ),
            None => Room::new(room_id.clone(), self.config.clone()),
        };
        self.rooms_created += 1;

        let handle = spawn_room(room, DEFAULT_CHANNEL_SIZE);
        self.rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, rooms = self.rooms.len(), "room created");
        handle
    }

    /// Adds a player to the named room, creating it if it does not exist.
    ///
    /// Enforces the "one room at a time" invariant. A room created for a
    /// join that then fails is destroyed again.
    pub async fn join(
        &mut self,
        player_id: PlayerId,
        room: &str,
        name: Option<String>,
        sender: PlayerSender,
    ) -> Result<RoomId, RoomError> {
        let room_id = RoomId::parse(room).ok_or_else(|| RoomError::InvalidRoomId(room.to_string()))?;

        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, current.clone()));
        }

        let (handle, created) = match self.rooms.get(&room_id) {
            Some(handle) => (handle.clone(), false),
            None => (self.create_room(room_id.clone()), true),
        };

        if let Err(err) = handle.join(player_id, name, sender).await {
            if created {
                let _ = self.destroy_room(&room_id).await;
            }
            return Err(err);
        }

        self.player_rooms.insert(player_id, room_id.clone());
        Ok(room_id)
    }

    /// Removes a player from their current room, destroying it if empty.
    pub async fn leave(&mut self, player_id: PlayerId) -> Result<RoomId, RoomError> {
        let room_id = self
            .player_rooms
            .remove(&player_id)
            .ok_or(RoomError::NotInRoom(player_id))?;

        let Some(handle) = self.rooms.get(&room_id).cloned() else {
            return Ok(room_id);
        };

        let remaining = match handle.leave(player_id).await {
            Ok(remaining) => remaining,
            // The room already dropped them after a failed delivery.
            Err(RoomError::Rejected(GameError::UnknownPlayer(_))) => {
                handle.get_info().await.map(|info| info.player_count).unwrap_or(0)
            }
            Err(RoomError::Unavailable(_)) => 0,
            Err(err) => return Err(err),
        };

        if remaining == 0 {
            self.destroy_room(&room_id).await?;
        }
        Ok(room_id)
    }

    /// Routes an in-room command from a player to their current room.
    pub async fn route(&self, player_id: PlayerId, action: PlayerAction) -> Result<(), RoomError> {
        let room_id = self
            .player_rooms
            .get(&player_id)
            .ok_or(RoomError::NotInRoom(player_id))?;

        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        handle.send_action(player_id, action).await
    }

    /// Returns info about a specific room.
    pub async fn room_info(&self, room_id: &RoomId) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        handle.get_info().await
    }

    /// Shuts down a room and removes all its players from the index.
    pub async fn destroy_room(&mut self, room_id: &RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;

        let _ = handle.shutdown().await;

        self.player_rooms.retain(|_, rid| *rid != *room_id);

        tracing::info!(%room_id, rooms = self.rooms.len(), "room destroyed");
        Ok(())
    }

    /// Handles to every live room, for querying once the registry lock is
    /// released.
    pub fn room_handles(&self) -> Vec<RoomHandle> {
        self.rooms.values().cloned().collect()
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

/// Asks each room for its summary and sorts the answers by name.
///
/// Rooms that fail to respond (e.g., shutting down) are skipped. Takes
/// handles rather than the registry so callers can release the registry
/// lock before awaiting the rooms.
pub async fn summarize_rooms(handles: Vec<RoomHandle>) -> Vec<RoomSummary> {
    let mut summaries = Vec::with_capacity(handles.len());
    for handle in handles {
        if let Ok(info) = handle.get_info().await {
            summaries.push(info.summary());
        }
    }
    summaries.sort_by(|a, b| a.id.cmp(&b.id));
    summaries
}
