//! Room membership: who is here, who is host, who is ready, and scores.

use impostor_protocol::{PlayerId, PlayerStatus, PlayerSummary, Standing};

use crate::GameError;

/// Fallback display name for blank or missing names.
pub const DEFAULT_NAME: &str = "Player";

/// One room member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
    /// Cumulative across rounds and games while the player stays.
    pub score: u32,
}

impl Player {
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            ready: self.ready,
            score: self.score,
        }
    }
}

/// What [`Roster::remove`] took out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub player: Player,
    /// The member who inherited the host role, if the host left and
    /// anyone remains.
    pub new_host: Option<PlayerId>,
}

/// Members of one room in join order.
///
/// The first member to join is host; when the host leaves, the longest
/// standing remaining member takes over.
#[derive(Debug, Clone)]
pub struct Roster {
    players: Vec<Player>,
    host: Option<PlayerId>,
    capacity: usize,
    max_name_chars: usize,
}

impl Roster {
    pub fn new(capacity: usize, max_name_chars: usize) -> Self {
        Self {
            players: Vec::with_capacity(capacity),
            host: None,
            capacity,
            max_name_chars,
        }
    }

    /// Adds a member with a cleaned-up display name.
    pub fn add(&mut self, id: PlayerId, name: Option<&str>) -> Result<&Player, GameError> {
        if self.contains(id) {
            return Err(GameError::AlreadyJoined(id));
        }
        if self.players.len() >= self.capacity {
            return Err(GameError::RoomFull(self.capacity));
        }
        if self.host.is_none() {
            self.host = Some(id);
        }
        self.players.push(Player {
            id,
            name: sanitize_name(name, self.max_name_chars),
            ready: false,
            score: 0,
        });
        Ok(&self.players[self.players.len() - 1])
    }

    /// Removes a member, handing the host role on if needed.
    pub fn remove(&mut self, id: PlayerId) -> Option<Departure> {
        let index = self.index_of(id)?;
        let player = self.players.remove(index);

        let mut new_host = None;
        if self.host == Some(id) {
            self.host = self.players.first().map(|p| p.id);
            new_host = self.host;
        }
        Some(Departure { player, new_host })
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Position in join order.
    pub fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.host
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Player> {
        self.players.iter()
    }

    /// Member ids in join order.
    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Sets a member's ready flag.
    pub fn set_ready(&mut self, id: PlayerId, ready: bool) -> Result<(), GameError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GameError::UnknownPlayer(id))?;
        player.ready = ready;
        Ok(())
    }

    /// `true` when the room is non-empty and every member is ready.
    pub fn all_ready(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.ready)
    }

    pub fn clear_ready(&mut self) {
        for player in &mut self.players {
            player.ready = false;
        }
    }

    pub fn add_score(&mut self, id: PlayerId, points: u32) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.score = player.score.saturating_add(points);
        }
    }

    pub fn summaries(&self) -> Vec<PlayerSummary> {
        self.players.iter().map(Player::summary).collect()
    }

    /// Every member, flagged alive or not by `is_alive`.
    pub fn statuses(&self, is_alive: impl Fn(PlayerId) -> bool) -> Vec<PlayerStatus> {
        self.players
            .iter()
            .map(|p| PlayerStatus {
                id: p.id,
                name: p.name.clone(),
                alive: is_alive(p.id),
            })
            .collect()
    }

    /// Final standings: highest score first, ties in join order.
    pub fn standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .players
            .iter()
            .map(|p| Standing {
                id: p.id,
                name: p.name.clone(),
                score: p.score,
            })
            .collect();
        // stable: equal scores keep join order
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        standings
    }
}

/// Trims a requested display name and cuts it to `max_chars` characters.
/// Blank or missing names become [`DEFAULT_NAME`].
pub fn sanitize_name(raw: Option<&str>, max_chars: usize) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return DEFAULT_NAME.to_string();
    }
    trimmed.chars().take(max_chars).collect()
}
