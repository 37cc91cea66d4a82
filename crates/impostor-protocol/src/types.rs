//! Core protocol types for the Impostor wire format.
//!
//! Every frame on the wire is a single JSON object tagged by `"type"`.
//! Clients send [`ClientCommand`]s; the server answers with
//! [`ServerEvent`]s. Field names are camelCase so browser clients can use
//! them without a mapping layer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected player.
///
/// Assigned by the server when the connection is accepted and announced
/// to the client in [`ServerEvent::Welcome`]. `#[serde(transparent)]`
/// keeps it a plain number on the wire, and lets it be used as a JSON
/// object key (serde_json writes integer keys as strings).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A room name chosen by the players (for example `"r1"`).
///
/// Rooms are created on first join, so the id is whatever the first
/// player typed. Use [`RoomId::parse`] to normalize untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Longest accepted room name, in characters.
    pub const MAX_CHARS: usize = 32;

    /// Trims surrounding whitespace and checks the length.
    ///
    /// Returns `None` for empty names and names longer than
    /// [`RoomId::MAX_CHARS`].
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().count() > Self::MAX_CHARS {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Returns the room name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive a server event.
///
/// The game core pairs every outbound event with a `Recipient`; the room
/// actor resolves it against the current member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every member of the room.
    All,
    /// One specific member.
    Player(PlayerId),
    /// Every member except one (usually the one who caused the event).
    AllExcept(PlayerId),
}

impl Recipient {
    /// Returns `true` if `player` is covered by this recipient.
    pub fn includes(&self, player: PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(p) => *p == player,
            Self::AllExcept(p) => *p != player,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientCommand — client → server
// ---------------------------------------------------------------------------

/// A command sent by a client.
///
/// ```json
/// { "type": "join", "room": "r1", "name": "Ada" }
/// { "type": "voteImpostor", "targetId": 7 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientCommand {
    /// Ask for the list of open rooms.
    ListRooms,

    /// Join (or create) a room under a display name.
    Join {
        room: String,
        #[serde(default)]
        name: Option<String>,
    },

    /// Leave the current room.
    Leave,

    /// Mark yourself ready in the lobby.
    Ready,

    /// Clear your ready flag.
    Unready,

    /// Host only: start a game.
    StartGame,

    /// Submit a clue during your turn.
    SubmitClue {
        #[serde(default)]
        text: String,
    },

    /// Vote for the player you think is the impostor.
    VoteImpostor {
        #[serde(rename = "targetId", alias = "votedId")]
        target_id: PlayerId,
    },
}

// ---------------------------------------------------------------------------
// Event payload records
// ---------------------------------------------------------------------------

/// Public view of a room member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
    pub score: u32,
}

/// A member as shown on the voting screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub id: PlayerId,
    pub name: String,
    pub alive: bool,
}

/// One entry of a room listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub count: usize,
    pub in_game: bool,
}

/// The secret a player receives when a game starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Role {
    /// Knows the secret word.
    Crew { word: String },
    /// Does not know the word.
    Impostor,
}

/// Per-player line of a round's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub id: PlayerId,
    pub name: String,
    /// Votes this player received.
    pub votes: u32,
    /// Only ever `true` for an ejected impostor; the identity of a
    /// surviving impostor is not revealed mid-game.
    ///
    /// Clients written against servers that flagged the impostor's row
    /// every round must not treat `false` as "this player is crew". Use
    /// `gameOver.impostorId` for the final answer.
    pub was_impostor: bool,
    pub score: u32,
}

/// Final score line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameOverReason {
    /// The impostor was voted out.
    ImpostorEjected,
    /// Two or fewer players were left alive.
    TooFewPlayers,
    /// The impostor left the room.
    ImpostorLeft,
}

/// Category of a rejected command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Wrong phase, wrong sender, or not the turn holder.
    ProtocolViolation,
    /// The referenced player does not exist or is not alive.
    InvalidTarget,
    /// Room full or not enough players.
    Capacity,
    /// The frame could not be understood.
    Malformed,
}

// ---------------------------------------------------------------------------
// ServerEvent — server → client
// ---------------------------------------------------------------------------

/// An event sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    // -- Connection --
    /// First frame on every connection: your player id.
    Welcome { id: PlayerId },

    /// Answer to `listRooms`.
    RoomList { rooms: Vec<RoomSummary> },

    // -- Roster --
    /// Sent to the joining player with the full member list.
    #[serde(rename_all = "camelCase")]
    Joined {
        room: RoomId,
        host_id: PlayerId,
        players: Vec<PlayerSummary>,
    },

    /// Sent to the other members when someone joins.
    PlayerJoined { room: RoomId, player: PlayerSummary },

    /// A member left or disconnected.
    PlayerLeft { room: RoomId, id: PlayerId },

    #[serde(rename_all = "camelCase")]
    HostChanged { host_id: PlayerId },

    /// Member count after a roster change.
    LobbyInfo { room: RoomId, count: usize },

    PlayerReady { id: PlayerId },

    PlayerUnready { id: PlayerId },

    /// Every member is ready.
    AllReady,

    // -- Game --
    /// Sent to each player individually with their own role.
    #[serde(rename_all = "camelCase")]
    GameStarted {
        role: Role,
        reveal_seconds: u64,
        turn_seconds: u64,
        vote_seconds: u64,
    },

    /// A clue round begins; `order` is the speaking rotation.
    RoundStarted {
        round: u32,
        order: Vec<PlayerId>,
        alive: BTreeMap<PlayerId, bool>,
    },

    /// `id` holds the turn for `seconds`.
    TurnStarted { id: PlayerId, seconds: u64 },

    /// A clue was recorded. `skipped` clues have empty text.
    ClueReceived {
        from: PlayerId,
        text: String,
        count: usize,
        total: usize,
        skipped: bool,
    },

    AllCluesSubmitted,

    VotingStarted {
        players: Vec<PlayerStatus>,
        seconds: u64,
    },

    /// `from` has voted; the target stays secret until results.
    VoteReceived { from: PlayerId },

    RoundResults { results: Vec<RoundResult> },

    #[serde(rename_all = "camelCase")]
    PlayerEjected {
        id: PlayerId,
        was_impostor: bool,
        alive: BTreeMap<PlayerId, bool>,
    },

    #[serde(rename_all = "camelCase")]
    GameOver {
        standings: Vec<Standing>,
        impostor_id: Option<PlayerId>,
        word: Option<String>,
        reason: GameOverReason,
    },

    // -- Errors --
    /// A command was rejected. Sent to the offending client only.
    Error { kind: ErrorKind, message: String },
}

impl ServerEvent {
    /// Shorthand for building an [`ServerEvent::Error`].
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Error {
            kind,
            message: message.into(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
