//! Room actors and the room registry for the Impostor server.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! room's [`impostor_game::Room`], the members' outbound channels and the
//! room's single phase timer. Commands and timer firings are handled one at
//! a time, so game state never sees two events interleave.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates rooms on first join, destroys them when
//!   empty, and tracks which room each player is in
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`PlayerAction`] — the in-room commands a player can send
//! - [`RoomInfo`] — a snapshot of a room's metadata

mod error;
mod registry;
mod room;

pub use error::RoomError;
pub use registry::{RoomRegistry, summarize_rooms};
pub use room::{PlayerAction, PlayerSender, RoomHandle, RoomInfo};
