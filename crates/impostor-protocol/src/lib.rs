//! Wire protocol for the Impostor word game.
//!
//! - **Types** ([`ClientCommand`], [`ServerEvent`], [`PlayerId`], ...) —
//!   the frames that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how frames become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (ClientCommand) → Room (game rules)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientCommand, ErrorKind, GameOverReason, PlayerId, PlayerStatus, PlayerSummary, Recipient,
    Role, RoomId, RoomSummary, RoundResult, ServerEvent, Standing,
};
