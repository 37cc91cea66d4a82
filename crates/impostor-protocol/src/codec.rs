//! Codec trait and implementations for serializing/deserializing frames.
//!
//! The server never touches `serde_json` directly: it encodes
//! [`ServerEvent`](crate::ServerEvent)s and decodes
//! [`ClientCommand`](crate::ClientCommand)s through a [`Codec`], so the
//! wire format can be swapped without touching the connection handler.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts protocol values to frame bytes and back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON, which is what browser clients send.
///
/// ```rust
/// use impostor_protocol::{ClientCommand, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let cmd: ClientCommand = codec.decode(br#"{"type":"ready"}"#).unwrap();
/// assert_eq!(cmd, ClientCommand::Ready);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
