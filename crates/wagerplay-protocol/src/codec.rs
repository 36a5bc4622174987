//! Codec trait and implementations for serializing/deserializing records.
//!
//! The coordinator speaks to its callers in requests and responses that
//! must travel over *some* transport (HTTP body, message queue, test
//! harness). The protocol layer does not care which; it only needs
//! something that implements [`Codec`]. [`JsonCodec`] is the default and
//! matches the JSON shape the web client already sends.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` lets one codec instance be shared by every
/// task that handles requests.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use wagerplay_protocol::{Codec, JsonCodec, LobbyId};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&LobbyId::new("K7Q2M9XA")).unwrap();
/// assert_eq!(bytes, b"\"K7Q2M9XA\"");
///
/// let decoded: LobbyId = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded.as_str(), "K7Q2M9XA");
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
