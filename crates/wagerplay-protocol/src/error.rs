//! Error types for the protocol layer.
//!
//! Each crate in wagerplay defines its own error enum. A `ProtocolError`
//! always means the problem is in the shape of the data (a malformed
//! payload, an out-of-range amount, a config missing a field), never in
//! lobby or session bookkeeping.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or an
    /// enum tag this version does not know.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A match configuration failed validation.
    ///
    /// The string names the offending field so the caller can show a
    /// precise reason instead of a generic failure.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A decimal amount could not be parsed or does not fit the
    /// fixed-point representation.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}
