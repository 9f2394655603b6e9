//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding channel events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing an event into a text frame failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A frame could not be parsed into a known event with a valid payload.
    ///
    /// Common causes: malformed JSON, an unknown event name, or a payload
    /// field with the wrong type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
