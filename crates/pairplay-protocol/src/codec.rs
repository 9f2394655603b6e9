//! Codec trait and implementations for turning events into text frames.
//!
//! The rest of the server only depends on the [`Codec`] trait; the JSON
//! implementation is the one clients speak today.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values into text frames and decodes frames back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text frame into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the frame is malformed or does
    /// not match the shape of `T`.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientEvent, QuickMatchRequest, ServerEvent, UserId};

    #[test]
    fn test_json_codec_decodes_client_event() {
        let event: ClientEvent = JsonCodec
            .decode(r#"{"event":"join_into_room","data":{"user":"alice"}}"#)
            .unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinIntoRoom(QuickMatchRequest {
                user: UserId::new("alice")
            })
        );
    }

    #[test]
    fn test_json_codec_encodes_server_event() {
        let text = JsonCodec
            .encode(&ServerEvent::PlayerLeft {
                message: "gone".into(),
            })
            .unwrap();
        assert_eq!(text, r#"{"event":"player_left","data":{"message":"gone"}}"#);
    }

    #[test]
    fn test_json_codec_decode_garbage_is_error() {
        let result: Result<ClientEvent, _> = JsonCodec.decode("not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_unknown_event_is_error() {
        let result: Result<ClientEvent, _> =
            JsonCodec.decode(r#"{"event":"teleport","data":{}}"#);
        assert!(result.is_err());
    }
}
