//! JSON codec for wire envelopes.
//!
//! Decoding is two-stage: the envelope is first parsed as raw JSON, then the
//! action payload is deserialised into the typed [`Action`] union. An action
//! whose `kind` this version does not recognise decodes as
//! [`NetError::UnknownAction`] — distinguishable from transport garbage so
//! callers can ignore it and stay forward-compatible with newer peers. A
//! *known* kind with a malformed payload is a [`NetError::Decode`], never
//! silently ignored.

use serde::Serialize;
use serde_json::Value;

use vox_component::PlayerId;

use crate::error::NetError;
use crate::messages::{Action, Envelope};

/// Encode any message to JSON bytes.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    serde_json::to_vec(value).map_err(NetError::Encode)
}

/// Encode an action wrapped in a dispatch envelope.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode_action(action: &Action) -> Result<Vec<u8>, NetError> {
    encode(&Envelope::Dispatch {
        action: action.clone(),
    })
}

/// Encode the connection greeting carrying the assigned id.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode_welcome(player_id: &PlayerId) -> Result<Vec<u8>, NetError> {
    encode(&Envelope::welcome(player_id.clone()))
}

/// Decode a wire envelope from JSON bytes.
///
/// # Errors
///
/// - [`NetError::Decode`] — the bytes are not a well-formed envelope, or a
///   known action kind carries a malformed payload.
/// - [`NetError::UnknownEnvelope`] — the `t` tag is not recognised.
/// - [`NetError::UnknownAction`] — the envelope is a dispatch whose action
///   `kind` this version does not know.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, NetError> {
    let raw: Value = serde_json::from_slice(bytes).map_err(NetError::Decode)?;

    let tag = raw
        .get("t")
        .and_then(Value::as_str)
        .ok_or_else(|| NetError::UnknownEnvelope("<missing>".to_string()))?;

    match tag {
        "welcome" => serde_json::from_value(raw).map_err(NetError::Decode),
        "dispatch" => {
            let payload = raw.get("action").cloned().unwrap_or(Value::Null);
            let kind = payload
                .get("kind")
                .and_then(Value::as_str)
                .unwrap_or("<missing>")
                .to_string();
            let action: Action = serde_json::from_value(payload).map_err(|err| {
                if Action::is_known_kind(&kind) {
                    NetError::Decode(err)
                } else {
                    NetError::UnknownAction(kind)
                }
            })?;
            Ok(Envelope::Dispatch { action })
        }
        other => Err(NetError::UnknownEnvelope(other.to_string())),
    }
}
