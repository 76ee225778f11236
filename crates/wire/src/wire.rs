// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON payload codec.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors from payload encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Serialize a payload for publishing.
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(msg).map_err(ProtocolError::Encode)
}

/// Deserialize a received payload.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(bytes).map_err(ProtocolError::Decode)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
