//! Plaintext envelope JSON encode/decode.

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{CodecError, Result};
use crate::plaintext::{Plaintext, PlaintextKind, PlaintextValue};
use crate::types::{Envelope, EnvelopeKind};

/// Serialize a rendered plaintext into envelope JSON bytes.
pub fn encode_envelope(p: String, table: &str, column: &str) -> Result<Vec<u8>> {
    let envelope = Envelope::plaintext(p, table, column);
    let bytes = serde_json::to_vec(&envelope)?;
    trace!(table, column, len = bytes.len(), "encoded plaintext envelope");
    Ok(bytes)
}

/// Encode a typed plaintext for the given table/column.
pub fn encode<T: Plaintext>(value: &T, table: &str, column: &str) -> Result<Vec<u8>> {
    encode_envelope(value.render()?, table, column)
}

/// Encode a dynamically typed plaintext.
pub fn encode_value(value: &PlaintextValue, table: &str, column: &str) -> Result<Vec<u8>> {
    encode_envelope(value.render()?, table, column)
}

/// Encode an arbitrary JSON value, rejecting kinds with no envelope form.
pub fn encode_json(value: &Value, table: &str, column: &str) -> Result<Vec<u8>> {
    let plaintext = PlaintextValue::from_json(value).inspect_err(|e| {
        debug!(table, column, error = %e, "rejected plaintext");
    })?;
    encode_value(&plaintext, table, column)
}

/// Extract the `p` string from a payload returned by the proxy.
///
/// Any fields besides `p` are ignored.
pub fn extract_plaintext(data: &[u8]) -> Result<String> {
    let parsed: Value = serde_json::from_slice(data).map_err(|e| {
        debug!(error = %e, "payload is not valid JSON");
        CodecError::MalformedEnvelope(e.to_string())
    })?;

    let Value::Object(fields) = parsed else {
        return Err(CodecError::MalformedEnvelope(
            "expected a JSON object".to_string(),
        ));
    };

    match fields.get("p") {
        Some(Value::String(p)) => Ok(p.clone()),
        _ => {
            if fields.get("k").and_then(Value::as_str) == Some(EnvelopeKind::Ciphertext.as_str()) {
                warn!("ciphertext payload reached the plaintext decode path");
            }
            Err(CodecError::MissingPlaintextField)
        }
    }
}

/// Decode a payload into the caller's plaintext type.
pub fn decode<T: Plaintext>(data: &[u8]) -> Result<T> {
    let p = extract_plaintext(data)?;
    let kind = T::KIND;
    T::parse(&p).inspect_err(|e| {
        debug!(%kind, error = %e, "plaintext does not parse as target kind");
    })
}

/// Decode a payload as an explicitly chosen kind.
pub fn decode_as(data: &[u8], kind: PlaintextKind) -> Result<PlaintextValue> {
    let p = extract_plaintext(data)?;
    PlaintextValue::parse(kind, &p)
}

// ============================================================================
// Payload inspection
// ============================================================================

/// Read the `k` discriminator of a payload, if it is one this crate knows.
pub fn payload_kind(data: &[u8]) -> Result<Option<EnvelopeKind>> {
    let parsed: Value =
        serde_json::from_slice(data).map_err(|e| CodecError::MalformedEnvelope(e.to_string()))?;
    let Value::Object(fields) = parsed else {
        return Err(CodecError::MalformedEnvelope(
            "expected a JSON object".to_string(),
        ));
    };
    Ok(fields
        .get("k")
        .and_then(Value::as_str)
        .and_then(EnvelopeKind::from_tag))
}

/// The plaintext of a parsed payload, only when it is tagged `"pt"`.
pub fn plaintext_of(payload: &Value) -> Option<&str> {
    match payload.get("k").and_then(Value::as_str) {
        Some(k) if k == EnvelopeKind::Plaintext.as_str() => payload.get("p").and_then(Value::as_str),
        _ => None,
    }
}

/// The ciphertext of a parsed payload, only when it is tagged `"ct"`.
pub fn ciphertext_of(payload: &Value) -> Option<&str> {
    match payload.get("k").and_then(Value::as_str) {
        Some(k) if k == EnvelopeKind::Ciphertext.as_str() => {
            payload.get("c").and_then(Value::as_str)
        }
        _ => None,
    }
}
