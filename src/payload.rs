//! CWT payload of a signed message.

use std::collections::BTreeMap;

use serde_cbor::Value;

use crate::error::DecodeError;

/// Top level claims map of a CWT, keyed by integers or text.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(BTreeMap<Value, Value>);

impl Payload {
    pub fn get(&self, key: i128) -> Option<&Value> {
        self.0.get(&Value::Integer(key))
    }

    pub fn entries(&self) -> &BTreeMap<Value, Value> {
        &self.0
    }
}

pub fn decode_payload(bytes: &[u8]) -> Result<Payload, DecodeError> {
    let value: Value = serde_cbor::from_slice(bytes)
        .map_err(|e| DecodeError::MalformedPayload(format!("not CBOR: {}", e)))?;

    let map = match value {
        Value::Map(map) => map,
        other => {
            return Err(DecodeError::MalformedPayload(format!(
                "top level is {}, not a map",
                kind(&other)
            )))
        }
    };

    if let Some(key) = map
        .keys()
        .find(|key| !matches!(key, Value::Integer(_) | Value::Text(_)))
    {
        return Err(DecodeError::MalformedPayload(format!(
            "{} used as claim key",
            kind(key)
        )));
    }

    tracing::debug!(claims = map.len(), "decoded CWT payload");
    Ok(Payload(map))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Integer(_) => "an integer",
        Value::Float(_) => "a float",
        Value::Bytes(_) => "a byte string",
        Value::Text(_) => "a text string",
        Value::Array(_) => "an array",
        Value::Map(_) => "a map",
        _ => "a tagged value",
    }
}
