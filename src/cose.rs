//! COSE_Sign1 envelope (RFC 9052, section 4.2).

use std::collections::BTreeMap;

use serde_cbor::Value;

use crate::error::DecodeError;

pub const COSE_SIGN1_TAG: u64 = 18;
pub const HEADER_ALG: i128 = 1;
pub const HEADER_KID: i128 = 4;

pub type HeaderMap = BTreeMap<Value, Value>;

/// A parsed `[protected, unprotected, payload, signature]` message.
///
/// The protected header is kept as the exact bytes found on the wire,
/// since those bytes (not a re-encoding of the map) are what got signed.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedMessage {
    protected_bytes: Vec<u8>,
    protected: HeaderMap,
    unprotected: HeaderMap,
    payload: Vec<u8>,
    signature: Vec<u8>,
}

impl SignedMessage {
    pub fn new(
        protected_bytes: Vec<u8>,
        unprotected: HeaderMap,
        payload: Vec<u8>,
        signature: Vec<u8>,
    ) -> Result<Self, DecodeError> {
        let protected = decode_protected(&protected_bytes)?;
        Ok(SignedMessage {
            protected_bytes,
            protected,
            unprotected,
            payload,
            signature,
        })
    }

    /// Parses an optionally tagged COSE_Sign1 structure.
    pub fn from_slice(data: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_cbor::from_slice(data)
            .map_err(|e| DecodeError::MalformedEnvelope(format!("not CBOR: {}", e)))?;

        let value = match value {
            Value::Tag(COSE_SIGN1_TAG, inner) => *inner,
            Value::Tag(tag, _) => {
                return Err(DecodeError::MalformedEnvelope(format!(
                    "unexpected tag {}, COSE_Sign1 is {}",
                    tag, COSE_SIGN1_TAG
                )))
            }
            other => other,
        };

        let items = match value {
            Value::Array(items) => items,
            _ => {
                return Err(DecodeError::MalformedEnvelope(
                    "top level is not an array".into(),
                ))
            }
        };
        let [protected, unprotected, payload, signature]: [Value; 4] =
            items.try_into().map_err(|items: Vec<Value>| {
                DecodeError::MalformedEnvelope(format!(
                    "expected 4 elements, found {}",
                    items.len()
                ))
            })?;

        let protected_bytes = expect_bytes(protected, "protected header")?;
        let unprotected = match unprotected {
            Value::Map(map) => map,
            _ => {
                return Err(DecodeError::MalformedEnvelope(
                    "unprotected header is not a map".into(),
                ))
            }
        };
        let payload = expect_bytes(payload, "payload")?;
        let signature = expect_bytes(signature, "signature")?;

        let message = SignedMessage::new(protected_bytes, unprotected, payload, signature)?;
        tracing::debug!(
            alg = ?message.algorithm(),
            kid = ?message.key_id().map(hex::encode),
            payload = message.payload.len(),
            "parsed COSE_Sign1"
        );
        Ok(message)
    }

    pub fn protected_bytes(&self) -> &[u8] {
        &self.protected_bytes
    }

    pub fn protected(&self) -> &HeaderMap {
        &self.protected
    }

    pub fn unprotected(&self) -> &HeaderMap {
        &self.unprotected
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The `alg` header. Only the protected bucket counts, an algorithm
    /// in the unprotected bucket is not covered by the signature.
    pub fn algorithm(&self) -> Option<i128> {
        match self.protected.get(&Value::Integer(HEADER_ALG)) {
            Some(Value::Integer(alg)) => Some(*alg),
            _ => None,
        }
    }

    /// The `kid` header, protected bucket first.
    pub fn key_id(&self) -> Option<&[u8]> {
        kid_in(&self.protected).or_else(|| kid_in(&self.unprotected))
    }
}

fn kid_in(headers: &HeaderMap) -> Option<&[u8]> {
    match headers.get(&Value::Integer(HEADER_KID)) {
        Some(Value::Bytes(kid)) => Some(kid.as_slice()),
        _ => None,
    }
}

fn expect_bytes(value: Value, what: &str) -> Result<Vec<u8>, DecodeError> {
    match value {
        Value::Bytes(bytes) => Ok(bytes),
        _ => Err(DecodeError::MalformedEnvelope(format!(
            "{} is not a byte string",
            what
        ))),
    }
}

// An empty byte string stands for an empty header map.
fn decode_protected(bytes: &[u8]) -> Result<HeaderMap, DecodeError> {
    if bytes.is_empty() {
        return Ok(HeaderMap::new());
    }
    match serde_cbor::from_slice(bytes) {
        Ok(Value::Map(map)) => Ok(map),
        Ok(_) => Err(DecodeError::MalformedEnvelope(
            "protected header is not a map".into(),
        )),
        Err(e) => Err(DecodeError::MalformedEnvelope(format!(
            "can't decode protected header: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protected() -> Vec<u8> {
        let mut headers = HeaderMap::new();
        headers.insert(Value::Integer(HEADER_ALG), Value::Integer(-7));
        headers.insert(Value::Integer(HEADER_KID), Value::Bytes(vec![1, 2, 3, 4]));
        serde_cbor::to_vec(&Value::Map(headers)).unwrap()
    }

    fn envelope(items: Vec<Value>) -> Vec<u8> {
        serde_cbor::to_vec(&Value::Array(items)).unwrap()
    }

    fn valid_items() -> Vec<Value> {
        vec![
            Value::Bytes(protected()),
            Value::Map(HeaderMap::new()),
            Value::Bytes(b"payload".to_vec()),
            Value::Bytes(vec![0; 64]),
        ]
    }

    #[test]
    fn parses_untagged_envelope() {
        let message = SignedMessage::from_slice(&envelope(valid_items())).unwrap();
        assert_eq!(message.protected_bytes(), protected().as_slice());
        assert_eq!(message.payload(), b"payload");
        assert_eq!(message.signature().len(), 64);
        assert_eq!(message.algorithm(), Some(-7));
        assert_eq!(message.key_id(), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn parses_tagged_envelope() {
        // 0xd2 is tag 18
        let mut data = vec![0xd2];
        data.extend(envelope(valid_items()));
        let message = SignedMessage::from_slice(&data).unwrap();
        assert_eq!(message.payload(), b"payload");
    }

    #[test]
    fn rejects_other_cose_tags() {
        // 0xd8 0x62 is tag 98, COSE_Sign
        let mut data = vec![0xd8, 0x62];
        data.extend(envelope(valid_items()));
        assert_eq!(
            SignedMessage::from_slice(&data),
            Err(DecodeError::MalformedEnvelope(
                "unexpected tag 98, COSE_Sign1 is 18".into()
            ))
        );
    }

    #[test]
    fn key_id_falls_back_to_unprotected_header() {
        let mut unprotected = HeaderMap::new();
        unprotected.insert(Value::Integer(HEADER_KID), Value::Bytes(vec![9; 8]));
        let message = SignedMessage::new(Vec::new(), unprotected, Vec::new(), Vec::new()).unwrap();
        assert_eq!(message.key_id(), Some(&[9u8; 8][..]));
        assert_eq!(message.algorithm(), None);
        assert!(message.protected().is_empty());
    }

    #[test]
    fn rejects_wrong_element_count() {
        let mut items = valid_items();
        items.pop();
        assert!(matches!(
            SignedMessage::from_slice(&envelope(items)),
            Err(DecodeError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn rejects_wrong_element_shapes() {
        let mut items = valid_items();
        items[1] = Value::Array(vec![]);
        assert!(matches!(
            SignedMessage::from_slice(&envelope(items)),
            Err(DecodeError::MalformedEnvelope(_))
        ));

        let mut items = valid_items();
        items[2] = Value::Null;
        assert!(matches!(
            SignedMessage::from_slice(&envelope(items)),
            Err(DecodeError::MalformedEnvelope(_))
        ));

        let map = serde_cbor::to_vec(&Value::Map(HeaderMap::new())).unwrap();
        assert!(matches!(
            SignedMessage::from_slice(&map),
            Err(DecodeError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn rejects_protected_header_that_is_not_a_map() {
        let mut items = valid_items();
        items[0] = Value::Bytes(serde_cbor::to_vec(&Value::Integer(7)).unwrap());
        assert!(matches!(
            SignedMessage::from_slice(&envelope(items)),
            Err(DecodeError::MalformedEnvelope(_))
        ));

        let mut items = valid_items();
        items[0] = Value::Bytes(vec![0xa1]);
        assert!(matches!(
            SignedMessage::from_slice(&envelope(items)),
            Err(DecodeError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            SignedMessage::from_slice(&[0xff, 0x00]),
            Err(DecodeError::MalformedEnvelope(_))
        ));
    }
}
