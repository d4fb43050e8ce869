//! ES256 signature check of a COSE_Sign1 message.

use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::Signature;
use serde_cbor::Value;
use sha2::{Digest, Sha256};

use crate::cose::SignedMessage;
use crate::error::VerificationError;
use crate::keys::{PublicKeyMaterial, COORDINATE_SIZE};

/// COSE algorithm identifier of ECDSA w/ SHA-256 over P-256.
pub const ES256: i128 = -7;

const SIGNATURE1_CONTEXT: &str = "Signature1";

/// Encodes `Sig_structure = ["Signature1", protected, external_aad, payload]`
/// with an empty `external_aad`.
///
/// The protected header goes in as received; re-encoding the decoded map
/// could reorder or resize it and change what gets hashed.
pub fn signing_input(message: &SignedMessage) -> Result<Vec<u8>, serde_cbor::Error> {
    serde_cbor::to_vec(&Value::Array(vec![
        Value::Text(SIGNATURE1_CONTEXT.to_string()),
        Value::Bytes(message.protected_bytes().to_vec()),
        Value::Bytes(Vec::new()),
        Value::Bytes(message.payload().to_vec()),
    ]))
}

/// Checks the ES256 signature of `message` against `key`.
///
/// `Ok(false)` means the signature does not authenticate the message.
/// Errors are kept for problems that make the check itself meaningless:
/// unusable key material, a non ES256 `alg` header or a signature that is
/// not `r || s`.
pub fn verify(key: &PublicKeyMaterial, message: &SignedMessage) -> Result<bool, VerificationError> {
    let verifying_key = key.verifying_key()?;

    if let Some(alg) = message.algorithm() {
        if alg != ES256 {
            return Err(VerificationError::UnsupportedAlgorithm(alg));
        }
    }

    let raw = message.signature();
    if raw.len() != 2 * COORDINATE_SIZE {
        return Err(VerificationError::SignatureLength {
            expected: 2 * COORDINATE_SIZE,
            actual: raw.len(),
        });
    }
    // A zero or out of range scalar can't be a signature of anything.
    let signature = match Signature::from_slice(raw) {
        Ok(signature) => signature,
        Err(_) => return Ok(false),
    };

    let input = signing_input(message)
        .map_err(|e| VerificationError::SigStructure(e.to_string()))?;
    let digest = Sha256::digest(input);
    let valid = verifying_key
        .verify_prehash(digest.as_slice(), &signature)
        .is_ok();
    tracing::debug!(valid, "checked ES256 signature");
    Ok(valid)
}
