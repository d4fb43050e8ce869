//! Decoding and ES256 verification of HC1 health certificate tokens.
//!
//! An HC1 token is Base45 text wrapping a zlib stream, wrapping a
//! COSE_Sign1 message whose payload is a CWT. Decoding goes through
//! [`text`], [`inflate`] and [`cose`]; from the parsed [`SignedMessage`]
//! the signature check ([`verify()`]) and claim extraction
//! ([`decode_payload`] then [`extract_claims`]) are independent, so a token
//! can fail one and still pass the other.

pub mod claims;
pub mod cose;
pub mod error;
pub mod eudcc;
pub mod inflate;
pub mod keys;
pub mod payload;
pub mod text;
pub mod verify;

pub use crate::claims::{extract_claims, Claim, HealthCertificateClaims};
pub use crate::cose::SignedMessage;
pub use crate::error::{
    CertificateError, ClaimError, DecodeError, Error, Stage, VerificationError,
};
pub use crate::keys::{Curve, PublicKeyMaterial};
pub use crate::payload::{decode_payload, Payload};
pub use crate::verify::verify;

pub const HC1_PREFIX: &str = "HC1:";

/// Trims `data` and drops an optional `HC1:` prefix.
pub fn strip_scheme(data: &str) -> &str {
    let data = data.trim();
    data.strip_prefix(HC1_PREFIX).unwrap_or(data)
}

/// Base45 text to parsed COSE_Sign1 message. No signature check happens here.
pub fn decode_token(token: &str) -> Result<SignedMessage, DecodeError> {
    let compressed = text::decode(token)?;
    let cbor = inflate::inflate(&compressed)?;
    SignedMessage::from_slice(&cbor)
}

/// Payload decoding plus claim extraction.
pub fn claims(message: &SignedMessage) -> Result<HealthCertificateClaims, Error> {
    let payload = decode_payload(message.payload())?;
    Ok(extract_claims(&payload)?)
}

/// Outcome of checking one token against one key.
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub message: SignedMessage,
    pub verification: Result<bool, VerificationError>,
    pub claims: Result<HealthCertificateClaims, Error>,
    /// `None` when the token carries no `kid` header.
    pub key_id_matches: Option<bool>,
}

/// Decodes `token` and runs both the signature check and claim extraction.
///
/// Only decode failures up to the envelope are returned as `Err`; the two
/// branches after it are reported side by side in the [`Inspection`].
pub fn inspect(token: &str, key: &PublicKeyMaterial) -> Result<Inspection, DecodeError> {
    let message = decode_token(token)?;
    let verification = verify(key, &message);
    let claims = claims(&message);
    let key_id_matches = message.key_id().map(|kid| kid == &key.key_id()[..]);

    Ok(Inspection {
        message,
        verification,
        claims,
        key_id_matches,
    })
}
