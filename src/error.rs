use std::fmt;

use thiserror::Error;

/// Decode stage a [`DecodeError`] was raised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Text,
    Inflate,
    Envelope,
    Payload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Text => "text",
            Stage::Inflate => "inflate",
            Stage::Envelope => "envelope",
            Stage::Payload => "payload",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid base45 character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("invalid base45 length {length}")]
    InvalidLength { length: usize },
    #[error("can't inflate token: {0}")]
    Inflate(String),
    #[error("malformed COSE_Sign1 envelope: {0}")]
    MalformedEnvelope(String),
    #[error("malformed CWT payload: {0}")]
    MalformedPayload(String),
}

impl DecodeError {
    pub fn stage(&self) -> Stage {
        match self {
            DecodeError::InvalidCharacter { .. } | DecodeError::InvalidLength { .. } => Stage::Text,
            DecodeError::Inflate(_) => Stage::Inflate,
            DecodeError::MalformedEnvelope(_) => Stage::Envelope,
            DecodeError::MalformedPayload(_) => Stage::Payload,
        }
    }
}

/// Failures of the signature check that are not a plain "does not match".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("invalid public key: {0}")]
    KeyInvalid(String),
    #[error("unsupported signature algorithm {0}")]
    UnsupportedAlgorithm(i128),
    #[error("signature must be {expected} bytes, got {actual}")]
    SignatureLength { expected: usize, actual: usize },
    #[error("can't encode Sig_structure: {0}")]
    SigStructure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimError {
    #[error("claim {0} is missing")]
    MissingKey(i128),
    #[error("claim {key} must be {expected}")]
    InvalidType { key: i128, expected: &'static str },
    #[error("claim {key} holds out of range timestamp {value}")]
    InvalidTimestamp { key: i128, value: i128 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificateError {
    #[error("can't parse PEM: {0}")]
    Pem(String),
    #[error("can't parse X.509 certificate: {0}")]
    Der(String),
    #[error("certificate key is not a P-256 EC key")]
    UnsupportedKey,
    #[error(transparent)]
    Key(#[from] VerificationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{} stage: {0}", .0.stage())]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error(transparent)]
    Claim(#[from] ClaimError),
}
