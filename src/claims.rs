//! Semantic claims of an HC1 CWT.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde_cbor::Value;

use crate::error::ClaimError;
use crate::eudcc::Certificate;
use crate::payload::Payload;

/// Claims read from the CWT payload, with their CWT claim keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Issuer,
    IssuedAt,
    Expiration,
    HealthClaims,
}

impl Claim {
    /// Lookup order used by [`extract_claims`].
    pub const ALL: [Claim; 4] = [
        Claim::Issuer,
        Claim::IssuedAt,
        Claim::Expiration,
        Claim::HealthClaims,
    ];

    pub const fn key(self) -> i128 {
        match self {
            Claim::Issuer => 1,
            Claim::IssuedAt => 6,
            Claim::Expiration => 4,
            Claim::HealthClaims => -260,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthCertificateClaims {
    pub issuer: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// The `hcert` map, left uninterpreted.
    pub health_claims: BTreeMap<Value, Value>,
}

impl HealthCertificateClaims {
    /// Typed view of the EU DCC v1 entry of the `hcert` map, if any.
    pub fn certificate(&self) -> Result<Option<Certificate>, serde_cbor::Error> {
        Certificate::from_health_claims(&self.health_claims)
    }
}

pub fn extract_claims(payload: &Payload) -> Result<HealthCertificateClaims, ClaimError> {
    for claim in Claim::ALL.iter() {
        if payload.get(claim.key()).is_none() {
            return Err(ClaimError::MissingKey(claim.key()));
        }
    }

    let issuer = match lookup(payload, Claim::Issuer)? {
        Value::Text(issuer) => issuer.clone(),
        _ => return Err(invalid_type(Claim::Issuer, "a text string")),
    };
    let issued_at = timestamp(payload, Claim::IssuedAt)?;
    let expires_at = timestamp(payload, Claim::Expiration)?;
    let health_claims = match lookup(payload, Claim::HealthClaims)? {
        Value::Map(map) => map.clone(),
        _ => return Err(invalid_type(Claim::HealthClaims, "a map")),
    };

    Ok(HealthCertificateClaims {
        issuer,
        issued_at,
        expires_at,
        health_claims,
    })
}

fn lookup(payload: &Payload, claim: Claim) -> Result<&Value, ClaimError> {
    payload
        .get(claim.key())
        .ok_or(ClaimError::MissingKey(claim.key()))
}

fn invalid_type(claim: Claim, expected: &'static str) -> ClaimError {
    ClaimError::InvalidType {
        key: claim.key(),
        expected,
    }
}

// NumericDate, whole seconds since the epoch in UTC.
fn timestamp(payload: &Payload, claim: Claim) -> Result<DateTime<Utc>, ClaimError> {
    let value = match lookup(payload, claim)? {
        Value::Integer(value) => *value,
        _ => return Err(invalid_type(claim, "an integer")),
    };
    i64::try_from(value)
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .ok_or(ClaimError::InvalidTimestamp {
            key: claim.key(),
            value,
        })
}
