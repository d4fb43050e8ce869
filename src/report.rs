use std::io::{self, Write};

use chrono::{DateTime, Utc};
use hc1verify::{Claim, Inspection, PublicKeyMaterial};
use serde_cbor::Value;
use serde_json::{json, Map, Value as Json};

pub const EXIT_VALID: u8 = 0;
pub const EXIT_INVALID: u8 = 1;
pub const EXIT_UNREADABLE: u8 = 2;

const DATE_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";
const RULE: &str =
    "---------------------------------------------------------------------------------------------";

fn label(claim: Claim) -> &'static str {
    match claim {
        Claim::Issuer => "Issuer",
        Claim::IssuedAt => "Issued At",
        Claim::Expiration => "Expiration Time",
        Claim::HealthClaims => "Health Claims",
    }
}

/// 0 when the signature is valid and the claims are complete, 1 when the
/// token decoded but either branch failed. 2 is left to decode failures.
pub fn exit_status(inspection: &Inspection) -> u8 {
    match (&inspection.verification, &inspection.claims) {
        (Ok(true), Ok(_)) => EXIT_VALID,
        _ => EXIT_INVALID,
    }
}

fn date(instant: &DateTime<Utc>) -> String {
    instant.format(DATE_FORMAT).to_string()
}

fn validity(inspection: &Inspection) -> String {
    match &inspection.verification {
        Ok(valid) => valid.to_string(),
        Err(err) => format!("error ({})", err),
    }
}

pub fn write_text<W: Write>(
    out: &mut W,
    inspection: &Inspection,
    key: &PublicKeyMaterial,
) -> io::Result<()> {
    writeln!(out, "Decoding and validating your token with given certificate...")?;
    writeln!(out, "{}", RULE)?;
    match &inspection.claims {
        Ok(claims) => {
            let body = cbor_to_json(&Value::Map(claims.health_claims.clone()));
            let body = serde_json::to_string_pretty(&body).map_err(io::Error::from)?;
            writeln!(out, "{}", body)?;
            writeln!(out, "{}", RULE)?;
            if let Ok(Some(cert)) = claims.certificate() {
                writeln!(out, "Holder: {} ({})", cert.holder(), cert.dob)?;
            }
            writeln!(out, "{}: {}", label(Claim::Issuer), claims.issuer)?;
            writeln!(out, "{}: {}", label(Claim::IssuedAt), date(&claims.issued_at))?;
            writeln!(out, "{}: {}", label(Claim::Expiration), date(&claims.expires_at))?;
        }
        Err(err) => {
            writeln!(out, "[Failure] {}", err)?;
            writeln!(out, "{}", RULE)?;
        }
    }
    writeln!(
        out,
        "Is valid: {} - Validation Key: {}",
        validity(inspection),
        hex::encode_upper(key.key_id())
    )?;
    if let Some(matches) = inspection.key_id_matches {
        writeln!(out, "Token kid matches: {}", matches)?;
    }
    writeln!(out, "{}", RULE)
}

pub fn to_json(inspection: &Inspection, key: &PublicKeyMaterial) -> Json {
    let claims = match &inspection.claims {
        Ok(claims) => {
            let mut object = Map::new();
            object.insert(label(Claim::Issuer).into(), json!(claims.issuer));
            object.insert(
                label(Claim::IssuedAt).into(),
                json!(claims.issued_at.to_rfc3339()),
            );
            object.insert(
                label(Claim::Expiration).into(),
                json!(claims.expires_at.to_rfc3339()),
            );
            object.insert(
                label(Claim::HealthClaims).into(),
                cbor_to_json(&Value::Map(claims.health_claims.clone())),
            );
            Json::Object(object)
        }
        Err(err) => json!({ "error": err.to_string() }),
    };
    let verification = match &inspection.verification {
        Ok(valid) => json!({ "valid": valid }),
        Err(err) => json!({ "error": err.to_string() }),
    };

    json!({
        "claims": claims,
        "verification": verification,
        "key_id": hex::encode_upper(key.key_id()),
        "key_id_matches": inspection.key_id_matches,
    })
}

/// JSON rendering of a CBOR value. Byte strings become hex, non text keys
/// are stringified.
pub fn cbor_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(i) => match i64::try_from(*i) {
            Ok(i) => Json::from(i),
            Err(_) => Json::String(i.to_string()),
        },
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Bytes(bytes) => Json::String(hex::encode(bytes)),
        Value::Text(text) => Json::String(text.clone()),
        Value::Array(items) => Json::Array(items.iter().map(cbor_to_json).collect()),
        Value::Map(entries) => {
            let mut object = Map::new();
            for (key, value) in entries {
                let key = match key {
                    Value::Text(text) => text.clone(),
                    other => match cbor_to_json(other) {
                        Json::String(s) => s,
                        json => json.to_string(),
                    },
                };
                object.insert(key, cbor_to_json(value));
            }
            Json::Object(object)
        }
        Value::Tag(_, inner) => cbor_to_json(inner),
        _ => Json::Null,
    }
}
