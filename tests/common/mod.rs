#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use hc1verify::cose::SignedMessage;
use hc1verify::verify::signing_input;
use hc1verify::PublicKeyMaterial;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use serde_cbor::Value;

pub const ISSUED_AT: i128 = 1_622_505_600;
pub const EXPIRES_AT: i128 = 1_654_041_600;
pub const KEY_ID: [u8; 8] = [0xD9, 0x19, 0x37, 0x5F, 0xC1, 0xE7, 0xB6, 0xB2];

pub fn signing_key() -> SigningKey {
    SigningKey::from_slice(&[0x5A; 32]).unwrap()
}

/// Private half of the certificate in `tests/data/dsc-p256.pem`.
pub fn dsc_signing_key() -> SigningKey {
    let scalar = hex::decode("842cdce13f30ed00985fdddcf5328c7ab9c5ab3cb794ac3ac605a473118cf4e4")
        .unwrap();
    SigningKey::from_slice(&scalar).unwrap()
}

pub fn other_signing_key() -> SigningKey {
    SigningKey::from_slice(&[0xA5; 32]).unwrap()
}

pub fn key_material(key: &SigningKey) -> PublicKeyMaterial {
    let point = key.verifying_key().to_encoded_point(false);
    PublicKeyMaterial::from_sec1_point(point.as_bytes(), KEY_ID).unwrap()
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn map(entries: Vec<(Value, Value)>) -> Value {
    Value::Map(entries.into_iter().collect())
}

pub fn dcc() -> Value {
    map(vec![
        (
            text("nam"),
            map(vec![
                (text("fn"), text("Mustermann")),
                (text("fnt"), text("MUSTERMANN")),
                (text("gn"), text("Erika")),
                (text("gnt"), text("ERIKA")),
            ]),
        ),
        (text("dob"), text("1964-08-12")),
        (
            text("v"),
            Value::Array(vec![map(vec![
                (text("tg"), text("840539006")),
                (text("vp"), text("1119349007")),
                (text("mp"), text("EU/1/20/1528")),
                (text("ma"), text("ORG-100030215")),
                (text("dn"), Value::Integer(2)),
                (text("sd"), Value::Integer(2)),
                (text("dt"), text("2021-05-29")),
                (text("co"), text("DE")),
                (text("is"), text("Robert Koch-Institut")),
                (text("ci"), text("URN:UVCI:01DE/IZ12345A/5CWLU12RNOB9RXSEOP6FG8#W")),
            ])]),
        ),
        (text("ver"), text("1.0.0")),
    ])
}

pub fn cwt() -> BTreeMap<Value, Value> {
    let mut claims = BTreeMap::new();
    claims.insert(Value::Integer(1), text("DE"));
    claims.insert(Value::Integer(6), Value::Integer(ISSUED_AT));
    claims.insert(Value::Integer(4), Value::Integer(EXPIRES_AT));
    claims.insert(Value::Integer(-260), map(vec![(Value::Integer(1), dcc())]));
    claims
}

/// Signs `payload` into a tagged COSE_Sign1 message, ES256 with a `kid`.
pub fn sign1(key: &SigningKey, payload: Vec<u8>) -> Vec<u8> {
    let protected = serde_cbor::to_vec(&map(vec![
        (Value::Integer(1), Value::Integer(-7)),
        (Value::Integer(4), Value::Bytes(KEY_ID.to_vec())),
    ]))
    .unwrap();

    let unsigned =
        SignedMessage::new(protected.clone(), BTreeMap::new(), payload.clone(), vec![]).unwrap();
    let signature: Signature = key.sign(&signing_input(&unsigned).unwrap());

    let envelope = serde_cbor::to_vec(&Value::Array(vec![
        Value::Bytes(protected),
        Value::Map(BTreeMap::new()),
        Value::Bytes(payload),
        Value::Bytes(signature.to_bytes().to_vec()),
    ]))
    .unwrap();

    // tag 18, COSE_Sign1
    let mut tagged = vec![0xd2];
    tagged.extend(envelope);
    tagged
}

/// Compresses and Base45 encodes a COSE message into token text.
pub fn token(cose: &[u8]) -> String {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(cose).unwrap();
    base45::encode(&encoder.finish().unwrap())
}

pub fn signed_token(key: &SigningKey, payload: &Value) -> String {
    token(&sign1(key, serde_cbor::to_vec(payload).unwrap()))
}
