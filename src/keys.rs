//! Public key material of a document signer certificate (DSC).

use std::fmt;

use p256::ecdsa::VerifyingKey;
use p256::{EncodedPoint, FieldBytes};
use sha2::{Digest, Sha256};

use crate::error::{CertificateError, VerificationError};

pub const COORDINATE_SIZE: usize = 32;
pub const KEY_ID_SIZE: usize = 8;

const OID_EC_P256: &str = "1.2.840.10045.3.1.7";

/// Curves of the COSE EC2 key type. Only P-256 backs ES256.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    P256,
    P384,
    P521,
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Curve::P256 => "P-256",
            Curve::P384 => "P-384",
            Curve::P521 => "P-521",
        })
    }
}

/// Raw key material handed to the verifier.
///
/// Nothing is validated on construction; [`PublicKeyMaterial::verifying_key`]
/// reports bad material as [`VerificationError::KeyInvalid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyMaterial {
    curve: Curve,
    x: Vec<u8>,
    y: Vec<u8>,
    key_id: [u8; KEY_ID_SIZE],
}

impl PublicKeyMaterial {
    pub fn new(curve: Curve, x: Vec<u8>, y: Vec<u8>, key_id: [u8; KEY_ID_SIZE]) -> Self {
        PublicKeyMaterial {
            curve,
            x,
            y,
            key_id,
        }
    }

    /// Splits an uncompressed SEC1 P-256 point (`04 || x || y`).
    pub fn from_sec1_point(
        point: &[u8],
        key_id: [u8; KEY_ID_SIZE],
    ) -> Result<Self, VerificationError> {
        match point.split_first() {
            Some((0x04, coordinates)) if coordinates.len() == 2 * COORDINATE_SIZE => {
                let (x, y) = coordinates.split_at(COORDINATE_SIZE);
                Ok(PublicKeyMaterial::new(
                    Curve::P256,
                    x.to_vec(),
                    y.to_vec(),
                    key_id,
                ))
            }
            _ => Err(VerificationError::KeyInvalid(format!(
                "expected a {} byte uncompressed point, got {} bytes",
                1 + 2 * COORDINATE_SIZE,
                point.len()
            ))),
        }
    }

    /// Loads the key of a PEM or DER encoded X.509 certificate.
    ///
    /// The key id is the first 8 bytes of the SHA-256 fingerprint of the
    /// DER certificate.
    pub fn from_certificate(data: &[u8]) -> Result<Self, CertificateError> {
        let der = if data.windows(10).any(|w| w == b"-----BEGIN") {
            let (_, pem) = x509_parser::pem::parse_x509_pem(data)
                .map_err(|e| CertificateError::Pem(e.to_string()))?;
            pem.contents
        } else {
            data.to_vec()
        };

        let (_, cert) = x509_parser::parse_x509_certificate(&der)
            .map_err(|e| CertificateError::Der(e.to_string()))?;
        let spki = cert.public_key();
        let curve = spki
            .algorithm
            .parameters
            .as_ref()
            .and_then(|params| params.as_oid().ok())
            .map(|oid| oid.to_id_string());
        if curve.as_deref() != Some(OID_EC_P256) {
            return Err(CertificateError::UnsupportedKey);
        }

        let fingerprint = Sha256::digest(&der);
        let mut key_id = [0u8; KEY_ID_SIZE];
        key_id.copy_from_slice(&fingerprint[..KEY_ID_SIZE]);

        let key = PublicKeyMaterial::from_sec1_point(&spki.subject_public_key.data, key_id)?;
        tracing::debug!(
            subject = %cert.subject(),
            key_id = %hex::encode_upper(key_id),
            "loaded signer certificate"
        );
        Ok(key)
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn x(&self) -> &[u8] {
        &self.x
    }

    pub fn y(&self) -> &[u8] {
        &self.y
    }

    pub fn key_id(&self) -> &[u8; KEY_ID_SIZE] {
        &self.key_id
    }

    /// Builds the ECDSA verifying key, checking curve, coordinate sizes
    /// and that the point lies on the curve.
    pub fn verifying_key(&self) -> Result<VerifyingKey, VerificationError> {
        if self.curve != Curve::P256 {
            return Err(VerificationError::KeyInvalid(format!(
                "{} key can't verify ES256",
                self.curve
            )));
        }
        if self.x.len() != COORDINATE_SIZE || self.y.len() != COORDINATE_SIZE {
            return Err(VerificationError::KeyInvalid(format!(
                "coordinates must be {} bytes, got {} and {}",
                COORDINATE_SIZE,
                self.x.len(),
                self.y.len()
            )));
        }

        let point = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(&self.x),
            FieldBytes::from_slice(&self.y),
            false,
        );
        VerifyingKey::from_encoded_point(&point)
            .map_err(|_| VerificationError::KeyInvalid("point is not on P-256".into()))
    }
}
