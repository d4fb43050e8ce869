//! EU Digital COVID Certificate (DCC) v1 schema, as carried in `hcert`.

use std::collections::BTreeMap;

use serde_cbor::value::from_value;
use serde_cbor::Value;
use serde_derive::Deserialize;

/// Key of the EU DCC v1 entry inside the `hcert` claim.
pub const DCC_V1: i128 = 1;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Vaccination {
    pub tg: String,
    pub vp: String,
    pub mp: String,
    pub ma: String,
    pub dn: i32,
    pub sd: i32,
    pub dt: String,
    pub co: String,
    pub is: String,
    pub ci: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Test {
    pub tg: String,
    pub tt: String,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub ma: Option<String>,
    pub sc: String,
    pub tr: String,
    #[serde(default)]
    pub tc: Option<String>,
    pub co: String,
    pub is: String,
    pub ci: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Recovery {
    pub tg: String,
    pub fr: String,
    pub co: String,
    pub is: String,
    pub df: String,
    pub du: String,
    pub ci: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Name {
    #[serde(rename = "fn", default)]
    pub fn_: Option<String>,
    pub fnt: String,
    #[serde(default)]
    pub gn: Option<String>,
    #[serde(default)]
    pub gnt: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Certificate {
    pub nam: Name,
    pub dob: String,
    #[serde(default)]
    pub v: Vec<Vaccination>,
    #[serde(default)]
    pub t: Vec<Test>,
    #[serde(default)]
    pub r: Vec<Recovery>,
    pub ver: String,
}

impl Certificate {
    /// Reads the DCC v1 entry of an `hcert` map; `Ok(None)` when absent.
    pub fn from_health_claims(
        hcert: &BTreeMap<Value, Value>,
    ) -> Result<Option<Certificate>, serde_cbor::Error> {
        match hcert.get(&Value::Integer(DCC_V1)) {
            Some(dcc) => from_value(dcc.clone()).map(Some),
            None => Ok(None),
        }
    }

    /// "Family, Given" as printed on the certificate, transliterated
    /// names as fallback.
    pub fn holder(&self) -> String {
        let family = self.nam.fn_.as_deref().unwrap_or(&self.nam.fnt);
        match self.nam.gn.as_deref().or(self.nam.gnt.as_deref()) {
            Some(given) => format!("{}, {}", family, given),
            None => family.to_string(),
        }
    }
}
