use std::fmt;

use serde::{de::IgnoredAny, Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(PatientId);

/// A patient as returned by the remote collection.
///
/// Records never carry a password; the field is write-only on the wire.
/// Decoding is lenient so that one odd record cannot fail a whole listing:
/// `_id` wins over `id` when both are sent, whole-number ages are kept
/// as-is (negatives included) and any other age is read as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPatientRecord")]
pub struct PatientRecord {
    #[serde(rename = "_id")]
    pub id: PatientId,
    pub name: String,
    pub age: Option<i64>,
    pub ailment: String,
    pub email: String,
}

#[derive(Deserialize)]
struct RawPatientRecord {
    #[serde(rename = "_id", default)]
    mongo_id: Option<RawId>,
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    age: Option<RawAge>,
    #[serde(default)]
    ailment: String,
    #[serde(default)]
    email: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for PatientId {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAge {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl RawAge {
    fn into_age(self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(value),
            Self::Float(value) => integral(value),
            Self::Text(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(integral))
            }
            Self::Other(_) => None,
        }
    }
}

/// `value` as an `i64` when it is a whole number inside the `i64` range.
fn integral(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

#[derive(Debug)]
pub struct MissingPatientId;

impl fmt::Display for MissingPatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("patient record has neither `_id` nor `id`")
    }
}

impl TryFrom<RawPatientRecord> for PatientRecord {
    type Error = MissingPatientId;

    fn try_from(raw: RawPatientRecord) -> Result<Self, Self::Error> {
        let id = raw.mongo_id.or(raw.id).ok_or(MissingPatientId)?;
        Ok(Self {
            id: id.into(),
            name: raw.name,
            age: raw.age.and_then(RawAge::into_age),
            ailment: raw.ailment,
            email: raw.email,
        })
    }
}
