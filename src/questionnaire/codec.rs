//! Serialization of individual answers for transit between steps.
//!
//! Every step receives and forwards a flat mapping of field name to string.
//! Scalars travel as plain text (numbers as decimal text) and collections as
//! JSON arrays. Decoding is lenient: malformed input is logged and replaced by
//! the field's empty default so a step can always be entered.

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;

pub const DIETARY_RESTRICTIONS: &str = "dietaryRestrictions";
pub const WEIGHT: &str = "weight";
pub const HEIGHT: &str = "height";
pub const AGE: &str = "age";
pub const BIOLOGICAL_SEX: &str = "biologicalSex";
pub const PHYSICAL_ACTIVITY: &str = "physicalActivity";
pub const HEALTH_CONDITIONS: &str = "healthConditions";

/// Wire keys in flow order.
pub const FIELD_ORDER: [&str; 7] = [
    DIETARY_RESTRICTIONS,
    WEIGHT,
    HEIGHT,
    AGE,
    BIOLOGICAL_SEX,
    PHYSICAL_ACTIVITY,
    HEALTH_CONDITIONS,
];

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("field `{field}` is not a JSON array of strings: {source}")]
    InvalidList {
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("parameter mapping is not a JSON object of strings: {0}")]
    InvalidParams(#[source] serde_json::Error),
}

/// Flat parameter mapping threaded from step to step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    fields: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses a JSON object whose values are all strings.
    pub fn from_json(raw: &str) -> Result<Self, CodecError> {
        let fields: BTreeMap<String, String> =
            serde_json::from_str(raw).map_err(CodecError::InvalidParams)?;
        Ok(Self { fields })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_else(|_| "{}".into())
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

pub fn encode_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".into())
}

/// Strict list decoding; absent input decodes to an empty list.
pub fn try_decode_list(field: &str, raw: Option<&str>) -> Result<Vec<String>, CodecError> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) if text.trim().is_empty() => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).map_err(|source| CodecError::InvalidList {
            field: field.to_string(),
            source,
        }),
    }
}

/// Lenient list decoding used on step entry.
pub fn decode_list(field: &str, raw: Option<&str>) -> Vec<String> {
    try_decode_list(field, raw).unwrap_or_else(|err| {
        tracing::warn!(%err, "discarding malformed upstream field");
        Vec::new()
    })
}

pub fn decode_number<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|text| !text.is_empty())
        .and_then(|text| text.parse::<T>().ok())
}

/// Canonical measurements travel with a single decimal place.
pub fn encode_measurement(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_default()
}
