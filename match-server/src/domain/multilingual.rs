//! Localised names stored as JSON objects in the database.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A name keyed by localisation, e.g. `{"fi": "Iso Roobertinkatu", "sv": "Stora Robertsgatan"}`.
///
/// Mirrors the jsonb `name` columns of `infrastructure_link` and
/// `public_transport_stop`. Individual localisations may be null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultilingualString {
    values: BTreeMap<String, Option<String>>,
}

impl MultilingualString {
    pub fn new(values: BTreeMap<String, Option<String>>) -> Self {
        Self { values }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.values.get(locale).and_then(|v| v.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse from the textual form of a jsonb column value.
    pub fn from_json_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
