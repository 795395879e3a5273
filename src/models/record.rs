//! Exposure record structures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::SourceId;

/// A record as handed over by a source adapter, before canonicalization.
///
/// Values may still carry scraped artifacts: non-breaking spaces, stray
/// line breaks, leading/trailing whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw field value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Get a raw field value, or empty string when the adapter omitted it.
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A canonicalized exposure record, ready for delta classification.
///
/// Field values have been through [`crate::normalize::canonicalize`], so
/// byte equality on them is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureRecord {
    pub source: SourceId,
    fields: HashMap<String, String>,
}

impl ExposureRecord {
    pub fn new(source: SourceId, fields: HashMap<String, String>) -> Self {
        Self { source, fields }
    }

    /// Canonical value of a field, empty string when absent.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    /// Whether the field is present at all (it may still be empty).
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Overwrite a field value. Used only for synthetic key disambiguation.
    pub(crate) fn set_field(&mut self, name: &str, value: String) {
        self.fields.insert(name.to_string(), value);
    }

    /// Values of the schema's key fields, in schema order.
    pub fn natural_key(&self) -> Vec<String> {
        self.source
            .schema()
            .key_fields
            .iter()
            .map(|name| self.field(name).to_string())
            .collect()
    }

    /// Values of the schema's tracked mutable fields, in schema order.
    pub fn mutable_values(&self) -> Vec<String> {
        self.source
            .schema()
            .mutable_fields
            .iter()
            .map(|name| self.field(name).to_string())
            .collect()
    }
}

/// How a record relates to the history store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// Natural key not seen before
    New,
    /// Key known, tracked mutable fields identical
    Unchanged,
    /// Key known, tracked mutable fields differ
    Updated,
}

/// A record together with its delta classification.
#[derive(Debug, Clone)]
pub struct ClassifiedRecord {
    pub classification: Classification,
    pub record: ExposureRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uwa_record(date: &str, time: &str, location: &str) -> ExposureRecord {
        ExposureRecord::new(
            SourceId::Uwa,
            HashMap::from([
                ("date".to_string(), date.to_string()),
                ("time".to_string(), time.to_string()),
                ("location".to_string(), location.to_string()),
            ]),
        )
    }

    #[test]
    fn test_natural_key_follows_schema_order() {
        let record = uwa_record("1/1/2024", "10:00 - 11:00", "Reid Library");
        assert_eq!(
            record.natural_key(),
            vec!["1/1/2024", "10:00 - 11:00", "Reid Library"]
        );
    }

    #[test]
    fn test_absent_field_reads_as_empty() {
        let record = ExposureRecord::new(SourceId::Uwa, HashMap::new());
        assert_eq!(record.field("location"), "");
        assert_eq!(record.natural_key(), vec!["", "", ""]);
    }

    #[test]
    fn test_mutable_values_empty_for_keyed_only_schema() {
        let record = uwa_record("1/1/2024", "10:00", "Reid Library");
        assert!(record.mutable_values().is_empty());
    }

    #[test]
    fn test_raw_record_from_pairs() {
        let raw: RawRecord = [("date", "1/1/2024"), ("time", "10:00")].into_iter().collect();
        assert_eq!(raw.get("date"), "1/1/2024");
        assert_eq!(raw.get("missing"), "");
    }
}
