// src/normalize.rs

//! Field canonicalization.
//!
//! Scraped cell text arrives with non-breaking spaces, embedded line breaks
//! and uneven whitespace. Delta classification compares canonical strings by
//! byte equality, so the same raw input must always canonicalize to the same
//! output.

use std::collections::HashMap;

use crate::models::{ExposureRecord, RawRecord, SourceId};

/// Canonicalize one raw field value.
///
/// Strips U+00A0, trims every embedded line, rejoins lines with `", "`, then
/// collapses the separator runs that empty lines leave behind.
pub fn canonicalize(raw: &str) -> String {
    let joined = raw
        .replace('\u{a0}', "")
        .replace('\r', "\n")
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(", ");

    joined
        .trim_matches([',', ' '])
        .replace(", , ", "; ")
        .replace(" , ", " ")
}

/// Canonicalize every schema field of a raw record.
pub fn normalize_record(source: SourceId, raw: &RawRecord) -> ExposureRecord {
    let fields: HashMap<String, String> = source
        .schema()
        .fields
        .iter()
        .map(|spec| (spec.name.to_string(), canonicalize(raw.get(spec.name))))
        .collect();
    ExposureRecord::new(source, fields)
}

/// Canonicalize a scrape batch, keeping adapter order.
///
/// Natural keys must be unique within a batch before they reach the delta
/// engine. A source may legitimately report the same key twice (several time
/// ranges at one location); repeats get an occurrence marker appended to the
/// last key field, turning them into distinct synthetic keys.
pub fn normalize_batch(source: SourceId, raws: &[RawRecord]) -> Vec<ExposureRecord> {
    let mut seen: HashMap<Vec<String>, usize> = HashMap::new();
    let mut records = Vec::with_capacity(raws.len());

    for raw in raws {
        let mut record = normalize_record(source, raw);

        let count = seen.entry(record.natural_key()).or_insert(0);
        *count += 1;
        let occurrence = *count;

        if occurrence > 1 {
            if let Some(last_key) = source.schema().key_fields.last() {
                let marked = format!("{} #{}", record.field(last_key), occurrence);
                record.set_field(last_key, marked);
                // A later record could carry the marked key verbatim.
                *seen.entry(record.natural_key()).or_insert(0) += 1;
            }
        }

        records.push(record);
    }

    records
}
