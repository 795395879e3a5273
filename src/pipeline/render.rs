// src/pipeline/render.rs

//! Alert rendering.
//!
//! Turns classified records into the plain-text report posted to channels.
//! Rendering is pure; chunking and transport live elsewhere.

use crate::error::{AppError, Result};
use crate::models::{ClassifiedRecord, ExposureRecord, SourceId};

/// Render one record as `"Label: value"` lines terminated by a blank line,
/// in the source schema's canonical field order.
///
/// Only schema fields are ever emitted. A missing field means an upstream
/// contract was broken and is reported as an error rather than papered over.
pub fn render_record(record: &ExposureRecord) -> Result<String> {
    let schema = record.source.schema();
    let mut block = String::new();

    for spec in schema.fields {
        // a normalized record carries every schema field; a hole means the
        // record bypassed normalization
        if !record.has_field(spec.name) {
            return Err(AppError::render(record.source.name(), spec.name));
        }
        block.push_str(spec.label);
        block.push_str(": ");
        block.push_str(record.field(spec.name));
        block.push('\n');
    }

    block.push('\n');
    Ok(block)
}

/// Assemble the full report body from per-source alert blocks.
///
/// Sources appear in the order given; sources with no alerts are skipped
/// entirely. Each section opens with a `*Title*` heading followed by its
/// record blocks.
pub fn render_report(sections: &[(SourceId, Vec<String>)]) -> String {
    let mut body = String::new();

    for (source, blocks) in sections {
        if blocks.is_empty() {
            continue;
        }
        body.push('*');
        body.push_str(source.schema().title);
        body.push_str("*\n\n");
        for block in blocks {
            body.push_str(block);
        }
    }

    body.trim_end().to_string()
}

/// Render the alert blocks for the records that should notify.
pub fn render_alerts(records: &[ClassifiedRecord]) -> Result<Vec<String>> {
    records
        .iter()
        .map(|classified| render_record(&classified.record))
        .collect()
}
