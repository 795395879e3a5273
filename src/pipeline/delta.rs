// src/pipeline/delta.rs

//! Delta classification against the history store.
//!
//! Each record of a freshly normalized batch is looked up by natural key and
//! classified as new, unchanged, or updated. The key deliberately excludes
//! free-text advisory fields: publishers revise those in place, and a wording
//! tweak is not a new exposure event.

use crate::error::Result;
use crate::models::{Classification, ClassifiedRecord, ExposureRecord, SourceStats};
use crate::store::HistoryStore;

/// Classifies one source's batch and applies the matching store mutations.
#[derive(Debug, Clone, Copy)]
pub struct DeltaEngine {
    /// Whether mutable-field-only changes produce a user alert
    notify_on_update: bool,
}

impl DeltaEngine {
    pub fn new(notify_on_update: bool) -> Self {
        Self { notify_on_update }
    }

    /// Classify a batch in adapter order, recording each outcome in the
    /// store: inserts for new keys, `touch` for unchanged ones, mutable-field
    /// updates for revised ones.
    pub fn classify_batch(
        &self,
        store: &HistoryStore,
        records: Vec<ExposureRecord>,
        run_timestamp: i64,
    ) -> Result<Vec<ClassifiedRecord>> {
        let mut classified = Vec::with_capacity(records.len());

        for record in records {
            let classification = match store.find(&record)? {
                None => {
                    store.insert(&record, run_timestamp)?;
                    Classification::New
                }
                Some(entry) => {
                    if entry.mutable == record.mutable_values() {
                        store.touch(record.source, entry.id, run_timestamp)?;
                        Classification::Unchanged
                    } else {
                        store.update_mutable(&record, entry.id, run_timestamp)?;
                        Classification::Updated
                    }
                }
            };

            classified.push(ClassifiedRecord {
                classification,
                record,
            });
        }

        Ok(classified)
    }

    /// Whether a classification produces a user-visible alert.
    ///
    /// New records always alert; updated ones only under the per-source
    /// policy flag.
    pub fn should_notify(&self, classification: Classification) -> bool {
        match classification {
            Classification::New => true,
            Classification::Updated => self.notify_on_update,
            Classification::Unchanged => false,
        }
    }

    /// The subset of a classified batch that should alert, order preserved.
    pub fn notifiable(&self, classified: &[ClassifiedRecord]) -> Vec<ClassifiedRecord> {
        classified
            .iter()
            .filter(|c| self.should_notify(c.classification))
            .cloned()
            .collect()
    }
}

/// Tally a classified batch into per-source stats.
pub fn tally(classified: &[ClassifiedRecord]) -> SourceStats {
    let mut stats = SourceStats::default();
    for c in classified {
        stats.record(c.classification);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawRecord, SourceId};
    use crate::normalize::normalize_batch;
    use tempfile::TempDir;

    fn open_store(tmp: &TempDir) -> HistoryStore {
        HistoryStore::open(tmp.path().join("exposures.db")).unwrap()
    }

    fn cafe_batch() -> Vec<ExposureRecord> {
        let raw: RawRecord = [
            ("date_time", "10:00 1/1/2024"),
            ("suburb", "Perth"),
            ("location", "Cafe X"),
            ("updated", "1/1/2024"),
            ("advice", "Get tested"),
        ]
        .into_iter()
        .collect();
        normalize_batch(SourceId::WaHealth, &[raw])
    }

    #[test]
    fn test_first_sighting_is_new() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        let engine = DeltaEngine::new(false);

        let classified = engine.classify_batch(&store, cafe_batch(), 100).unwrap();

        assert_eq!(classified.len(), 1);
        assert_eq!(classified[0].classification, Classification::New);

        let entry = store.find(&classified[0].record).unwrap().unwrap();
        assert_eq!(entry.first_seen, 100);
        assert_eq!(entry.last_seen, 100);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        let engine = DeltaEngine::new(false);

        engine.classify_batch(&store, cafe_batch(), 100).unwrap();
        let second = engine.classify_batch(&store, cafe_batch(), 200).unwrap();

        assert!(
            second
                .iter()
                .all(|c| c.classification == Classification::Unchanged)
        );
        assert_eq!(store.count(SourceId::WaHealth).unwrap(), 1);

        let entry = store.find(&second[0].record).unwrap().unwrap();
        assert_eq!(entry.first_seen, 100);
        assert_eq!(entry.last_seen, 200);
    }

    #[test]
    fn test_mutable_change_is_updated_not_new() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        let engine = DeltaEngine::new(false);

        engine.classify_batch(&store, cafe_batch(), 100).unwrap();

        let mut revised = cafe_batch();
        revised[0].set_field("advice", "Get tested and isolate".into());
        let classified = engine.classify_batch(&store, revised, 200).unwrap();

        assert_eq!(classified[0].classification, Classification::Updated);
        // still one row: the event identity did not change
        assert_eq!(store.count(SourceId::WaHealth).unwrap(), 1);

        let entry = store.find(&classified[0].record).unwrap().unwrap();
        assert_eq!(entry.first_seen, 100);
        assert_eq!(entry.last_seen, 200);
        assert_eq!(entry.mutable[1], "Get tested and isolate");
    }

    #[test]
    fn test_key_field_change_is_a_new_event() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        let engine = DeltaEngine::new(false);

        engine.classify_batch(&store, cafe_batch(), 100).unwrap();

        let mut moved = cafe_batch();
        moved[0].set_field("location", "Cafe Y".into());
        let classified = engine.classify_batch(&store, moved, 200).unwrap();

        assert_eq!(classified[0].classification, Classification::New);
        assert_eq!(store.count(SourceId::WaHealth).unwrap(), 2);
    }

    #[test]
    fn test_notify_policy_gates_updated_records() {
        let silent = DeltaEngine::new(false);
        let chatty = DeltaEngine::new(true);

        assert!(silent.should_notify(Classification::New));
        assert!(!silent.should_notify(Classification::Updated));
        assert!(!silent.should_notify(Classification::Unchanged));

        assert!(chatty.should_notify(Classification::Updated));
        assert!(!chatty.should_notify(Classification::Unchanged));
    }

    #[test]
    fn test_batch_order_is_preserved() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        let engine = DeltaEngine::new(false);

        let raws: Vec<RawRecord> = ["Reid Library", "Oak Lawn", "Guild Village"]
            .iter()
            .map(|loc| {
                [("date", "1/1/2024"), ("time", "10:00"), ("location", *loc)]
                    .into_iter()
                    .collect()
            })
            .collect();
        let batch = normalize_batch(SourceId::Uwa, &raws);
        let classified = engine.classify_batch(&store, batch, 100).unwrap();

        let locations: Vec<&str> = classified
            .iter()
            .map(|c| c.record.field("location"))
            .collect();
        assert_eq!(locations, vec!["Reid Library", "Oak Lawn", "Guild Village"]);
    }

    #[test]
    fn test_tally() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);
        let engine = DeltaEngine::new(false);

        engine.classify_batch(&store, cafe_batch(), 100).unwrap();
        let second = engine.classify_batch(&store, cafe_batch(), 200).unwrap();
        let stats = tally(&second);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(stats.new, 0);
    }
}
