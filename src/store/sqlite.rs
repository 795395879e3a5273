//! SQLite history store.
//!
//! One table per source schema. Columns are the schema's fields plus the
//! surrogate id and the first/last-seen stamps. Timestamps are unix seconds
//! throughout; the two stamp columns are compared and must never mix
//! representations.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params_from_iter};

use crate::error::Result;
use crate::models::{ExposureRecord, SourceId};

/// A previously seen record, as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Surrogate id, assigned on first insertion, immutable
    pub id: i64,
    pub first_seen: i64,
    pub last_seen: i64,
    /// Stored values of the schema's tracked mutable fields, schema order
    pub mutable: Vec<String>,
}

/// History of previously seen records across all sources.
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open the store, creating the file and any missing tables.
    ///
    /// Schema creation is idempotent and runs on every open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
        for source in SourceId::ALL {
            let schema = source.schema();
            let columns: Vec<String> = schema
                .fields
                .iter()
                .map(|f| format!("{} text", f.name))
                .collect();
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id integer PRIMARY KEY,
                    {},
                    first_seen integer,
                    last_seen integer
                )",
                schema.table,
                columns.join(",\n                    ")
            );
            conn.execute(&ddl, [])?;
        }
        Ok(())
    }

    /// Exact-match lookup by all natural-key fields.
    ///
    /// Key fields may be empty for some sources; empty strings compare like
    /// any other value.
    pub fn find(&self, record: &ExposureRecord) -> Result<Option<HistoryEntry>> {
        let schema = record.source.schema();

        let mut select = vec!["id", "first_seen", "last_seen"];
        select.extend(schema.mutable_fields);

        let conditions: Vec<String> = schema
            .key_fields
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{} = ?{}", name, i + 1))
            .collect();

        let sql = format!(
            "SELECT {} FROM {} WHERE {} LIMIT 1",
            select.join(", "),
            schema.table,
            conditions.join(" AND ")
        );

        let key = record.natural_key();
        let entry = self
            .conn
            .query_row(&sql, params_from_iter(key.iter()), |row| {
                let mut mutable = Vec::with_capacity(schema.mutable_fields.len());
                for i in 0..schema.mutable_fields.len() {
                    mutable.push(row.get::<_, Option<String>>(3 + i)?.unwrap_or_default());
                }
                Ok(HistoryEntry {
                    id: row.get(0)?,
                    first_seen: row.get(1)?,
                    last_seen: row.get(2)?,
                    mutable,
                })
            })
            .optional()?;

        Ok(entry)
    }

    /// Insert a newly seen record with `first_seen = last_seen = seen_at`.
    /// Returns the assigned surrogate id.
    pub fn insert(&self, record: &ExposureRecord, seen_at: i64) -> Result<i64> {
        let schema = record.source.schema();

        let columns: Vec<&str> = schema.fields.iter().map(|f| f.name).collect();
        let placeholders: Vec<String> =
            (1..=columns.len() + 2).map(|i| format!("?{i}")).collect();

        let sql = format!(
            "INSERT INTO {} ({}, first_seen, last_seen) VALUES ({})",
            schema.table,
            columns.join(", "),
            placeholders.join(", ")
        );

        let values: Vec<&str> = columns.iter().map(|name| record.field(name)).collect();
        let mut params: Vec<&dyn rusqlite::ToSql> = values
            .iter()
            .map(|value| value as &dyn rusqlite::ToSql)
            .collect();
        params.push(&seen_at);
        params.push(&seen_at);

        self.conn.execute(&sql, &params[..])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Advance `last_seen` only. `first_seen` and key fields never change.
    pub fn touch(&self, source: SourceId, id: i64, seen_at: i64) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET last_seen = ?1 WHERE id = ?2",
            source.schema().table
        );
        self.conn.execute(&sql, rusqlite::params![seen_at, id])?;
        Ok(())
    }

    /// Store new values for the tracked mutable fields and advance
    /// `last_seen`.
    pub fn update_mutable(&self, record: &ExposureRecord, id: i64, seen_at: i64) -> Result<()> {
        let schema = record.source.schema();
        if schema.mutable_fields.is_empty() {
            return self.touch(record.source, id, seen_at);
        }

        let assignments: Vec<String> = schema
            .mutable_fields
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{} = ?{}", name, i + 1))
            .collect();
        let n = schema.mutable_fields.len();

        let sql = format!(
            "UPDATE {} SET {}, last_seen = ?{} WHERE id = ?{}",
            schema.table,
            assignments.join(", "),
            n + 1,
            n + 2
        );

        let values = record.mutable_values();
        let mut params: Vec<&dyn rusqlite::ToSql> =
            values.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
        params.push(&seen_at);
        params.push(&id);

        self.conn.execute(&sql, &params[..])?;
        Ok(())
    }

    /// Number of history rows for a source.
    pub fn count(&self, source: SourceId) -> Result<i64> {
        let sql = format!("SELECT count(id) FROM {}", source.schema().table);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// Most recent `last_seen` stamp for a source, if any rows exist.
    pub fn latest_seen(&self, source: SourceId) -> Result<Option<i64>> {
        let sql = format!("SELECT max(last_seen) FROM {}", source.schema().table);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn record(source: SourceId, pairs: &[(&str, &str)]) -> ExposureRecord {
        ExposureRecord::new(
            source,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn open_store(tmp: &TempDir) -> HistoryStore {
        HistoryStore::open(tmp.path().join("exposures.db")).unwrap()
    }

    #[test]
    fn test_schema_creation_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("exposures.db");
        drop(HistoryStore::open(&path).unwrap());
        // reopening must not fail or clobber data
        let store = HistoryStore::open(&path).unwrap();
        for source in SourceId::ALL {
            assert_eq!(store.count(source).unwrap(), 0);
        }
    }

    #[test]
    fn test_insert_then_find() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);

        let rec = record(
            SourceId::Uwa,
            &[("date", "1/1/2024"), ("time", "10:00"), ("location", "Reid Library")],
        );
        let id = store.insert(&rec, 1_700_000_000).unwrap();

        let entry = store.find(&rec).unwrap().expect("entry should exist");
        assert_eq!(entry.id, id);
        assert_eq!(entry.first_seen, 1_700_000_000);
        assert_eq!(entry.last_seen, 1_700_000_000);
        assert!(entry.mutable.is_empty());
    }

    #[test]
    fn test_find_absent_key() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);

        let rec = record(
            SourceId::Uwa,
            &[("date", "2/2/2024"), ("time", "09:00"), ("location", "Oak Lawn")],
        );
        assert!(store.find(&rec).unwrap().is_none());
    }

    #[test]
    fn test_find_with_empty_key_fields() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);

        let rec = record(SourceId::Uwa, &[("date", ""), ("time", ""), ("location", "")]);
        assert!(store.find(&rec).unwrap().is_none());
        store.insert(&rec, 100).unwrap();
        assert!(store.find(&rec).unwrap().is_some());
    }

    #[test]
    fn test_touch_advances_last_seen_only() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);

        let rec = record(
            SourceId::Uwa,
            &[("date", "1/1/2024"), ("time", "10:00"), ("location", "Reid Library")],
        );
        let id = store.insert(&rec, 100).unwrap();
        store.touch(SourceId::Uwa, id, 200).unwrap();

        let entry = store.find(&rec).unwrap().unwrap();
        assert_eq!(entry.first_seen, 100);
        assert_eq!(entry.last_seen, 200);
    }

    #[test]
    fn test_update_mutable_preserves_key_and_first_seen() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);

        let rec = record(
            SourceId::WaHealth,
            &[
                ("date_time", "10:00 1/1/2024"),
                ("suburb", "Perth"),
                ("location", "Cafe X"),
                ("updated", "1/1/2024"),
                ("advice", "Get tested"),
            ],
        );
        let id = store.insert(&rec, 100).unwrap();

        let mut revised = rec.clone();
        revised.set_field("advice", "Get tested immediately".into());
        revised.set_field("updated", "2/1/2024".into());
        store.update_mutable(&revised, id, 200).unwrap();

        let entry = store.find(&rec).unwrap().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.first_seen, 100);
        assert_eq!(entry.last_seen, 200);
        assert_eq!(entry.mutable, vec!["2/1/2024", "Get tested immediately"]);
    }

    #[test]
    fn test_counts_and_latest_seen() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp);

        assert_eq!(store.latest_seen(SourceId::Ecu).unwrap(), None);

        for (i, room) in ["1.101", "2.202"].iter().enumerate() {
            let rec = record(
                SourceId::Ecu,
                &[
                    ("date", "1/1/2024"),
                    ("time", "10:00"),
                    ("campus", "Joondalup"),
                    ("building", "1"),
                    ("room", room),
                ],
            );
            store.insert(&rec, 100 + i as i64).unwrap();
        }

        assert_eq!(store.count(SourceId::Ecu).unwrap(), 2);
        assert_eq!(store.latest_seen(SourceId::Ecu).unwrap(), Some(101));
        assert_eq!(store.count(SourceId::Curtin).unwrap(), 0);
    }
}
