//! Append-only reading store on SQLite
//!
//! One table, four straight-line statements. Timestamps are RFC 3339 UTC
//! with fixed-width fractional seconds, so lexicographic order on the
//! `ts` column is chronological order and the index stays usable for the
//! newest-first read path. All access happens from the single UI thread;
//! a connection is opened per call.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;
use rusqlite::{params, Connection};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

/// One stored sample. Immutable once written.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub ts: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity: f64,
    pub sensor: Option<String>,
    pub pin: Option<u32>,
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Idempotently ensure the database file, table and timestamp index
/// exist. Safe to call on every startup.
pub fn init(path: &Path) -> Result<(), StorageError> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS readings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ts TEXT NOT NULL,
            temperature_c REAL NOT NULL,
            humidity REAL NOT NULL,
            sensor TEXT,
            pin INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_readings_ts ON readings (ts);",
    )?;
    Ok(())
}

/// Append one reading stamped with the current UTC time. Returns the
/// timestamp that was written.
pub fn append(
    path: &Path,
    temperature_c: f64,
    humidity: f64,
    sensor: Option<&str>,
    pin: Option<u32>,
) -> Result<DateTime<Utc>, StorageError> {
    let ts = Utc::now();
    let conn = Connection::open(path)?;
    conn.execute(
        "INSERT INTO readings (ts, temperature_c, humidity, sensor, pin)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![format_ts(ts), temperature_c, humidity, sensor, pin],
    )?;
    Ok(ts)
}

/// Up to `limit` most recent readings, oldest first.
///
/// The query runs newest-first to use the timestamp index, then the rows
/// are reversed into caller-friendly order. Rows whose timestamp fails to
/// parse are skipped with a warning.
pub fn recent(path: &Path, limit: usize) -> Result<Vec<Reading>, StorageError> {
    let conn = Connection::open(path)?;
    let mut stmt = conn.prepare(
        "SELECT ts, temperature_c, humidity, sensor, pin
         FROM readings ORDER BY ts DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, f64>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<u32>>(4)?,
        ))
    })?;

    let mut readings = Vec::new();
    for row in rows {
        let (ts_raw, temperature_c, humidity, sensor, pin) = row?;
        match DateTime::parse_from_rfc3339(&ts_raw) {
            Ok(ts) => readings.push(Reading {
                ts: ts.with_timezone(&Utc),
                temperature_c,
                humidity,
                sensor,
                pin,
            }),
            Err(err) => warn!("skipping reading with bad timestamp {ts_raw:?}: {err}"),
        }
    }
    readings.reverse();
    Ok(readings)
}

/// Delete readings older than `months` (at 30 days per month, not
/// calendar-accurate). Returns the number of rows deleted.
pub fn prune(path: &Path, months: u32) -> Result<usize, StorageError> {
    prune_at(path, months, Utc::now())
}

pub(crate) fn prune_at(
    path: &Path,
    months: u32,
    now: DateTime<Utc>,
) -> Result<usize, StorageError> {
    let cutoff = now - chrono::Duration::days(i64::from(months) * 30);
    let conn = Connection::open(path)?;
    let deleted = conn.execute(
        "DELETE FROM readings WHERE ts < ?1",
        params![format_ts(cutoff)],
    )?;
    Ok(deleted)
}

/// Delete all readings. Only called after explicit user confirmation.
pub fn clear(path: &Path) -> Result<usize, StorageError> {
    let conn = Connection::open(path)?;
    let deleted = conn.execute("DELETE FROM readings", [])?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn db(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("readings.db");
        init(&path).unwrap();
        path
    }

    fn insert_at(path: &Path, ts: DateTime<Utc>, temperature_c: f64, humidity: f64) {
        let conn = Connection::open(path).unwrap();
        conn.execute(
            "INSERT INTO readings (ts, temperature_c, humidity, sensor, pin)
             VALUES (?1, ?2, ?3, NULL, NULL)",
            params![format_ts(ts), temperature_c, humidity],
        )
        .unwrap();
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        init(&path).unwrap();
        append(&path, 21.3, 45.2, Some("DHT22"), Some(4)).unwrap();
        assert_eq!(recent(&path, 10).unwrap().len(), 1);
    }

    #[test]
    fn append_then_recent_round_trips_exactly() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        append(&path, 21.3, 45.2, Some("DHT22"), Some(4)).unwrap();
        let rows = recent(&path, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].temperature_c, 21.3);
        assert_eq!(rows[0].humidity, 45.2);
        assert_eq!(rows[0].sensor.as_deref(), Some("DHT22"));
        assert_eq!(rows[0].pin, Some(4));
    }

    #[test]
    fn recent_is_bounded_and_oldest_first() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        let base = Utc::now();
        for i in 0..10 {
            insert_at(&path, base + chrono::Duration::seconds(i), 20.0 + i as f64, 50.0);
        }
        let rows = recent(&path, 4).unwrap();
        assert_eq!(rows.len(), 4);
        // The 4 newest rows, returned oldest to newest.
        assert_eq!(rows[0].temperature_c, 26.0);
        assert_eq!(rows[3].temperature_c, 29.0);
        for pair in rows.windows(2) {
            assert!(pair[0].ts <= pair[1].ts);
        }
    }

    #[test]
    fn recent_on_empty_table_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        assert!(recent(&path, 1000).unwrap().is_empty());
    }

    #[test]
    fn ordered_pair_example() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::minutes(5);
        insert_at(&path, t0, 21.3, 45.2);
        insert_at(&path, t1, 21.5, 46.0);
        let rows = recent(&path, 2).unwrap();
        assert_eq!(
            rows.iter()
                .map(|r| (r.temperature_c, r.humidity))
                .collect::<Vec<_>>(),
            vec![(21.3, 45.2), (21.5, 46.0)]
        );
    }

    #[test]
    fn prune_deletes_strictly_before_cutoff() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        let now = Utc::now();
        let cutoff = now - chrono::Duration::days(90);
        insert_at(&path, cutoff - chrono::Duration::microseconds(1), 1.0, 1.0);
        insert_at(&path, cutoff, 2.0, 2.0); // exactly at the cutoff: retained
        insert_at(&path, cutoff + chrono::Duration::seconds(1), 3.0, 3.0);
        insert_at(&path, now, 4.0, 4.0);

        let deleted = prune_at(&path, 3, now).unwrap();
        assert_eq!(deleted, 1);
        let remaining: Vec<f64> = recent(&path, 10)
            .unwrap()
            .iter()
            .map(|r| r.temperature_c)
            .collect();
        assert_eq!(remaining, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn clear_empties_the_table() {
        let dir = TempDir::new().unwrap();
        let path = db(&dir);
        append(&path, 21.3, 45.2, None, None).unwrap();
        append(&path, 21.5, 46.0, None, None).unwrap();
        assert_eq!(clear(&path).unwrap(), 2);
        assert!(recent(&path, 1000).unwrap().is_empty());
    }
}
