//! libSQL-backed [`CounterStore`] — the persistent milestone database.

use std::path::Path;

use async_trait::async_trait;
use libsql::{Connection, params};
use tracing::info;

use crate::error::DatabaseError;
use crate::milestones::{Metric, MilestoneCounter};
use crate::store::migrations;
use crate::store::traits::CounterStore;

/// Milestone counters in a local SQLite file.
pub struct LibSqlCounterStore {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: Connection,
}

impl LibSqlCounterStore {
    /// Create the database and seed every metric at its first milestone.
    ///
    /// Refuses to run against a database that already holds counters.
    pub async fn create(path: &Path) -> Result<Self, DatabaseError> {
        info!(path = %path.display(), "Creating new milestone database");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }
        let store = Self::open(path).await?;
        store.initialize_counters().await?;
        Ok(store)
    }

    /// Open a database previously made with [`LibSqlCounterStore::create`].
    pub async fn open_existing(path: &Path) -> Result<Self, DatabaseError> {
        if !path.exists() {
            return Err(DatabaseError::Connection(format!(
                "'{}' does not exist, have you created the db?",
                path.display()
            )));
        }
        info!(path = %path.display(), "Using existing milestone database");
        Self::open(path).await
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn open(path: &Path) -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open libSQL database: {e}")))?;
        Self::from_database(db).await
    }

    async fn from_database(db: libsql::Database) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self { db, conn })
    }

    /// Insert every metric with its default step and `interval = 1`.
    pub async fn initialize_counters(&self) -> Result<(), DatabaseError> {
        let existing = self.list_counters().await?;
        if !existing.is_empty() {
            return Err(DatabaseError::Constraint(format!(
                "milestone database already holds {} counters",
                existing.len()
            )));
        }

        for metric in Metric::ALL {
            let counter = MilestoneCounter::new(metric.as_str(), metric.default_base_unit());
            self.conn
                .execute(
                    "INSERT INTO milestones (name, interval, milestone) VALUES (?1, ?2, ?3)",
                    params![
                        counter.name.as_str(),
                        to_db(counter.interval)?,
                        to_db(counter.base_unit)?
                    ],
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("initialize_counters: {e}")))?;
        }
        Ok(())
    }

    /// All counters, in insertion order.
    pub async fn list_counters(&self) -> Result<Vec<MilestoneCounter>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT name, interval, milestone FROM milestones ORDER BY id",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_counters: {e}")))?;

        let mut counters = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_counters: {e}")))?
        {
            counters.push(row_to_counter(&row)?);
        }
        Ok(counters)
    }
}

#[async_trait]
impl CounterStore for LibSqlCounterStore {
    async fn get_counter(&self, name: &str) -> Result<MilestoneCounter, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT name, interval, milestone FROM milestones WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_counter: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_counter(&row),
            Ok(None) => Err(DatabaseError::NotFound {
                entity: "milestone".into(),
                id: name.into(),
            }),
            Err(e) => Err(DatabaseError::Query(format!("get_counter: {e}"))),
        }
    }

    async fn set_interval(&self, name: &str, interval: u64) -> Result<(), DatabaseError> {
        let updated = self
            .conn
            .execute(
                "UPDATE milestones SET interval = ?1 WHERE name = ?2",
                params![to_db(interval)?, name],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_interval: {e}")))?;

        if updated == 0 {
            return Err(DatabaseError::NotFound {
                entity: "milestone".into(),
                id: name.into(),
            });
        }
        Ok(())
    }
}

fn row_to_counter(row: &libsql::Row) -> Result<MilestoneCounter, DatabaseError> {
    let name: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("milestone name: {e}")))?;
    let interval: i64 = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("milestone interval: {e}")))?;
    let base_unit: i64 = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("milestone step: {e}")))?;
    Ok(MilestoneCounter {
        name,
        interval: from_db(interval)?,
        base_unit: from_db(base_unit)?,
    })
}

fn to_db(value: u64) -> Result<i64, DatabaseError> {
    i64::try_from(value).map_err(|_| DatabaseError::Constraint(format!("{value} out of range")))
}

fn from_db(value: i64) -> Result<u64, DatabaseError> {
    u64::try_from(value).map_err(|_| DatabaseError::Constraint(format!("negative value {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> LibSqlCounterStore {
        let store = LibSqlCounterStore::new_memory().await.unwrap();
        store.initialize_counters().await.unwrap();
        store
    }

    #[tokio::test]
    async fn initialize_seeds_all_metrics() {
        let store = test_store().await;
        let counters = store.list_counters().await.unwrap();
        assert_eq!(counters.len(), Metric::ALL.len());
        for counter in counters {
            assert_eq!(counter.interval, 1);
        }

        let well = store.get_counter("well").await.unwrap();
        assert_eq!(well.base_unit, 5_000_000);
        assert_eq!(well.threshold(), 5_000_000);
    }

    #[tokio::test]
    async fn initialize_twice_is_refused() {
        let store = test_store().await;
        let err = store.initialize_counters().await.unwrap_err();
        assert!(matches!(err, DatabaseError::Constraint(_)));
        // progress untouched
        assert_eq!(store.list_counters().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn set_interval_persists() {
        let store = test_store().await;
        store.set_interval("plate", 7).await.unwrap();
        let plate = store.get_counter("plate").await.unwrap();
        assert_eq!(plate.interval, 7);
        assert_eq!(plate.threshold(), 35_000);
    }

    #[tokio::test]
    async fn unknown_counter() {
        let store = test_store().await;
        assert!(matches!(
            store.get_counter("pipette").await.unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
        assert!(matches!(
            store.set_interval("pipette", 2).await.unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn open_existing_requires_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing.db");
        let err = LibSqlCounterStore::open_existing(&path).await.err().unwrap();
        assert!(matches!(err, DatabaseError::Connection(_)));
    }

    #[tokio::test]
    async fn create_then_reopen_keeps_progress() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("milestones.db");

        {
            let store = LibSqlCounterStore::create(&path).await.unwrap();
            store.set_interval("image", 3).await.unwrap();
        }

        let store = LibSqlCounterStore::open_existing(&path).await.unwrap();
        assert_eq!(store.get_counter("image").await.unwrap().interval, 3);

        // a second create against the same file must not reset it
        assert!(LibSqlCounterStore::create(&path).await.is_err());
    }
}
