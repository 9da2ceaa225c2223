//! MySQL reader for the LIMS tracking tables.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::{info, instrument};

use crate::error::{DatabaseError, Error};
use crate::milestones::Metric;
use crate::store::traits::{ProductionMetrics, TaskRepository};
use crate::tasks::model::{parse_optional_timestamp, parse_timestamp};
use crate::tasks::{AnalysisUnit, SupportRecord};

/// Workflows before this one predate raw image indexing.
pub const FIRST_TRACKED_WORKFLOW: i64 = 68;

/// Images captured per well (one per channel).
pub const IMAGES_PER_WELL: u64 = 2;

/// Connection pool settings for the LIMS.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 2,
            acquire_timeout_secs: 30,
        }
    }
}

/// Read-only handle on the LIMS database.
pub struct LimsDatabase {
    pool: MySqlPool,
}

impl LimsDatabase {
    /// Connect with the default pool settings and verify the server answers.
    pub async fn connect(options: MySqlConnectOptions) -> Result<Self, DatabaseError> {
        Self::connect_with(options, PoolConfig::default()).await
    }

    pub async fn connect_with(
        options: MySqlConnectOptions,
        config: PoolConfig,
    ) -> Result<Self, DatabaseError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| DatabaseError::Connection(format!("ping failed: {e}")))?;
        info!("Connected to LIMS");
        Ok(Self { pool })
    }

    async fn count(&self, sql: &str) -> Result<u64, Error> {
        let row = sqlx::query(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        let n: Option<i64> = row.try_get(0).map_err(DatabaseError::from)?;
        Ok(n.unwrap_or(0).max(0) as u64)
    }
}

#[async_trait]
impl TaskRepository for LimsDatabase {
    #[instrument(skip(self))]
    async fn list_analysis_units(&self) -> Result<Vec<AnalysisUnit>, Error> {
        let rows = sqlx::query(
            "SELECT
                CAST(workflow_id AS SIGNED),
                variant,
                CAST(created_at AS CHAR),
                CAST(finished_at AS CHAR)
            FROM NE_task_tracking_analysis",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let mut units = Vec::with_capacity(rows.len());
        for row in rows {
            let workflow_id: i64 = row.try_get(0).map_err(DatabaseError::from)?;
            let variant: String = row.try_get(1).map_err(DatabaseError::from)?;
            let created_at: String = row.try_get(2).map_err(DatabaseError::from)?;
            let finished_at: Option<String> = row.try_get(3).map_err(DatabaseError::from)?;
            units.push(AnalysisUnit {
                workflow_id,
                variant,
                created_at: parse_timestamp("created_at", &created_at)?,
                finished_at: parse_optional_timestamp("finished_at", finished_at.as_deref())?,
            });
        }
        info!(count = units.len(), "Fetched analysis tasks");
        Ok(units)
    }

    #[instrument(skip(self))]
    async fn list_support_records(&self) -> Result<Vec<SupportRecord>, Error> {
        let rows = sqlx::query(
            "SELECT
                plate_name,
                CAST(created_at AS CHAR),
                CAST(finished_at AS CHAR)
            FROM NE_task_tracking_stitching",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let source_name: String = row.try_get(0).map_err(DatabaseError::from)?;
            let created_at: String = row.try_get(1).map_err(DatabaseError::from)?;
            let finished_at: Option<String> = row.try_get(2).map_err(DatabaseError::from)?;
            records.push(SupportRecord {
                source_name,
                created_at: parse_timestamp("created_at", &created_at)?,
                finished_at: parse_optional_timestamp("finished_at", finished_at.as_deref())?,
            });
        }
        info!(count = records.len(), "Fetched stitching tasks");
        Ok(records)
    }

    async fn lookup_variant(&self, code: &str) -> Result<Option<String>, DatabaseError> {
        let row = sqlx::query(
            "SELECT mutant_strain
            FROM NE_available_strains
            WHERE plate_id_1 = ? OR plate_id_2 = ?
            LIMIT 1",
        )
        .bind(code)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_get(0)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ProductionMetrics for LimsDatabase {
    #[instrument(skip(self))]
    async fn current_value(&self, metric: Metric) -> Result<u64, Error> {
        let value = match metric {
            Metric::Workflow => {
                self.count("SELECT CAST(MAX(workflow_id) AS SIGNED) FROM NE_final_results")
                    .await?
            }
            Metric::Plate => {
                self.count("SELECT COUNT(*) FROM NE_task_tracking_stitching")
                    .await?
            }
            Metric::Image => self.count(&raw_image_count_sql()).await?,
            Metric::Well => self.count(&raw_image_count_sql()).await? / IMAGES_PER_WELL,
        };
        info!(metric = %metric, value, "Current production count");
        Ok(value)
    }
}

fn raw_image_count_sql() -> String {
    format!("SELECT COUNT(*) FROM NE_raw_index WHERE workflow_id >= {FIRST_TRACKED_WORKFLOW}")
}
