//! Measurement repository
//!
//! Per-request performance measurements for monitored endpoints. All
//! aggregation (hourly buckets, grouped averages, request counts) is done
//! in SQL; timestamps are stored in UTC and bucketed with strftime.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::{FromRow, Row, SqlitePool};

use super::DbError;

/// Measurement record from the database
#[derive(Debug, Clone, FromRow)]
pub struct Measurement {
    pub id: i64,
    pub endpoint: String,
    /// Execution time in milliseconds
    pub execution_time: f64,
    pub version: String,
    pub group_by: Option<String>,
    pub time: DateTime<Utc>,
}

/// Measurement to be recorded
#[derive(Debug, Clone)]
pub struct NewMeasurement {
    pub endpoint: String,
    pub execution_time: f64,
    pub version: String,
    pub group_by: Option<String>,
    pub time: DateTime<Utc>,
}

/// Execution-time statistics for one hour bucket
#[derive(Debug, Clone)]
pub struct HourlyStat {
    /// Start of the hour, UTC
    pub hour: DateTime<Utc>,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub count: i64,
}

/// Statistics grouped by version and grouping tag
#[derive(Debug, Clone)]
pub struct GroupedStat {
    pub version: String,
    pub group_by: Option<String>,
    pub count: i64,
    pub average: f64,
}

/// Request count for one hour bucket, feeds the heatmap
#[derive(Debug, Clone, PartialEq)]
pub struct RequestCount {
    /// Start of the hour, UTC
    pub hour: DateTime<Utc>,
    pub count: i64,
}

/// Measurement repository
pub struct MeasurementRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MeasurementRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert one measurement, returning its row id.
    pub async fn record(&self, m: &NewMeasurement) -> Result<i64, DbError> {
        let result = sqlx::query(
            r#"
            INSERT INTO function_calls (endpoint, execution_time, version, group_by, time)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&m.endpoint)
        .bind(m.execution_time)
        .bind(&m.version)
        .bind(&m.group_by)
        .bind(m.time)
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Per-hour avg/min/max/count of execution time for an endpoint,
    /// ordered by hour. Source for the execution-time line chart.
    pub async fn hourly_stats(&self, endpoint: &str) -> Result<Vec<HourlyStat>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                strftime('%Y-%m-%d %H:00:00', time) AS hour,
                AVG(execution_time) AS avg,
                MIN(execution_time) AS min,
                MAX(execution_time) AS max,
                COUNT(execution_time) AS count
            FROM function_calls
            WHERE endpoint = ?1
            GROUP BY hour
            ORDER BY hour
            "#,
        )
        .bind(endpoint)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| HourlyStat {
                hour: utc_hour(r.get("hour")),
                avg: r.get("avg"),
                min: r.get("min"),
                max: r.get("max"),
                count: r.get("count"),
            })
            .collect())
    }

    /// Distinct versions under which an endpoint was measured.
    pub async fn versions(&self, endpoint: &str) -> Result<Vec<String>, DbError> {
        let versions = sqlx::query_scalar(
            "SELECT DISTINCT version FROM function_calls WHERE endpoint = ?1 ORDER BY version",
        )
        .bind(endpoint)
        .fetch_all(self.pool)
        .await?;

        Ok(versions)
    }

    /// Count and average execution time per (version, grouping tag) pair.
    pub async fn grouped_stats(&self, endpoint: &str) -> Result<Vec<GroupedStat>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT
                version,
                group_by,
                COUNT(execution_time) AS count,
                AVG(execution_time) AS average
            FROM function_calls
            WHERE endpoint = ?1
            GROUP BY version, group_by
            ORDER BY version, group_by
            "#,
        )
        .bind(endpoint)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| GroupedStat {
                version: r.get("version"),
                group_by: r.get("group_by"),
                count: r.get("count"),
                average: r.get("average"),
            })
            .collect())
    }

    /// Every measurement for an endpoint, oldest first. Histogram source.
    pub async fn all_measurements(&self, endpoint: &str) -> Result<Vec<Measurement>, DbError> {
        let rows = sqlx::query_as::<_, Measurement>(
            r#"
            SELECT id, endpoint, execution_time, version, group_by, time
            FROM function_calls
            WHERE endpoint = ?1
            ORDER BY time
            "#,
        )
        .bind(endpoint)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Per-hour request counts in `[start, end)`, optionally filtered to one
    /// endpoint. Hours without requests are absent; the heatmap fills them
    /// with zero.
    pub async fn request_counts(
        &self,
        endpoint: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RequestCount>, DbError> {
        // datetime() normalizes both sides so string comparison is sound
        let rows = if let Some(endpoint) = endpoint {
            sqlx::query(
                r#"
                SELECT strftime('%Y-%m-%d %H:00:00', time) AS hour, COUNT(*) AS count
                FROM function_calls
                WHERE datetime(time) >= datetime(?1)
                  AND datetime(time) < datetime(?2)
                  AND endpoint = ?3
                GROUP BY hour
                ORDER BY hour
                "#,
            )
            .bind(start)
            .bind(end)
            .bind(endpoint)
            .fetch_all(self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                SELECT strftime('%Y-%m-%d %H:00:00', time) AS hour, COUNT(*) AS count
                FROM function_calls
                WHERE datetime(time) >= datetime(?1)
                  AND datetime(time) < datetime(?2)
                GROUP BY hour
                ORDER BY hour
                "#,
            )
            .bind(start)
            .bind(end)
            .fetch_all(self.pool)
            .await?
        };

        Ok(rows
            .into_iter()
            .map(|r| RequestCount {
                hour: utc_hour(r.get("hour")),
                count: r.get("count"),
            })
            .collect())
    }
}

/// strftime output carries no offset; it was computed from UTC timestamps.
fn utc_hour(naive: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&naive)
}
