//! Monitor-rule repository
//!
//! One rule per endpoint: whether monitoring is active, when the endpoint
//! was first seen and under which version, and when it was last accessed.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::DbError;

/// Monitor rule record from the database
#[derive(Debug, Clone, FromRow)]
pub struct MonitorRule {
    pub endpoint: String,
    pub monitor: bool,
    pub time_added: DateTime<Utc>,
    pub version_added: String,
    pub last_accessed: Option<DateTime<Utc>>,
}

/// Endpoint with its last accessed time, for the overview page
#[derive(Debug, Clone, FromRow)]
pub struct EndpointAccess {
    pub endpoint: String,
    pub monitor: bool,
    pub last_accessed: Option<DateTime<Utc>>,
}

/// Monitor-rule repository
pub struct RuleRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RuleRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Return the rule for an endpoint, creating it when absent.
    ///
    /// New rules start with monitoring off, `time_added = now` and the
    /// given version. Idempotent: INSERT .. ON CONFLICT DO NOTHING followed
    /// by a SELECT yields one row even when two callers race.
    pub async fn get_or_create(
        &self,
        endpoint: &str,
        version: &str,
    ) -> Result<MonitorRule, DbError> {
        sqlx::query(
            r#"
            INSERT INTO monitor_rules (endpoint, monitor, time_added, version_added)
            VALUES (?1, 0, ?2, ?3)
            ON CONFLICT(endpoint) DO NOTHING
            "#,
        )
        .bind(endpoint)
        .bind(Utc::now())
        .bind(version)
        .execute(self.pool)
        .await?;

        let rule = sqlx::query_as::<_, MonitorRule>(
            r#"
            SELECT endpoint, monitor, time_added, version_added, last_accessed
            FROM monitor_rules
            WHERE endpoint = ?1
            "#,
        )
        .bind(endpoint)
        .fetch_one(self.pool)
        .await?;

        Ok(rule)
    }

    /// Flip the monitor flag for an endpoint.
    pub async fn set_monitor(&self, endpoint: &str, value: bool) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE monitor_rules SET monitor = ?1 WHERE endpoint = ?2")
            .bind(value)
            .bind(endpoint)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "monitor rule",
                id: endpoint.to_owned(),
            });
        }
        Ok(())
    }

    /// Every endpoint with its monitor flag and last accessed time.
    pub async fn last_accessed_times(&self) -> Result<Vec<EndpointAccess>, DbError> {
        let rows = sqlx::query_as::<_, EndpointAccess>(
            r#"
            SELECT endpoint, monitor, last_accessed
            FROM monitor_rules
            ORDER BY endpoint
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Update the timestamp of last access for an endpoint.
    pub async fn touch_last_accessed(
        &self,
        endpoint: &str,
        when: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE monitor_rules SET last_accessed = ?1 WHERE endpoint = ?2")
            .bind(when)
            .bind(endpoint)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound {
                resource: "monitor rule",
                id: endpoint.to_owned(),
            });
        }
        Ok(())
    }
}
