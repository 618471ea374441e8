//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Aggregation happens in SQL (GROUP BY), not in Rust
//! - Conflicts are handled via ON CONFLICT (no check-then-insert)
//! - Timestamps are stored and compared in UTC

pub mod measurements;
pub mod rules;

pub use measurements::{
    GroupedStat, HourlyStat, Measurement, MeasurementRepo, NewMeasurement, RequestCount,
};
pub use rules::{EndpointAccess, MonitorRule, RuleRepo};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },
}
