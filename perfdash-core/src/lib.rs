//! perfdash-core: shared configuration and error types for the perfdash
//! monitoring dashboard.
//!
//! The dashboard records per-request performance measurements and renders
//! aggregate charts. This crate holds the pieces every other crate needs:
//! the INI configuration loader (including VCS-derived version detection)
//! and the structured error type.

pub mod config;
pub mod error;

pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
