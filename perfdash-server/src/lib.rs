//! perfdash-server: HTTP server for the perfdash monitoring dashboard
//!
//! Records per-request performance measurements into a relational store and
//! renders aggregate visualizations (an hourly-load heatmap, per-endpoint
//! histograms and grouped averages) as server-rendered HTML, alongside a
//! JSON API for ingestion and inspection.

pub mod db;
pub mod heatmap;
pub mod http;
pub mod plot;

pub use db::create_pool;
pub use http::{run_server, ServerConfig};
