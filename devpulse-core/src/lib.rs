//! # devpulse-core
//!
//! Core library for devpulse - a personal telemetry ingestion and rollup engine.
//!
//! This library provides:
//! - Source clients for a coding-activity tracker and a contribution graph
//! - A SQLite bucket store with idempotent per-day, per-hour and per-dimension writes
//! - A refresh ledger that throttles scheduled ingestion
//! - Backfill range validation
//! - Cross-source rollups ("wrapped") over arbitrary date ranges
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows in one direction:
//! - **Ingest:** [`Refresher`] → source client (fetch) → [`Database`] (upsert) → ledger (mark)
//! - **Read:** views and [`analytics::build_rollup`] read the store independently of ingestion
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use devpulse_core::{Config, Database, Refresher};
//!
//! # async fn run() -> devpulse_core::Result<()> {
//! let config = Config::load()?;
//! let db = Database::open(&Config::database_path())?;
//! db.migrate()?;
//!
//! let refresher = Refresher::new(Arc::new(db), config);
//! let report = refresher.run_scheduled(chrono::Utc::now()).await;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use api::ErrorPayload;
pub use config::Config;
pub use db::Database;
pub use error::{Error, RangeError, Result};
pub use ingest::{RefreshAllReport, RefreshSummary, Refresher, ScheduledReport, SourceResult, StageOutcome};
pub use time::DateSpan;
pub use types::*;

// Public modules
pub mod analytics;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod sources;
pub mod time;
pub mod types;
