//! Database layer for devpulse
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - The bucket store (idempotent upserts and ranged reads)
//! - The refresh ledger used to throttle scheduled work

pub mod ledger;
pub mod repo;
pub mod schema;

pub use repo::Database;
