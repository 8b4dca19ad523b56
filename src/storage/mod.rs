//! Storage layer for the sync pipeline
//!
//! - `models`: Data structures
//! - `schema`: Connection and schema management
//! - `queries`: Team, athlete, stat and game operations
//! - `locks`: Advisory phase locks

pub mod locks;
pub mod models;
pub mod queries;
pub mod schema;


pub use locks::{unix_now, DEFAULT_LOCK_TTL};
pub use models::*;
pub use schema::{lock_db, SharedDatabase, SyncDatabase};
