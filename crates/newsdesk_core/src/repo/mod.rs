//! Record store contracts and implementations.
//!
//! # Responsibility
//! - Define the ordered key-value contract the service layer depends on.
//! - Isolate SQLite details from query and merge logic.
//!
//! # Invariants
//! - Absence is `Ok(None)`; errors are reserved for storage failures and
//!   invalid records.
//! - Snapshots are ordered by article id, never by timestamp.

pub mod article_store;
pub mod memory_store;
