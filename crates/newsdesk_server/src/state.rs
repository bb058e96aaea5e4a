//! Shared application state for HTTP handlers.
//!
//! # Responsibility
//! - Own the single SQLite connection and the clock/id collaborators.
//! - Run each operation against a freshly checked store on a blocking worker.
//!
//! # Invariants
//! - One operation holds the connection lock from first read to last write.
//! - A poisoned lock is reported as an internal error.

use crate::error::ApiError;
use newsdesk_core::{
    ArticleService, ArticleServiceError, Clock, IdGenerator, ServiceResult, SqliteArticleStore,
    SystemClock, UuidGenerator,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub type SharedClock = Arc<dyn Clock + Send + Sync>;
pub type SharedIdGenerator = Arc<dyn IdGenerator + Send + Sync>;

/// Service as seen by one request.
pub type HostedService<'a> = ArticleService<
    SqliteArticleStore<'a>,
    &'a (dyn Clock + Send + Sync),
    &'a (dyn IdGenerator + Send + Sync),
>;

#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
    clock: SharedClock,
    ids: SharedIdGenerator,
}

impl AppState {
    /// State with wall-clock time and UUID v4 ids.
    pub fn new(conn: Connection) -> Self {
        Self::with_collaborators(conn, Arc::new(SystemClock), Arc::new(UuidGenerator))
    }

    pub fn with_collaborators(conn: Connection, clock: SharedClock, ids: SharedIdGenerator) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
            ids,
        }
    }

    /// Runs `op` on the blocking pool with exclusive store access.
    pub async fn run<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: for<'a> FnOnce(&HostedService<'a>) -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || state.run_blocking(op))
            .await
            .map_err(|err| ApiError::Internal(format!("worker task failed: {err}")))?
    }

    fn run_blocking<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: for<'a> FnOnce(&HostedService<'a>) -> ServiceResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))?;
        let store = SqliteArticleStore::try_new(&conn).map_err(ArticleServiceError::from)?;
        let service = ArticleService::new(store, &*self.clock, &*self.ids);
        Ok(op(&service)?)
    }
}
