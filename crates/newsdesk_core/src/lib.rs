//! Core domain logic for newsdesk.
//! This crate is the single source of truth for article invariants.

pub mod clock;
pub mod db;
pub mod ids;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{IdGenerator, SequenceIdGenerator, UuidGenerator};
pub use logging::{
    default_log_level, init_console_logging, init_logging, logging_status, LogTarget,
};
pub use model::article::{Article, ArticleId, ArticleValidationError, NewArticle};
pub use model::patch::{merge_patch, ArticlePatch};
pub use query::{parse_instant, ArticleListParams, ArticleQuery, QueryError};
pub use repo::article_store::{ArticleStore, RepoError, RepoResult, SqliteArticleStore};
pub use repo::memory_store::MemoryArticleStore;
pub use service::article_service::{ArticleService, ArticleServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
