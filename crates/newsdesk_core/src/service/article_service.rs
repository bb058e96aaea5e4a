//! Article use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/update/delete entry points for transport layers.
//! - Draw instants and ids only from the injected collaborators.
//!
//! # Invariants
//! - A failed operation leaves the store unchanged.
//! - List criteria are parsed before the store is read.
//! - Create never overwrites an existing id.

use crate::clock::Clock;
use crate::ids::IdGenerator;
use crate::model::article::{Article, ArticleId, ArticleValidationError, NewArticle};
use crate::model::patch::{merge_patch, ArticlePatch};
use crate::query::{ArticleListParams, ArticleQuery, QueryError};
use crate::repo::article_store::{ArticleStore, RepoError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ArticleServiceError>;

/// Service error for article use-cases.
#[derive(Debug)]
pub enum ArticleServiceError {
    /// Missing or malformed record fields.
    Validation(ArticleValidationError),
    /// Malformed list criteria.
    Query(QueryError),
    /// Target article does not exist.
    NotFound(ArticleId),
    /// The id generator produced an id that is already stored.
    IdCollision(ArticleId),
    /// Persistence-layer failure.
    Store(RepoError),
}

impl ArticleServiceError {
    /// Stable machine-readable code used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Query(_) => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::IdCollision(_) => "id_collision",
            Self::Store(_) => "store_failed",
        }
    }

    /// Returns whether the caller supplied bad input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Query(_))
    }
}

impl Display for ArticleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "news article with id={id} not found"),
            Self::IdCollision(id) => write!(f, "generated article id already exists: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ArticleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) | Self::IdCollision(_) => None,
        }
    }
}

impl From<ArticleValidationError> for ArticleServiceError {
    fn from(value: ArticleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<QueryError> for ArticleServiceError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

impl From<RepoError> for ArticleServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

/// Article service over a store and the clock/id collaborators.
pub struct ArticleService<S, C, G> {
    store: S,
    clock: C,
    ids: G,
}

impl<S, C, G> ArticleService<S, C, G>
where
    S: ArticleStore,
    C: Clock,
    G: IdGenerator,
{
    pub fn new(store: S, clock: C, ids: G) -> Self {
        Self { store, clock, ids }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates one article with a fresh id and `published_at = now`.
    ///
    /// # Errors
    /// - `Validation` when `title`, `body` or `source` is missing or empty.
    /// - `IdCollision` when the generated id is already stored.
    pub fn create_article(&self, input: NewArticle) -> ServiceResult<Article> {
        let started_at = Instant::now();
        let result = self.create_inner(input);
        log_outcome(
            "article_create",
            started_at,
            result.as_ref().ok().map(|article| article.id.as_str()),
            &result,
        );
        result
    }

    /// Gets one article by id.
    pub fn get_article(&self, id: &str) -> ServiceResult<Article> {
        let started_at = Instant::now();
        let result = self
            .store
            .get(id)
            .map_err(ArticleServiceError::from)
            .and_then(|found| found.ok_or_else(|| ArticleServiceError::NotFound(id.to_string())));
        log_outcome("article_get", started_at, Some(id), &result);
        result
    }

    /// Lists articles matching `params`, ordered by id.
    ///
    /// # Errors
    /// - `Query` when `publishedAfter` cannot be parsed.
    pub fn list_articles(&self, params: &ArticleListParams) -> ServiceResult<Vec<Article>> {
        let started_at = Instant::now();
        let result = self.list_inner(params);
        match &result {
            Ok(articles) => info!(
                "event=article_list module=service status=ok count={} duration_ms={}",
                articles.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("article_list", started_at, None, err),
        }
        result
    }

    /// Applies a partial update to an existing article.
    ///
    /// # Errors
    /// - `NotFound` when no article is stored under `id`.
    /// - `Validation` when the patch empties a required field.
    pub fn update_article(&self, id: &str, patch: &ArticlePatch) -> ServiceResult<Article> {
        let started_at = Instant::now();
        let result = self.update_inner(id, patch);
        log_outcome("article_update", started_at, Some(id), &result);
        result
    }

    /// Removes an article and returns it.
    ///
    /// # Errors
    /// - `NotFound` when no article is stored under `id`.
    pub fn delete_article(&self, id: &str) -> ServiceResult<Article> {
        let started_at = Instant::now();
        let result = self
            .store
            .remove(id)
            .map_err(ArticleServiceError::from)
            .and_then(|removed| {
                removed.ok_or_else(|| ArticleServiceError::NotFound(id.to_string()))
            });
        log_outcome("article_delete", started_at, Some(id), &result);
        result
    }

    fn create_inner(&self, input: NewArticle) -> ServiceResult<Article> {
        let article = Article::create(input, &self.clock, &self.ids)?;
        if self.store.get(&article.id)?.is_some() {
            return Err(ArticleServiceError::IdCollision(article.id));
        }
        self.store.insert(article.clone())?;
        Ok(article)
    }

    fn list_inner(&self, params: &ArticleListParams) -> ServiceResult<Vec<Article>> {
        let query = ArticleQuery::from_params(params)?;
        let snapshot = self.store.values()?;
        Ok(query.apply(snapshot))
    }

    fn update_inner(&self, id: &str, patch: &ArticlePatch) -> ServiceResult<Article> {
        let existing = self
            .store
            .get(id)?
            .ok_or_else(|| ArticleServiceError::NotFound(id.to_string()))?;
        let updated = merge_patch(&existing, patch, self.clock.now());
        updated.validate()?;
        self.store.insert(updated.clone())?;
        Ok(updated)
    }
}

fn log_outcome<T>(
    event: &str,
    started_at: Instant,
    article_id: Option<&str>,
    result: &ServiceResult<T>,
) {
    match result {
        Ok(_) => info!(
            "event={} module=service status=ok article_id={} duration_ms={}",
            event,
            article_id.unwrap_or("-"),
            started_at.elapsed().as_millis()
        ),
        Err(err) => log_failure(event, started_at, article_id, err),
    }
}

fn log_failure(
    event: &str,
    started_at: Instant,
    article_id: Option<&str>,
    err: &ArticleServiceError,
) {
    let article_id = article_id.unwrap_or("-");
    let duration_ms = started_at.elapsed().as_millis();
    match err {
        ArticleServiceError::Store(_) | ArticleServiceError::IdCollision(_) => error!(
            "event={} module=service status=error article_id={} duration_ms={} error_code={} error={}",
            event,
            article_id,
            duration_ms,
            err.code(),
            err
        ),
        _ => warn!(
            "event={} module=service status=error article_id={} duration_ms={} error_code={}",
            event,
            article_id,
            duration_ms,
            err.code()
        ),
    }
}
