//! Article store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide upsert/get/remove/snapshot over canonical `articles` storage.
//! - Keep SQL and timestamp encoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Article::validate()` before SQL mutations.
//! - Read paths reject undecodable rows instead of masking them.
//! - `insert`/`remove` read the previous value in the same transaction as the
//!   mutation.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::article::{Article, ArticleValidationError};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ARTICLE_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    source,
    author,
    published_at,
    updated_at
FROM articles";

const REQUIRED_COLUMNS: [&str; 7] = [
    "id",
    "title",
    "body",
    "source",
    "author",
    "published_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for article persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Record failed validation on the write path.
    Validation(ArticleValidationError),
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be decoded into a valid article.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "article store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "article store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "article store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted article data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ArticleValidationError> for RepoError {
    fn from(value: ArticleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Ordered key-value store of articles keyed by `Article::id`.
pub trait ArticleStore {
    /// Inserts or replaces the article under its id; returns the replaced value.
    fn insert(&self, article: Article) -> RepoResult<Option<Article>>;
    /// Point lookup.
    fn get(&self, id: &str) -> RepoResult<Option<Article>>;
    /// Removes the article under `id`; returns what was removed.
    fn remove(&self, id: &str) -> RepoResult<Option<Article>>;
    /// Snapshot of every stored article, ordered by id.
    fn values(&self) -> RepoResult<Vec<Article>>;
}

impl<T: ArticleStore + ?Sized> ArticleStore for &T {
    fn insert(&self, article: Article) -> RepoResult<Option<Article>> {
        (**self).insert(article)
    }

    fn get(&self, id: &str) -> RepoResult<Option<Article>> {
        (**self).get(id)
    }

    fn remove(&self, id: &str) -> RepoResult<Option<Article>> {
        (**self).remove(id)
    }

    fn values(&self) -> RepoResult<Vec<Article>> {
        (**self).values()
    }
}

/// SQLite-backed article store.
pub struct SqliteArticleStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArticleStore<'conn> {
    /// Constructs a store from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` for a foreign schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ArticleStore for SqliteArticleStore<'_> {
    fn insert(&self, article: Article) -> RepoResult<Option<Article>> {
        article.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let previous = select_article(&tx, &article.id)?;
        tx.execute(
            "INSERT INTO articles (
                id,
                title,
                body,
                source,
                author,
                published_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                source = excluded.source,
                author = excluded.author,
                published_at = excluded.published_at,
                updated_at = excluded.updated_at;",
            params![
                article.id.as_str(),
                article.title.as_str(),
                article.body.as_str(),
                article.source.as_str(),
                article.author.as_deref(),
                instant_to_db(article.published_at),
                article.updated_at.map(instant_to_db),
            ],
        )?;
        tx.commit()?;

        Ok(previous)
    }

    fn get(&self, id: &str) -> RepoResult<Option<Article>> {
        select_article(self.conn, id)
    }

    fn remove(&self, id: &str) -> RepoResult<Option<Article>> {
        let tx = self.conn.unchecked_transaction()?;
        let Some(previous) = select_article(&tx, id)? else {
            return Ok(None);
        };
        tx.execute("DELETE FROM articles WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(Some(previous))
    }

    fn values(&self) -> RepoResult<Vec<Article>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ARTICLE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut articles = Vec::new();

        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(row)?);
        }

        Ok(articles)
    }
}

fn select_article(conn: &Connection, id: &str) -> RepoResult<Option<Article>> {
    let mut stmt = conn.prepare(&format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"))?;
    let row = stmt
        .query_row([id], |row| Ok(parse_article_row(row)))
        .optional()?;
    row.transpose()
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let published_text: String = row.get("published_at")?;
    let published_at = instant_from_db(&published_text, "published_at")?;
    let updated_at = match row.get::<_, Option<String>>("updated_at")? {
        Some(text) => Some(instant_from_db(&text, "updated_at")?),
        None => None,
    };

    let article = Article {
        id: row.get("id")?,
        title: row.get("title")?,
        body: row.get("body")?,
        source: row.get("source")?,
        author: row.get("author")?,
        published_at,
        updated_at,
    };
    article
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("article `{}`: {err}", article.id)))?;
    Ok(article)
}

fn instant_to_db(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn instant_from_db(value: &str, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| {
            RepoError::InvalidData(format!("invalid instant `{value}` in articles.{column}"))
        })
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "articles")? {
        return Err(RepoError::MissingRequiredTable("articles"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "articles", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "articles",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
