//! Article domain model.
//!
//! # Responsibility
//! - Define the canonical stored record and the create-input shape.
//! - Build new records from explicit clock/id collaborators, with no hidden I/O.
//!
//! # Invariants
//! - `title`, `body` and `source` are non-empty.
//! - `author` is `None` when absent, never an empty string.
//! - `updated_at` is `None` until the first update.

use crate::clock::Clock;
use crate::ids::IdGenerator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque identifier assigned by an [`IdGenerator`].
pub type ArticleId = String;

/// Validation failures for article inputs and stored records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleValidationError {
    /// A required string field is missing or empty.
    MissingField(&'static str),
    /// `updated_at` is earlier than `published_at`.
    UpdatedBeforePublished {
        published_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
}

impl Display for ArticleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::UpdatedBeforePublished {
                published_at,
                updated_at,
            } => write!(
                f,
                "updatedAt ({updated_at}) must be >= publishedAt ({published_at})"
            ),
        }
    }
}

impl Error for ArticleValidationError {}

/// Canonical stored news article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub body: String,
    pub source: String,
    pub author: Option<String>,
    /// Creation instant. Never mutated afterward.
    pub published_at: DateTime<Utc>,
    /// Instant of the most recent update, if any.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create input. Fields are optional on the wire so that a missing field
/// surfaces as a validation error rather than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewArticle {
    pub title: Option<String>,
    pub body: Option<String>,
    pub source: Option<String>,
    pub author: Option<String>,
}

impl NewArticle {
    /// Convenience constructor for the three required fields.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
            source: Some(source.into()),
            author: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Checks required fields in declaration order.
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        require("title", self.title.as_deref())?;
        require("body", self.body.as_deref())?;
        require("source", self.source.as_deref())?;
        Ok(())
    }
}

impl Article {
    /// Builds a fully-formed article from create input.
    ///
    /// Input is validated before any id is drawn, so a rejected create never
    /// consumes an identifier.
    ///
    /// # Errors
    /// - `MissingField` when `title`, `body` or `source` is missing or empty.
    pub fn create<C, G>(
        input: NewArticle,
        clock: &C,
        ids: &G,
    ) -> Result<Self, ArticleValidationError>
    where
        C: Clock + ?Sized,
        G: IdGenerator + ?Sized,
    {
        input.validate()?;
        let NewArticle {
            title,
            body,
            source,
            author,
        } = input;

        Ok(Self {
            id: ids.new_id(),
            title: title.unwrap_or_default(),
            body: body.unwrap_or_default(),
            source: source.unwrap_or_default(),
            author: author.filter(|value| !value.is_empty()),
            published_at: clock.now(),
            updated_at: None,
        })
    }

    /// Validates record-level invariants.
    ///
    /// Called by store write paths and when decoding persisted rows.
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        require("id", Some(self.id.as_str()))?;
        require("title", Some(self.title.as_str()))?;
        require("body", Some(self.body.as_str()))?;
        require("source", Some(self.source.as_str()))?;
        if let Some(updated_at) = self.updated_at {
            if updated_at < self.published_at {
                return Err(ArticleValidationError::UpdatedBeforePublished {
                    published_at: self.published_at,
                    updated_at,
                });
            }
        }
        Ok(())
    }

    /// Returns whether this article has been updated since creation.
    pub fn is_modified(&self) -> bool {
        self.updated_at.is_some()
    }
}

fn require(field: &'static str, value: Option<&str>) -> Result<(), ArticleValidationError> {
    match value {
        Some(text) if !text.is_empty() => Ok(()),
        _ => Err(ArticleValidationError::MissingField(field)),
    }
}
