//! Partial-update input and merge rules.
//!
//! # Responsibility
//! - Define the allow-list of fields a caller may change after creation.
//! - Compute the next article version from an existing one and a patch.
//!
//! # Invariants
//! - `id` and `published_at` are always taken from the existing record.
//! - `updated_at` is always the merge instant, never caller-supplied.

use crate::model::article::Article;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Caller-supplied subset of an article's mutable fields.
///
/// Unknown keys (including `id`, `publishedAt` and `updatedAt`) are ignored
/// during decoding, so they can never reach the merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub source: Option<String>,
    /// `None` keeps the current author, `Some(None)` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    pub author: Option<Option<String>>,
}

impl ArticlePatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn author(mut self, author: Option<String>) -> Self {
        self.author = Some(author);
        self
    }

    /// Returns whether the patch carries no field changes.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.source.is_none() && self.author.is_none()
    }
}

/// Produces the next version of `existing` with `patch` applied.
///
/// `updated_at` is set to `now`, raised to `published_at` if the clock reads
/// earlier than the creation instant.
pub fn merge_patch(existing: &Article, patch: &ArticlePatch, now: DateTime<Utc>) -> Article {
    let author = match &patch.author {
        Some(value) => value.clone().filter(|author| !author.is_empty()),
        None => existing.author.clone(),
    };

    Article {
        id: existing.id.clone(),
        title: patch.title.clone().unwrap_or_else(|| existing.title.clone()),
        body: patch.body.clone().unwrap_or_else(|| existing.body.clone()),
        source: patch
            .source
            .clone()
            .unwrap_or_else(|| existing.source.clone()),
        author,
        published_at: existing.published_at,
        updated_at: Some(now.max(existing.published_at)),
    }
}

// Distinguishes an explicit `null` from an absent key.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
