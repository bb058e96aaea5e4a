//! Domain model for stored news articles.
//!
//! # Responsibility
//! - Define the canonical `Article` record and its create/update inputs.
//! - Own field-level validation and the partial-update merge rules.
//!
//! # Invariants
//! - Every article is identified by an `ArticleId` assigned once at creation.
//! - `published_at` never changes after creation.
//! - `updated_at`, when present, is never earlier than `published_at`.

pub mod article;
pub mod patch;
