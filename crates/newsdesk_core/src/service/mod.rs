//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, query and merge calls into per-operation APIs.
//! - Keep transport layers decoupled from storage details.

pub mod article_service;
