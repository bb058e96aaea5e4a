//! In-memory article store with the same contract as the SQLite store.
//!
//! Used by tests and by embedders that do not need durability.

use crate::model::article::{Article, ArticleId};
use crate::repo::article_store::{ArticleStore, RepoResult};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// `BTreeMap`-backed article store. Not `Sync`; hosts serialize access.
#[derive(Debug, Default)]
pub struct MemoryArticleStore {
    articles: RefCell<BTreeMap<ArticleId, Article>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.articles.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.borrow().is_empty()
    }
}

impl ArticleStore for MemoryArticleStore {
    fn insert(&self, article: Article) -> RepoResult<Option<Article>> {
        article.validate()?;
        Ok(self
            .articles
            .borrow_mut()
            .insert(article.id.clone(), article))
    }

    fn get(&self, id: &str) -> RepoResult<Option<Article>> {
        Ok(self.articles.borrow().get(id).cloned())
    }

    fn remove(&self, id: &str) -> RepoResult<Option<Article>> {
        Ok(self.articles.borrow_mut().remove(id))
    }

    fn values(&self) -> RepoResult<Vec<Article>> {
        Ok(self.articles.borrow().values().cloned().collect())
    }
}
