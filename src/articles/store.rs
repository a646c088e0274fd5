//! Read-only article store built from a snapshot.
//!
//! # Responsibilities
//! - Deserialize the `id -> article` snapshot once at startup
//! - Serve lookups and full listings without locking
//!
//! # Design Decisions
//! - No update path exists; the map is owned and never mutated after load
//! - Lookups return clones so callers cannot alter stored records
//! - Listing order follows the hash map and is not stable

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use thiserror::Error;

use crate::articles::model::{Article, ArticleId};

/// Failure to build the store; fatal at startup.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot read article snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse article snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read access to the article catalog.
pub trait ArticleStore: Send + Sync {
    fn get(&self, id: &ArticleId) -> Option<Article>;

    fn all(&self) -> Vec<Article>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable in-memory snapshot.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    articles: HashMap<ArticleId, Article>,
}

impl SnapshotStore {
    /// Build from records; any `suggested` payload in the input is dropped.
    pub fn new(articles: HashMap<ArticleId, Article>) -> Self {
        let articles = articles
            .into_iter()
            .map(|(id, mut article)| {
                article.suggested_articles.clear();
                (id, article)
            })
            .collect();
        Self { articles }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SnapshotError> {
        let articles: HashMap<ArticleId, Article> = serde_json::from_reader(reader)?;
        Ok(Self::new(articles))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let articles: HashMap<ArticleId, Article> = serde_json::from_str(json)?;
        Ok(Self::new(articles))
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let store = Self::from_reader(BufReader::new(File::open(path)?))?;
        tracing::info!(path = %path.display(), articles = store.len(), "Article snapshot loaded");
        Ok(store)
    }
}

impl ArticleStore for SnapshotStore {
    fn get(&self, id: &ArticleId) -> Option<Article> {
        self.articles.get(id).cloned()
    }

    fn all(&self) -> Vec<Article> {
        self.articles.values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.articles.len()
    }
}
