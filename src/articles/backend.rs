use super::{
    error::ArticlesError,
    types::{Article, ArticleInput, ArticleMeta, ArticleUpdate, WriteOutcome},
};
use async_trait::async_trait;
use std::{fmt, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Database,
    Filesystem,
    Backup,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Database => "database",
            Tier::Filesystem => "filesystem",
            Tier::Backup => "backup",
        };
        f.write_str(name)
    }
}

/// A read-side source of articles. The store walks a list of these in order,
/// and an `Err` or empty answer hands the request to the next one.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn tier(&self) -> Tier;

    async fn list(&self) -> Result<Vec<ArticleMeta>, ArticlesError>;

    async fn get(&self, slug: &str) -> Result<Option<Article>, ArticlesError>;

    /// Whether an empty listing from this backend ends the chain.
    fn authoritative_when_empty(&self) -> bool {
        false
    }
}

#[async_trait]
pub trait ArticleWriter: Send + Sync {
    async fn create(&self, input: &ArticleInput) -> Result<WriteOutcome, ArticlesError>;

    async fn update(&self, slug: &str, update: &ArticleUpdate) -> Result<WriteOutcome, ArticlesError>;

    async fn delete(&self, slug: &str) -> Result<WriteOutcome, ArticlesError>;
}

pub type DynStorageBackend = Arc<dyn StorageBackend>;
pub type DynArticleWriter = Arc<dyn ArticleWriter>;
