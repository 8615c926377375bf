use super::{
    backend::{StorageBackend, Tier},
    error::ArticlesError,
    types::{Article, ArticleMeta, sort_by_date_desc},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::error;

pub const BACKUP_FILE: &str = "articles-backup.json";
pub const CONTENT_BACKUP_FILE: &str = "articles-content-backup.json";

const BUNDLED_ARTICLES: &str = include_str!("../../data/articles-backup.json");
const BUNDLED_CONTENT: &str = include_str!("../../data/articles-content-backup.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    pub meta: ArticleMeta,
    pub content: String,
}

/// Read-only snapshot compiled into the binary. Lookups never touch disk.
#[derive(Debug, Clone, Default)]
pub struct StaticBackup {
    articles: Vec<ArticleMeta>,
    content: HashMap<String, BackupEntry>,
}

impl StaticBackup {
    pub fn new(mut articles: Vec<ArticleMeta>, content: HashMap<String, BackupEntry>) -> Self {
        sort_by_date_desc(&mut articles);
        Self { articles, content }
    }

    pub fn bundled() -> Self {
        match Self::from_json(BUNDLED_ARTICLES, BUNDLED_CONTENT) {
            Ok(backup) => backup,
            Err(e) => {
                error!("Bundled article backup is unreadable: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_json(articles: &str, content: &str) -> Result<Self, ArticlesError> {
        let articles: Vec<ArticleMeta> = serde_json::from_str(articles)?;
        let content: HashMap<String, BackupEntry> = serde_json::from_str(content)?;
        Ok(Self::new(articles, content))
    }

    pub fn articles(&self) -> &[ArticleMeta] {
        &self.articles
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty() && self.content.is_empty()
    }

    pub fn find(&self, slug: &str) -> Option<Article> {
        self.content.get(slug).map(|entry| {
            let mut meta = entry.meta.clone();
            meta.slug = slug.to_string();
            Article {
                slug: slug.to_string(),
                meta,
                content: entry.content.clone(),
            }
        })
    }
}

#[async_trait]
impl StorageBackend for StaticBackup {
    fn tier(&self) -> Tier {
        Tier::Backup
    }

    async fn list(&self) -> Result<Vec<ArticleMeta>, ArticlesError> {
        Ok(self.articles.clone())
    }

    async fn get(&self, slug: &str) -> Result<Option<Article>, ArticlesError> {
        Ok(self.find(slug))
    }
}
