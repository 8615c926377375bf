use super::{
    backend::{DynArticleWriter, DynStorageBackend, Tier},
    backup::StaticBackup,
    database::DatabaseBackend,
    error::ArticlesError,
    filesystem::FilesystemBackend,
    types::{Article, ArticleInput, ArticleMeta, ArticleUpdate, ArticlesConfig, WriteOutcome, sort_by_date_desc},
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Resolves articles through an ordered list of backends and forwards writes
/// to the database when one is configured.
pub struct ArticleStore {
    backends: Vec<DynStorageBackend>,
    writer: Option<DynArticleWriter>,
    database: Option<Arc<DatabaseBackend>>,
}

impl ArticleStore {
    pub fn new(config: &ArticlesConfig) -> Self {
        let database = config.database_url.as_deref().and_then(|url| {
            match DatabaseBackend::connect_lazy(
                url,
                config.max_connections,
                config.empty_database_is_authoritative,
            ) {
                Ok(backend) => Some(Arc::new(backend)),
                Err(e) => {
                    warn!("Database URL rejected, continuing without database: {}", e);
                    None
                }
            }
        });

        let mut backends: Vec<DynStorageBackend> = Vec::new();
        if let Some(database) = &database {
            backends.push(database.clone());
        }
        backends.push(Arc::new(FilesystemBackend::new(
            config.content_directory.clone(),
            config.default_author.clone(),
        )));
        backends.push(Arc::new(StaticBackup::bundled()));

        let writer = database.clone().map(|db| db as DynArticleWriter);

        info!(
            "Article tiers: {}",
            backends
                .iter()
                .map(|b| b.tier().to_string())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Self {
            backends,
            writer,
            database,
        }
    }

    pub fn with_backends(backends: Vec<DynStorageBackend>, writer: Option<DynArticleWriter>) -> Self {
        Self {
            backends,
            writer,
            database: None,
        }
    }

    pub fn tiers(&self) -> Vec<Tier> {
        self.backends.iter().map(|b| b.tier()).collect()
    }

    pub fn has_writer(&self) -> bool {
        self.writer.is_some()
    }

    pub fn database(&self) -> Option<&DatabaseBackend> {
        self.database.as_deref()
    }

    pub async fn run_migrations(&self) -> Result<(), ArticlesError> {
        match &self.database {
            Some(database) => database.run_migrations().await,
            None => Ok(()),
        }
    }

    pub async fn get_articles(&self) -> Vec<ArticleMeta> {
        for backend in &self.backends {
            let tier = backend.tier();
            match backend.list().await {
                Ok(mut articles) if !articles.is_empty() || backend.authoritative_when_empty() => {
                    sort_by_date_desc(&mut articles);
                    debug!("Served {} articles from {} tier", articles.len(), tier);
                    return articles;
                }
                Ok(_) => {
                    debug!("No articles in {} tier, trying next", tier);
                }
                Err(e) => {
                    warn!("Article listing from {} tier failed: {}", tier, e);
                }
            }
        }

        warn!("No article tier produced a listing");
        Vec::new()
    }

    pub async fn get_article_by_slug(&self, slug: &str) -> Option<Article> {
        for backend in &self.backends {
            let tier = backend.tier();
            match backend.get(slug).await {
                Ok(Some(article)) => {
                    debug!("Served article {} from {} tier", slug, tier);
                    return Some(article);
                }
                Ok(None) => {
                    debug!("Article {} not in {} tier", slug, tier);
                }
                Err(e) => {
                    warn!("Article lookup {} in {} tier failed: {}", slug, tier, e);
                }
            }
        }

        None
    }

    pub async fn save_article(&self, input: &ArticleInput) -> WriteOutcome {
        let Some(writer) = &self.writer else {
            debug!("No database configured, skipping save of {}", input.slug);
            return WriteOutcome::Skipped;
        };

        match writer.create(input).await {
            Ok(outcome) => {
                info!("Save article {}: {:?}", input.slug, outcome);
                outcome
            }
            Err(e) => {
                error!("Failed to save article {}: {}", input.slug, e);
                WriteOutcome::Failed
            }
        }
    }

    pub async fn update_article(&self, slug: &str, update: &ArticleUpdate) -> WriteOutcome {
        let Some(writer) = &self.writer else {
            debug!("No database configured, skipping update of {}", slug);
            return WriteOutcome::Skipped;
        };

        match writer.update(slug, update).await {
            Ok(outcome) => {
                info!("Update article {}: {:?}", slug, outcome);
                outcome
            }
            Err(e) => {
                error!("Failed to update article {}: {}", slug, e);
                WriteOutcome::Failed
            }
        }
    }

    pub async fn delete_article(&self, slug: &str) -> WriteOutcome {
        let Some(writer) = &self.writer else {
            debug!("No database configured, skipping delete of {}", slug);
            return WriteOutcome::Skipped;
        };

        match writer.delete(slug).await {
            Ok(outcome) => {
                info!("Delete article {}: {:?}", slug, outcome);
                outcome
            }
            Err(e) => {
                error!("Failed to delete article {}: {}", slug, e);
                WriteOutcome::Failed
            }
        }
    }
}
