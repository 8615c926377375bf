use super::{
    backend::{StorageBackend, Tier},
    error::ArticlesError,
    frontmatter::{self, MetaDefaults},
    types::{Article, ArticleMeta, sort_by_date_desc},
};
use async_trait::async_trait;
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, warn};

/// The handful of filesystem calls the Markdown tier needs.
#[async_trait]
pub trait ContentFs: Send + Sync {
    async fn access(&self, path: &Path) -> io::Result<()>;

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

pub struct TokioFs;

#[async_trait]
impl ContentFs for TokioFs {
    async fn access(&self, path: &Path) -> io::Result<()> {
        let metadata = tokio::fs::metadata(path).await?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{:?} is not a directory", path),
            ))
        }
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut paths = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                paths.push(entry.path());
            }
        }

        Ok(paths)
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

pub struct FilesystemBackend {
    content_directory: PathBuf,
    default_author: String,
    fs: Arc<dyn ContentFs>,
}

impl FilesystemBackend {
    pub fn new(content_directory: impl Into<PathBuf>, default_author: impl Into<String>) -> Self {
        Self::with_fs(content_directory, default_author, Arc::new(TokioFs))
    }

    pub fn with_fs(
        content_directory: impl Into<PathBuf>,
        default_author: impl Into<String>,
        fs: Arc<dyn ContentFs>,
    ) -> Self {
        Self {
            content_directory: content_directory.into(),
            default_author: default_author.into(),
            fs,
        }
    }

    async fn load_article(&self, path: &Path, slug: &str) -> Result<Article, ArticlesError> {
        let raw = self.fs.read_to_string(path).await?;
        frontmatter::extract(&raw, slug, &MetaDefaults::new(self.default_author.as_str()))
    }
}

fn slug_from_path(path: &Path) -> Option<&str> {
    if path.extension()? != "md" {
        return None;
    }
    path.file_stem()?.to_str()
}

fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.contains(['/', '\\'])
        && slug != "."
        && slug != ".."
        && !slug.starts_with('.')
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    fn tier(&self) -> Tier {
        Tier::Filesystem
    }

    async fn list(&self) -> Result<Vec<ArticleMeta>, ArticlesError> {
        self.fs.access(&self.content_directory).await?;

        let mut articles = Vec::new();
        for path in self.fs.read_dir(&self.content_directory).await? {
            let Some(slug) = slug_from_path(&path) else {
                continue;
            };
            if !is_safe_slug(slug) {
                warn!("Skipping article {:?}: file name is not a usable slug", path);
                continue;
            }

            match self.load_article(&path, slug).await {
                Ok(article) => {
                    debug!("Loaded article: {}", article.slug);
                    articles.push(article.meta);
                }
                Err(e) => {
                    warn!("Skipping article {:?}: {}", path, e);
                }
            }
        }

        sort_by_date_desc(&mut articles);
        Ok(articles)
    }

    async fn get(&self, slug: &str) -> Result<Option<Article>, ArticlesError> {
        if !is_safe_slug(slug) {
            return Err(ArticlesError::InvalidSlug(slug.to_string()));
        }

        let path = self.content_directory.join(format!("{}.md", slug));
        match self.load_article(&path, slug).await {
            Ok(article) => Ok(Some(article)),
            Err(ArticlesError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
