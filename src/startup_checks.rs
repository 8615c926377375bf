use crate::{Config, articles::StaticBackup};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Content directory does not exist: {0}")]
    ContentDirectoryMissing(String),

    #[error("Content directory is not readable: {0}")]
    ContentDirectoryUnreadable(String),

    #[error("Bundled article backup is empty")]
    BackupEmpty,

    #[error("Newsletter directory could not be created: {0}")]
    NewsletterDirectoryCreationFailed(#[from] std::io::Error),
}

impl StartupCheckError {
    /// None of these stop the server; the article chain degrades instead.
    pub fn is_critical(&self) -> bool {
        matches!(self, StartupCheckError::NewsletterDirectoryCreationFailed(_))
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    match &config.articles.database_url {
        Some(_) => info!("Database configured; it will be tried first for articles"),
        None => warn!("No database configured; articles are read-only"),
    }

    let content_dir = Path::new(&config.articles.content_directory);
    if !content_dir.exists() {
        warn!("Content directory does not exist: {:?}", content_dir);
        errors.push(StartupCheckError::ContentDirectoryMissing(
            content_dir.display().to_string(),
        ));
    } else {
        match tokio::fs::read_dir(content_dir).await {
            Ok(_) => info!("Content directory is accessible: {:?}", content_dir),
            Err(e) => {
                warn!("Content directory is not accessible: {}", e);
                errors.push(StartupCheckError::ContentDirectoryUnreadable(
                    content_dir.display().to_string(),
                ));
            }
        }
    }

    let backup = StaticBackup::bundled();
    if backup.is_empty() {
        warn!("Bundled article backup is empty; the last fallback has nothing to serve");
        errors.push(StartupCheckError::BackupEmpty);
    } else {
        info!("Bundled backup holds {} articles", backup.articles().len());
    }

    if let Some(parent) = config.newsletter.subscribers_file.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        info!("Creating newsletter directory: {:?}", parent);
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            error!("Failed to create newsletter directory: {}", e);
            errors.push(StartupCheckError::NewsletterDirectoryCreationFailed(e));
        }
    }

    if config.app.admin_token.is_none() {
        warn!("No admin token configured; admin article endpoints will reject every request");
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        warn!("Startup checks reported {} problems", errors.len());
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_content_directory_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.articles.content_directory = temp_dir.path().join("missing");
        config.newsletter.subscribers_file = temp_dir.path().join("news").join("subs.json");

        let errors = perform_startup_checks(&config).await.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], StartupCheckError::ContentDirectoryMissing(_)));
        assert!(!errors[0].is_critical());
        assert!(temp_dir.path().join("news").exists());
    }

    #[tokio::test]
    async fn test_checks_pass_with_content_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.articles.content_directory = temp_dir.path().to_path_buf();
        config.newsletter.subscribers_file = temp_dir.path().join("subs.json");

        assert!(perform_startup_checks(&config).await.is_ok());
    }
}
