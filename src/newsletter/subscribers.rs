use super::error::NewsletterError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Added,
    AlreadySubscribed,
}

/// Subscriber emails persisted as a JSON array. Appends are serialized
/// through a mutex so concurrent requests cannot drop each other's writes.
pub struct SubscriberList {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SubscriberList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub async fn subscribe(&self, email: &str) -> Result<SubscribeOutcome, NewsletterError> {
        let email = normalize_email(email)?;

        let _guard = self.lock.lock().await;
        let mut subscribers = self.load().await?;

        if subscribers.iter().any(|s| s.email == email) {
            debug!("Already subscribed: {}", email);
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }

        subscribers.push(Subscriber {
            email: email.clone(),
            subscribed_at: Utc::now(),
        });
        self.save(&subscribers).await?;

        info!("New newsletter subscriber ({} total)", subscribers.len());
        Ok(SubscribeOutcome::Added)
    }

    pub async fn list(&self) -> Result<Vec<Subscriber>, NewsletterError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn load(&self) -> Result<Vec<Subscriber>, NewsletterError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, subscribers: &[Subscriber]) -> Result<(), NewsletterError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(subscribers)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> Result<String, NewsletterError> {
    let email = email.trim().to_lowercase();

    let valid = email.len() <= 254
        && !email.contains(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        });

    if valid {
        Ok(email)
    } else {
        Err(NewsletterError::InvalidEmail(email))
    }
}
