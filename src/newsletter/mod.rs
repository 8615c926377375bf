pub mod error;
pub mod handlers;
pub mod subscribers;

pub use error::NewsletterError;
pub use subscribers::{Subscriber, SubscriberList, SubscribeOutcome};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NewsletterConfig {
    pub subscribers_file: PathBuf,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            subscribers_file: PathBuf::from("data/subscribers.json"),
        }
    }
}
