pub mod backend;
pub mod backup;
pub mod database;
pub mod error;
pub mod filesystem;
pub mod frontmatter;
pub mod handlers;
pub mod store;
pub mod types;

pub use backend::{ArticleWriter, StorageBackend, Tier};
pub use backup::StaticBackup;
pub use database::DatabaseBackend;
pub use error::ArticlesError;
pub use filesystem::{ContentFs, FilesystemBackend, TokioFs};
pub use store::ArticleStore;
pub use types::{Article, ArticleInput, ArticleMeta, ArticleUpdate, ArticlesConfig, WriteOutcome};
