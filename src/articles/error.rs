use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArticlesError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("YAML front matter error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML front matter error: {0}")]
    TomlError(#[from] toml_edit::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateParseError(String),

    #[error("Invalid article format: {0}")]
    InvalidFormat(String),

    #[error("Invalid slug: {0}")]
    InvalidSlug(String),
}
