use super::error::ArticlesError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use pulldown_cmark::{Options, Parser, html};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMeta {
    pub slug: String,
    pub title: String,
    #[serde(with = "iso_date")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub summary: String,
    pub author: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub slug: String,
    pub meta: ArticleMeta,
    pub content: String,
}

impl Article {
    pub fn render_html(&self) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);

        let parser = Parser::new_ext(&self.content, options);
        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);
        html_output
    }
}

/// Payload for creating an article from the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleInput {
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    pub author: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

impl ArticleInput {
    pub fn to_meta(&self, now: DateTime<Utc>) -> ArticleMeta {
        ArticleMeta {
            slug: self.slug.clone(),
            title: self.title.clone(),
            date: self.date.unwrap_or(now),
            summary: self.summary.clone(),
            author: self.author.clone(),
            category: self.category.clone(),
            image: self.image.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub date: Option<DateTime<Utc>>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    Duplicate,
    NotFound,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArticlesConfig {
    pub content_directory: PathBuf,
    pub database_url: Option<String>,
    pub default_author: String,
    pub empty_database_is_authoritative: bool,
    pub max_connections: u32,
}

impl Default for ArticlesConfig {
    fn default() -> Self {
        Self {
            content_directory: PathBuf::from("content/articles"),
            database_url: None,
            default_author: String::from("AI Hub"),
            empty_database_is_authoritative: true,
            max_connections: 5,
        }
    }
}

pub fn parse_date(date_str: &str) -> Result<DateTime<Utc>, ArticlesError> {
    let date_str = date_str.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(date.with_timezone(&Utc));
    }

    // Local date-times without an offset are taken as UTC
    if let Ok(date) = NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(date.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    Err(ArticlesError::DateParseError(format!(
        "Unable to parse date: {}",
        date_str
    )))
}

/// Sorts newest first; equal dates fall back to slug order.
pub fn sort_by_date_desc(articles: &mut [ArticleMeta]) {
    articles.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
}

/// Serializes dates the way `Date.prototype.toISOString` does.
pub mod iso_date {
    use super::parse_date;
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn format(date: &DateTime<Utc>) -> String {
        date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use super::{format, parse_date};
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        pub fn serialize<S: Serializer>(
            date: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => serializer.serialize_str(&format(date)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse_date(&raw).map(Some).map_err(D::Error::custom),
                None => Ok(None),
            }
        }
    }
}
