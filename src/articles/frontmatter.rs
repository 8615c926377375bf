use super::{
    error::ArticlesError,
    types::{Article, ArticleMeta, parse_date},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Values used for fields the front matter leaves out.
#[derive(Debug, Clone)]
pub struct MetaDefaults {
    pub author: String,
    pub now: DateTime<Utc>,
}

impl MetaDefaults {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            now: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    title: Option<String>,
    date: Option<RawDate>,
    summary: Option<String>,
    author: Option<String>,
    category: Option<String>,
    image: Option<String>,
    tags: Option<Tags>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Tags {
    List(Vec<String>),
    Joined(String),
}

impl Tags {
    fn into_vec(self) -> Vec<String> {
        match self {
            Tags::List(tags) => tags,
            Tags::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

/// TOML has a native date type; YAML and quoted TOML dates arrive as text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDate {
    Text(String),
    Toml(toml_edit::Datetime),
}

impl RawDate {
    fn into_string(self) -> String {
        match self {
            RawDate::Text(text) => text,
            RawDate::Toml(datetime) => datetime.to_string(),
        }
    }
}

enum Block<'a> {
    Yaml(&'a str),
    Toml(&'a str),
    None,
}

/// Splits a Markdown document into metadata and body.
///
/// A leading `---` block is YAML and a leading `+++` block is TOML. Text
/// without either is treated as a bare body and every field is defaulted.
pub fn extract(raw: &str, slug: &str, defaults: &MetaDefaults) -> Result<Article, ArticlesError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let (block, body) = split_block(raw)?;

    let front_matter: FrontMatter = match block {
        Block::Yaml(text) if !text.trim().is_empty() => serde_yaml::from_str(text)?,
        Block::Toml(text) if !text.trim().is_empty() => toml_edit::de::from_str(text)?,
        _ => FrontMatter::default(),
    };

    let date = match front_matter.date {
        Some(date) => parse_date(&date.into_string())?,
        None => defaults.now,
    };

    let meta = ArticleMeta {
        slug: slug.to_string(),
        title: front_matter.title.unwrap_or_else(|| "Untitled".to_string()),
        date,
        summary: front_matter.summary.unwrap_or_default(),
        author: front_matter
            .author
            .unwrap_or_else(|| defaults.author.clone()),
        category: front_matter
            .category
            .unwrap_or_else(|| "Uncategorized".to_string()),
        image: front_matter.image.filter(|image| !image.trim().is_empty()),
        tags: front_matter.tags.map(Tags::into_vec).unwrap_or_default(),
    };

    Ok(Article {
        slug: slug.to_string(),
        meta,
        content: body.trim().to_string(),
    })
}

fn split_block(raw: &str) -> Result<(Block<'_>, &str), ArticlesError> {
    let delimiter = match first_line(raw) {
        "---" => "---",
        "+++" => "+++",
        _ => return Ok((Block::None, raw)),
    };

    let after_open = &raw[raw.find('\n').map(|i| i + 1).unwrap_or(raw.len())..];

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == delimiter {
            let block = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            let block = if delimiter == "---" {
                Block::Yaml(block)
            } else {
                Block::Toml(block)
            };
            return Ok((block, body));
        }
        offset += line.len();
    }

    Err(ArticlesError::InvalidFormat(format!(
        "Front matter opened with {} is never closed",
        delimiter
    )))
}

fn first_line(raw: &str) -> &str {
    raw.lines().next().unwrap_or("").trim_end()
}
