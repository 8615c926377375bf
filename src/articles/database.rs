use super::{
    backend::{ArticleWriter, StorageBackend, Tier},
    error::ArticlesError,
    types::{Article, ArticleInput, ArticleMeta, ArticleUpdate, WriteOutcome, sort_by_date_desc},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions};

const SELECT_COLUMNS: &str = r#"
    SELECT slug, title, summary, content, author, category, tags, featured_image, date
    FROM articles
"#;

/// Row shape of the `articles` table, minus the counters the store never reads.
#[derive(Debug, Clone, FromRow)]
struct ArticleRow {
    slug: String,
    title: String,
    summary: String,
    content: String,
    author: String,
    category: String,
    tags: Option<Vec<String>>,
    featured_image: Option<String>,
    date: DateTime<Utc>,
}

impl ArticleRow {
    fn into_meta(self) -> ArticleMeta {
        self.split().0
    }

    fn into_article(self) -> Article {
        let (meta, content) = self.split();
        Article {
            slug: meta.slug.clone(),
            meta,
            content,
        }
    }

    fn split(self) -> (ArticleMeta, String) {
        let meta = ArticleMeta {
            slug: self.slug,
            title: self.title,
            date: self.date,
            summary: self.summary,
            author: self.author,
            category: self.category,
            image: self.featured_image,
            tags: self.tags.unwrap_or_default(),
        };
        (meta, self.content)
    }
}

pub struct DatabaseBackend {
    pool: PgPool,
    authoritative_when_empty: bool,
}

impl DatabaseBackend {
    pub fn new(pool: PgPool, authoritative_when_empty: bool) -> Self {
        Self {
            pool,
            authoritative_when_empty,
        }
    }

    /// Builds a pool without opening a connection; an unreachable server
    /// shows up as a query error later instead of failing here.
    pub fn connect_lazy(
        database_url: &str,
        max_connections: u32,
        authoritative_when_empty: bool,
    ) -> Result<Self, ArticlesError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(database_url)?;
        Ok(Self::new(pool, authoritative_when_empty))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), ArticlesError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for DatabaseBackend {
    fn tier(&self) -> Tier {
        Tier::Database
    }

    async fn list(&self) -> Result<Vec<ArticleMeta>, ArticlesError> {
        let query = format!("{} ORDER BY date DESC, slug ASC", SELECT_COLUMNS);
        let rows = sqlx::query_as::<_, ArticleRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        let mut articles: Vec<ArticleMeta> = rows.into_iter().map(ArticleRow::into_meta).collect();
        sort_by_date_desc(&mut articles);
        Ok(articles)
    }

    async fn get(&self, slug: &str) -> Result<Option<Article>, ArticlesError> {
        let query = format!("{} WHERE slug = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ArticleRow::into_article))
    }

    fn authoritative_when_empty(&self) -> bool {
        self.authoritative_when_empty
    }
}

#[async_trait]
impl ArticleWriter for DatabaseBackend {
    async fn create(&self, input: &ArticleInput) -> Result<WriteOutcome, ArticlesError> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles
                (slug, title, summary, content, author, category, tags, featured_image, published, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, NOW()))
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(&input.slug)
        .bind(&input.title)
        .bind(&input.summary)
        .bind(&input.content)
        .bind(&input.author)
        .bind(&input.category)
        .bind(&input.tags)
        .bind(&input.image)
        .bind(input.published)
        .bind(input.date)
        .execute(&self.pool)
        .await?;

        Ok(if result.rows_affected() == 0 {
            WriteOutcome::Duplicate
        } else {
            WriteOutcome::Applied
        })
    }

    async fn update(&self, slug: &str, update: &ArticleUpdate) -> Result<WriteOutcome, ArticlesError> {
        let result = sqlx::query(
            r#"
            UPDATE articles SET
                title = COALESCE($2, title),
                summary = COALESCE($3, summary),
                content = COALESCE($4, content),
                author = COALESCE($5, author),
                category = COALESCE($6, category),
                tags = COALESCE($7, tags),
                featured_image = COALESCE($8, featured_image),
                date = COALESCE($9, date),
                published = COALESCE($10, published),
                updated_at = NOW()
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .bind(&update.title)
        .bind(&update.summary)
        .bind(&update.content)
        .bind(&update.author)
        .bind(&update.category)
        .bind(&update.tags)
        .bind(&update.image)
        .bind(update.date)
        .bind(update.published)
        .execute(&self.pool)
        .await?;

        Ok(if result.rows_affected() == 0 {
            WriteOutcome::NotFound
        } else {
            WriteOutcome::Applied
        })
    }

    async fn delete(&self, slug: &str) -> Result<WriteOutcome, ArticlesError> {
        let result = sqlx::query("DELETE FROM articles WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;

        Ok(if result.rows_affected() == 0 {
            WriteOutcome::NotFound
        } else {
            WriteOutcome::Applied
        })
    }
}

#[cfg(all(test, feature = "online"))]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn backend() -> DatabaseBackend {
        let _ = dotenvy::dotenv();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for online tests");
        let backend = DatabaseBackend::connect_lazy(&url, 2, true).unwrap();
        backend.run_migrations().await.unwrap();
        backend
    }

    fn input(slug: &str) -> ArticleInput {
        ArticleInput {
            slug: slug.to_string(),
            title: "Round Trip".to_string(),
            summary: "Saved then read back".to_string(),
            content: "# Body".to_string(),
            author: "Tester".to_string(),
            category: "Tests".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
            image: Some("https://example.com/x.png".to_string()),
            date: Some(Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap()),
            published: true,
        }
    }

    #[tokio::test]
    async fn test_round_trip_and_idempotent_create() {
        let backend = backend().await;
        let slug = format!("online-round-trip-{}", Utc::now().timestamp_micros());
        let input = input(&slug);

        assert_eq!(backend.create(&input).await.unwrap(), WriteOutcome::Applied);
        assert_eq!(backend.create(&input).await.unwrap(), WriteOutcome::Duplicate);

        let article = backend.get(&slug).await.unwrap().unwrap();
        assert_eq!(article.meta, input.to_meta(Utc::now()));
        assert_eq!(article.content, "# Body");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE slug = $1")
            .bind(&slug)
            .fetch_one(backend.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);

        let update = ArticleUpdate {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert_eq!(backend.update(&slug, &update).await.unwrap(), WriteOutcome::Applied);
        let article = backend.get(&slug).await.unwrap().unwrap();
        assert_eq!(article.meta.title, "Renamed");
        assert_eq!(article.meta.summary, "Saved then read back");

        assert_eq!(backend.delete(&slug).await.unwrap(), WriteOutcome::Applied);
        assert_eq!(backend.delete(&slug).await.unwrap(), WriteOutcome::NotFound);
        assert!(backend.get(&slug).await.unwrap().is_none());
    }
}
