use serde::{Deserialize, Serialize};

pub mod api;
pub mod articles;
pub mod newsletter;
pub mod startup_checks;

pub use articles::ArticlesConfig;
pub use newsletter::NewsletterConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub articles: ArticlesConfig,
    #[serde(default)]
    pub newsletter: NewsletterConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub admin_token: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            app: AppConfig {
                name: "AI Hub".to_string(),
                log_level: default_log_level(),
                admin_token: None,
            },
            articles: ArticlesConfig::default(),
            newsletter: NewsletterConfig::default(),
        }
    }
}

impl Config {
    /// Environment variables take precedence over the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL")
            && !url.trim().is_empty()
        {
            self.articles.database_url = Some(url);
        }
        if let Ok(token) = std::env::var("ADMIN_TOKEN")
            && !token.trim().is_empty()
        {
            self.app.admin_token = Some(token);
        }
    }

    /// A level given on the command line wins over `app.log_level`.
    pub fn log_level<'a>(&'a self, cli_level: Option<&'a str>) -> &'a str {
        cli_level.unwrap_or(&self.app.log_level)
    }
}

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub articles: Arc<articles::ArticleStore>,
    pub subscribers: Arc<newsletter::SubscriberList>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let articles = Arc::new(articles::ArticleStore::new(&config.articles));
        let subscribers = Arc::new(newsletter::SubscriberList::new(
            config.newsletter.subscribers_file.clone(),
        ));

        Self {
            articles,
            subscribers,
            config,
        }
    }
}

pub async fn create_app(config: Config) -> Router {
    create_app_with_state(AppState::new(config))
}

pub fn create_app_with_state(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/articles",
            get(articles::handlers::list_articles_handler),
        )
        .route(
            "/api/articles/{slug}",
            get(articles::handlers::article_handler),
        )
        .route(
            "/api/articles/{slug}/html",
            get(articles::handlers::article_html_handler),
        )
        .route(
            "/api/admin/articles/{slug}",
            post(articles::handlers::create_article_handler)
                .put(articles::handlers::update_article_handler)
                .delete(articles::handlers::delete_article_handler),
        )
        .route(
            "/api/subscribe",
            post(newsletter::handlers::subscribe_handler),
        )
        .route(
            "/api/newsletter/subscribe",
            post(newsletter::handlers::subscribe_handler),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let user_agent = request
                        .headers()
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %request.uri().path(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
