use aihub::{Config, create_app};
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

async fn setup_test_server(with_content: bool) -> (TempDir, TestServer) {
    let temp_dir = TempDir::new().unwrap();
    let content_dir = temp_dir.path().join("content");

    if with_content {
        fs::create_dir_all(&content_dir).unwrap();

        let post1_content = r#"---
title: First Test Article
date: 2024-01-01
summary: This is the first test article
author: Tester
category: Testing
tags: [one, two]
---

# First Test Article

This is the content of the first test article."#;
        fs::write(content_dir.join("first-article.md"), post1_content).unwrap();

        let post2_content = r#"---
title: Second Test Article
date: 2024-01-02
summary: This is the second test article
---

# Second Test Article

This is the content of the second test article."#;
        fs::write(content_dir.join("second-article.md"), post2_content).unwrap();

        fs::write(content_dir.join("broken.md"), "---\ntitle: Broken\n").unwrap();
    }

    let mut config = Config::default();
    config.app.admin_token = Some("test-token".to_string());
    config.articles.content_directory = content_dir;
    config.articles.database_url = None;
    config.newsletter.subscribers_file = temp_dir.path().join("subscribers.json");

    let app = create_app(config).await;
    let server = TestServer::new(app).unwrap();

    (temp_dir, server)
}

#[tokio::test]
async fn test_list_articles_from_content_directory() {
    let (_temp_dir, server) = setup_test_server(true).await;

    let response = server.get("/api/articles").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let articles: Vec<Value> = response.json();
    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0]["slug"], "second-article");
    assert_eq!(articles[0]["date"], "2024-01-02T00:00:00.000Z");
    assert_eq!(articles[0]["author"], "AI Hub");
    assert_eq!(articles[0]["category"], "Uncategorized");
    assert_eq!(articles[1]["slug"], "first-article");
    assert_eq!(articles[1]["tags"], json!(["one", "two"]));
}

#[tokio::test]
async fn test_list_falls_back_to_backup() {
    let (_temp_dir, server) = setup_test_server(false).await;

    let response = server.get("/api/articles").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let articles: Vec<Value> = response.json();
    assert!(!articles.is_empty());
    let dates: Vec<&str> = articles
        .iter()
        .map(|a| a["date"].as_str().unwrap())
        .collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
}

#[tokio::test]
async fn test_get_article() {
    let (_temp_dir, server) = setup_test_server(true).await;

    let response = server.get("/api/articles/first-article").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let article: Value = response.json();
    assert_eq!(article["slug"], "first-article");
    assert_eq!(article["meta"]["slug"], "first-article");
    assert_eq!(article["meta"]["title"], "First Test Article");
    assert!(
        article["content"]
            .as_str()
            .unwrap()
            .starts_with("# First Test Article")
    );
}

#[tokio::test]
async fn test_get_article_from_backup() {
    let (_temp_dir, server) = setup_test_server(false).await;

    let response = server.get("/api/articles/welcome-to-ai-hub").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let article: Value = response.json();
    assert_eq!(article["meta"]["title"], "Welcome to AI Hub");
}

#[tokio::test]
async fn test_article_not_found() {
    let (_temp_dir, server) = setup_test_server(true).await;

    let response = server.get("/api/articles/nonexistent").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server.get("/api/articles/broken").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_article_html() {
    let (_temp_dir, server) = setup_test_server(true).await;

    let response = server.get("/api/articles/second-article/html").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("<h1>Second Test Article</h1>"));
}

#[tokio::test]
async fn test_admin_requires_token() {
    let (_temp_dir, server) = setup_test_server(true).await;
    let body = json!({
        "title": "New",
        "author": "Admin",
        "category": "News"
    });

    let response = server.post("/api/admin/articles/new").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/admin/articles/new")
        .authorization_bearer("wrong")
        .json(&body)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = server.delete("/api/admin/articles/new").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_token_checked_before_body() {
    let (_temp_dir, server) = setup_test_server(true).await;

    let response = server
        .post("/api/admin/articles/new")
        .text("{not json")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = server
        .put("/api/admin/articles/first-article")
        .json(&json!({ "title": 42 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/admin/articles/new")
        .authorization_bearer("test-token")
        .text("{not json")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);

    let response = server
        .post("/api/admin/articles/new")
        .authorization_bearer("test-token")
        .json(&json!({ "title": "Missing author and category" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .put("/api/admin/articles/first-article")
        .authorization_bearer("test-token")
        .json(&json!({ "title": 42 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_writes_without_database_are_unavailable() {
    let (_temp_dir, server) = setup_test_server(true).await;

    let response = server
        .post("/api/admin/articles/new")
        .authorization_bearer("test-token")
        .json(&json!({
            "title": "New",
            "author": "Admin",
            "category": "News"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["success"], false);

    let response = server
        .put("/api/admin/articles/first-article")
        .authorization_bearer("test-token")
        .json(&json!({ "title": "Renamed" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);

    let response = server
        .delete("/api/admin/articles/first-article")
        .authorization_bearer("test-token")
        .await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);

    // Filesystem content is untouched
    let response = server.get("/api/articles/first-article").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_subscribe() {
    let (temp_dir, server) = setup_test_server(false).await;

    let response = server
        .post("/api/subscribe")
        .json(&json!({ "email": "Reader@Example.com" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = server
        .post("/api/newsletter/subscribe")
        .json(&json!({ "email": "reader@example.com" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["message"], "Already subscribed");

    let response = server
        .post("/api/subscribe")
        .json(&json!({ "email": "not-an-email" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let stored = fs::read_to_string(temp_dir.path().join("subscribers.json")).unwrap();
    let stored: Vec<Value> = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["email"], "reader@example.com");
}
