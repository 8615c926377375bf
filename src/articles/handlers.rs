use super::types::{ArticleInput, ArticleUpdate, WriteOutcome};
use crate::{AppState, api::require_admin};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use serde::{Serialize, de::DeserializeOwned};

#[derive(Serialize)]
pub struct WriteResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<bool>,
}

fn write_response(status: StatusCode, success: bool, message: String, created: Option<bool>) -> Response {
    (
        status,
        Json(WriteResponse {
            success,
            message,
            created,
        }),
    )
        .into_response()
}

fn outcome_response(outcome: WriteOutcome, slug: &str, applied_status: StatusCode) -> Response {
    match outcome {
        WriteOutcome::Applied => write_response(
            applied_status,
            true,
            format!("Article '{}' saved", slug),
            (applied_status == StatusCode::CREATED).then_some(true),
        ),
        WriteOutcome::Duplicate => write_response(
            StatusCode::OK,
            true,
            format!("Article '{}' already exists", slug),
            Some(false),
        ),
        WriteOutcome::NotFound => write_response(
            StatusCode::NOT_FOUND,
            false,
            format!("Article '{}' not found", slug),
            None,
        ),
        WriteOutcome::Skipped => write_response(
            StatusCode::SERVICE_UNAVAILABLE,
            false,
            "No database configured; articles are read-only".to_string(),
            None,
        ),
        WriteOutcome::Failed => write_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            false,
            format!("Failed to write article '{}'", slug),
            None,
        ),
    }
}

/// Admin bodies are parsed after the token check, never before it.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| {
        write_response(
            StatusCode::BAD_REQUEST,
            false,
            format!("Invalid article payload: {}", e),
            None,
        )
    })
}

pub async fn list_articles_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(app_state.articles.get_articles().await)
}

pub async fn article_handler(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    match app_state.articles.get_article_by_slug(&slug).await {
        Some(article) => Json(article).into_response(),
        None => (StatusCode::NOT_FOUND, "Article not found").into_response(),
    }
}

pub async fn article_html_handler(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    match app_state.articles.get_article_by_slug(&slug).await {
        Some(article) => Html(article.render_html()).into_response(),
        None => (StatusCode::NOT_FOUND, "Article not found").into_response(),
    }
}

pub async fn create_article_handler(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StatusCode> {
    require_admin(&headers, app_state.config.app.admin_token.as_deref())?;

    let mut input: ArticleInput = match parse_body(&body) {
        Ok(input) => input,
        Err(response) => return Ok(response),
    };
    input.slug = slug;
    let outcome = app_state.articles.save_article(&input).await;
    Ok(outcome_response(outcome, &input.slug, StatusCode::CREATED))
}

pub async fn update_article_handler(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StatusCode> {
    require_admin(&headers, app_state.config.app.admin_token.as_deref())?;

    let update: ArticleUpdate = match parse_body(&body) {
        Ok(update) => update,
        Err(response) => return Ok(response),
    };

    let outcome = app_state.articles.update_article(&slug, &update).await;
    Ok(outcome_response(outcome, &slug, StatusCode::OK))
}

pub async fn delete_article_handler(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, StatusCode> {
    require_admin(&headers, app_state.config.app.admin_token.as_deref())?;

    let outcome = app_state.articles.delete_article(&slug).await;
    Ok(outcome_response(outcome, &slug, StatusCode::OK))
}
