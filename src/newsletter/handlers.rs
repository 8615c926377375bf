use super::{NewsletterError, SubscribeOutcome};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct SubscribeResponse {
    success: bool,
    message: String,
}

pub async fn subscribe_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> impl IntoResponse {
    let (status, success, message) = match app_state.subscribers.subscribe(&payload.email).await {
        Ok(SubscribeOutcome::Added) => (StatusCode::CREATED, true, "Subscribed successfully"),
        Ok(SubscribeOutcome::AlreadySubscribed) => (StatusCode::OK, true, "Already subscribed"),
        Err(NewsletterError::InvalidEmail(_)) => {
            (StatusCode::BAD_REQUEST, false, "Invalid email address")
        }
        Err(e) => {
            error!("Failed to store subscriber: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                "Failed to subscribe",
            )
        }
    };

    (
        status,
        Json(SubscribeResponse {
            success,
            message: message.to_string(),
        }),
    )
}
