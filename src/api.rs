use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_CONTEXT: &[u8] = b"aihub-admin-token";

fn token_tag(token: &str) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(token.as_bytes()).ok()?;
    mac.update(TOKEN_CONTEXT);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Compares two tokens without leaking where they first differ.
pub fn tokens_match(expected: &str, provided: &str) -> bool {
    if let Some(expected_tag) = token_tag(expected)
        && let Ok(mut mac) = HmacSha256::new_from_slice(provided.as_bytes())
    {
        mac.update(TOKEN_CONTEXT);
        return mac.verify_slice(&expected_tag).is_ok();
    }
    false
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim()).filter(|t| !t.is_empty())
    } else {
        None
    }
}

pub fn require_admin(headers: &HeaderMap, admin_token: Option<&str>) -> Result<(), StatusCode> {
    let Some(expected) = admin_token.filter(|t| !t.is_empty()) else {
        tracing::warn!("Admin request rejected - no admin token configured");
        return Err(StatusCode::UNAUTHORIZED);
    };

    match bearer_token(headers) {
        Some(provided) if tokens_match(expected, provided) => Ok(()),
        Some(_) => {
            tracing::warn!("Admin request rejected - invalid token");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Admin request rejected - missing bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
