//! Session gate for orchard-ar
//!
//! A single shared login from `[auth]` in orchard.toml. A successful login
//! issues a random session token in the `orchard_session` cookie; protected
//! routes require a live token. With auth disabled every request passes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Session cookie name
pub const SESSION_COOKIE: &str = "orchard_session";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if !state.auth.enabled {
        return Ok(Json(json!({ "authenticated": true })).into_response());
    }

    let email_matches = request.email.trim().eq_ignore_ascii_case(state.auth.email.trim());
    if !email_matches || request.password != state.auth.password {
        warn!("Failed login attempt for '{}'", request.email.trim());
        return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = Uuid::new_v4();
    state.sessions.write().await.insert(token);
    info!("Session opened for '{}'", request.email.trim());

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, token
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "authenticated": true })),
    )
        .into_response())
}

/// POST /api/logout
///
/// Always succeeds; an unknown or missing token is simply ignored.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.write().await.remove(&token);
    }

    let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "authenticated": false })),
    )
        .into_response()
}

/// Authentication middleware
///
/// Applied to protected routes only. Returns 401 when auth is enabled and
/// the request carries no live session token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.auth.enabled {
        return Ok(next.run(request).await);
    }

    let authorized = match session_token(request.headers()) {
        Some(token) => state.sessions.read().await.contains(&token),
        None => false,
    };
    if !authorized {
        return Err(ApiError::Unauthorized("Login required".to_string()));
    }

    Ok(next.run(request).await)
}

/// Session token from the `Cookie` header(s), if well-formed
fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}
