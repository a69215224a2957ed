// ViewerContext Middleware - builds the request-scoped identity
// The upstream identity collaborator authenticates the session and forwards
// the result in headers; this layer turns them into a ViewerContext.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::infrastructure::viewer::ViewerContext;
use crate::models::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USERNAME_HEADER: &str = "x-username";

/// Authentication information extracted from request
#[derive(Debug, Clone, PartialEq)]
pub struct AuthInfo {
    pub user_id: Option<UserId>,
    pub username: Option<String>,
}

/// Injects an `Arc<ViewerContext>` into the request extensions
pub async fn viewer_context_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_info = extract_auth_from_request(request.headers())?;
    let viewer_context = create_viewer_context(auth_info);
    debug!(
        request_id = %viewer_context.request_id,
        user_id = ?viewer_context.user_id,
        "viewer context created"
    );

    request.extensions_mut().insert(viewer_context);
    Ok(next.run(request).await)
}

/// Read the identity headers. A present but malformed user id is a bad request.
fn extract_auth_from_request(headers: &HeaderMap) -> Result<AuthInfo, StatusCode> {
    let user_id = match headers.get(USER_ID_HEADER) {
        Some(value) => {
            let raw = value.to_str().map_err(|_| StatusCode::BAD_REQUEST)?;
            Some(raw.trim().parse::<UserId>().map_err(|_| StatusCode::BAD_REQUEST)?)
        }
        None => None,
    };

    let username = headers
        .get(USERNAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    Ok(AuthInfo { user_id, username })
}

fn create_viewer_context(auth_info: AuthInfo) -> Arc<ViewerContext> {
    let viewer_context = match auth_info.user_id {
        Some(user_id) => {
            let request_id = format!("user-{}-{}", user_id, Uuid::new_v4());
            let username = auth_info.username.unwrap_or_else(|| format!("user{}", user_id));
            ViewerContext::authenticated_user(user_id, username, request_id)
        }
        None => ViewerContext::anonymous(format!("req-{}", Uuid::new_v4())),
    };
    Arc::new(viewer_context)
}
