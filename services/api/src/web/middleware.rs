//! services/api/src/web/middleware.rs
//!
//! Session middleware for protecting routes.

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use wordtrail_core::ports::PortError;

use crate::error::ApiError;
use crate::web::state::AppState;

/// The session token travels as an explicit `session` query parameter,
/// never as a cookie. `?session=9f3c...`
#[derive(Deserialize)]
pub struct SessionQuery {
    pub session: Option<String>,
}

/// Middleware that resolves the `session` query parameter to a user.
///
/// If valid, the resolved `User` is inserted into request extensions
/// for handlers to use (and the session's last-used timestamp is
/// bumped). If missing or unknown, returns 401 before any handler runs.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionQuery>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = params.session.ok_or(ApiError::Unauthorized)?;

    let user = state
        .identity
        .resolve_session(&token)
        .await
        .map_err(session_rejection)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// An unknown or dangling token is a 401; anything else (a store
/// outage, say) stays a server fault and must not look like bad
/// credentials.
fn session_rejection(e: PortError) -> ApiError {
    match e {
        PortError::Unauthorized | PortError::NotFound(_) => {
            debug!("session rejected: {:?}", e);
            ApiError::Unauthorized
        }
        other => ApiError::Port(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn bad_tokens_map_to_401() {
        let response = session_rejection(PortError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response =
            session_rejection(PortError::NotFound("user gone".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn store_failures_stay_server_errors() {
        let response =
            session_rejection(PortError::Unexpected("connection refused".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
