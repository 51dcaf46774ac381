//! services/api/src/web/auth.rs
//!
//! Registration and session-creation endpoints. Both are public; both
//! answer with a fresh session token as a plain string.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;
use wordtrail_core::ports::PortError;

use crate::error::ApiError;
use crate::web::{parse_form, state::AppState};

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, Default, ToSchema)]
pub struct CredentialsForm {
    pub password: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /adduser/{email} - Register a user, then delegate to session
/// creation: the response is a session token, exactly as if the user had
/// logged in right after registering.
#[utoipa::path(
    post,
    path = "/adduser/{email}",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    params(("email" = String, Path, description = "Email address to register")),
    responses(
        (status = 200, description = "Session token for the new user", body = String),
        (status = 400, description = "Missing password or email already registered")
    )
)]
pub async fn add_user_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    body: Bytes,
) -> Result<String, ApiError> {
    let form: CredentialsForm = parse_form(&body)?;
    let password = form
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("password is required".to_string()))?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })?
        .to_string();

    // Duplicate registration surfaces as Conflict -> 400.
    let user = state.identity.create_user(&email, &password_hash).await?;

    issue_session(&state, user.user_id).await
}

/// POST /session/{email} - Verify credentials and mint a new session
/// token. Many concurrent sessions per user are allowed.
#[utoipa::path(
    post,
    path = "/session/{email}",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    params(("email" = String, Path, description = "Email address of the account")),
    responses(
        (status = 200, description = "Session token", body = String),
        (status = 400, description = "Missing password"),
        (status = 401, description = "Unknown email or wrong password")
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    body: Bytes,
) -> Result<String, ApiError> {
    let form: CredentialsForm = parse_form(&body)?;
    let password = form
        .password
        .ok_or_else(|| ApiError::BadRequest("password is required".to_string()))?;

    // An unknown email is indistinguishable from a wrong password.
    let credentials = state
        .identity
        .credentials_by_email(&email)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => ApiError::Unauthorized,
            other => ApiError::Port(other),
        })?;

    let parsed_hash = PasswordHash::new(&credentials.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    issue_session(&state, credentials.user_id).await
}

/// Generates an opaque token and persists the session for the user.
async fn issue_session(state: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    let token = Uuid::new_v4().to_string();
    let session = state.identity.create_session(&token, user_id).await?;
    Ok(session.id)
}
