//! Login and identity endpoints.
//!
//! Login is the only place role strings and member ownership are
//! resolved; everything downstream trusts the token claims.

use axum::{extract::State, response::IntoResponse, Json};
use koperasi_core::error::AppError;
use koperasi_core::utils::password::{verify_password, Password, PasswordHashString};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::middleware::AuthUser;
use crate::models::Role;
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in_minutes: i64,
    pub role: Role,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .db
        .get_user_by_username(&payload.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Invalid credentials")))?;

    if !user.active {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Account is deactivated"
        )));
    }

    verify_password(
        &Password::new(payload.password),
        &PasswordHashString::new(user.password_hash.clone()),
    )
    .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid credentials")))?;

    // A stored role outside the closed set means corrupt data, not a
    // default role.
    let role = user.parsed_role().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!("Unknown role '{}' on user record", user.role))
    })?;

    let member_id = match role {
        Role::Anggota => state
            .db
            .get_member_by_user(user.user_id)
            .await?
            .map(|m| m.member_id),
        _ => None,
    };

    let token = state.jwt.generate_token(user.user_id, role, member_id)?;

    tracing::info!(user_id = %user.user_id, role = %role, "User logged in");

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in_minutes: state.config.auth.token_expiry_minutes,
        role,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .db
        .get_user(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(user))
}

/// The caller's own member row, resolved from the token - never from a
/// client-supplied id.
pub async fn my_member(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let member_id = claims
        .parsed_member_id()?
        .ok_or_else(|| AppError::Forbidden(anyhow::anyhow!("No member record for this account")))?;

    let member = state
        .db
        .get_member(member_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Member not found")))?;

    Ok(Json(member))
}
