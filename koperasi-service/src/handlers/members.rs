//! Member and user administration. Admin only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use koperasi_core::error::AppError;
use koperasi_core::utils::password::{hash_password, Password};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::{require_role, AuthUser};
use crate::models::{CreateMember, Role};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: Role,
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 32))]
    pub member_number: String,
    /// Optional link to an existing anggota user account.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page_size: Option<i32>,
    pub page_token: Option<Uuid>,
}

pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin])?;
    payload.validate()?;

    let hash = hash_password(&Password::new(payload.password))?;

    let user = state
        .db
        .create_user(
            &payload.username,
            hash.as_str(),
            payload.role.as_str(),
            &payload.full_name,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn create_member(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin])?;
    payload.validate()?;

    let member = state
        .db
        .create_member(&CreateMember {
            user_id: payload.user_id,
            member_number: payload.member_number,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn list_members(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin, Role::Kasir])?;

    let members = state
        .db
        .list_members(params.page_size.unwrap_or(50), params.page_token)
        .await?;

    Ok(Json(members))
}

pub async fn get_member(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(member_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin, Role::Kasir])?;

    let member = state
        .db
        .get_member(member_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Member not found")))?;

    Ok(Json(member))
}

pub async fn deactivate_member(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(member_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin])?;

    let member = state
        .db
        .deactivate_member(member_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Member not found")))?;

    Ok(Json(member))
}
