//! Stock opname endpoints: physical count submission and resolution.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use koperasi_core::error::AppError;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::{require_role, AuthUser};
use crate::models::{OpnameStatus, Role};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOpnameRequest {
    pub item_id: Uuid,
    #[validate(range(min = 0))]
    pub counted_stock: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectOpnameRequest {
    #[validate(length(min = 1, max = 512))]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct OpnameListParams {
    pub status: Option<String>,
}

pub async fn create_opname(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateOpnameRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin, Role::Kasir])?;
    payload.validate()?;

    let opname = state
        .db
        .create_opname(payload.item_id, payload.counted_stock, claims.user_id()?)
        .await?;

    Ok((StatusCode::CREATED, Json(opname)))
}

pub async fn approve_opname(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(opname_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin, Role::Kasir])?;

    let opname = state.db.approve_opname(opname_id, claims.user_id()?).await?;

    Ok(Json(opname))
}

pub async fn reject_opname(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(opname_id): Path<Uuid>,
    Json(payload): Json<RejectOpnameRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin, Role::Kasir])?;
    payload.validate()?;

    let opname = state
        .db
        .reject_opname(opname_id, claims.user_id()?, &payload.reason)
        .await?;

    Ok(Json(opname))
}

pub async fn list_opnames(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(params): Query<OpnameListParams>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin, Role::Kasir])?;

    let status_filter = params
        .status
        .as_deref()
        .map(|s| {
            OpnameStatus::parse(s).ok_or_else(|| {
                AppError::UnprocessableEntity(anyhow::anyhow!("Unknown status filter: {}", s))
            })
        })
        .transpose()?;

    let opnames = state.db.list_opnames(status_filter).await?;

    Ok(Json(opnames))
}
