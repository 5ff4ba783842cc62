//! Cashier cash deposit (setoran) endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use koperasi_core::error::AppError;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::{require_role, AuthUser};
use crate::models::{DepositStatus, Role};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDepositRequest {
    pub nominal: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct DepositListParams {
    pub status: Option<String>,
}

pub async fn create_deposit(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateDepositRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Kasir])?;

    let deposit = state
        .db
        .create_deposit(claims.user_id()?, payload.nominal)
        .await?;

    Ok((StatusCode::CREATED, Json(deposit)))
}

pub async fn approve_deposit(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(deposit_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin])?;

    let deposit = state
        .db
        .approve_deposit(deposit_id, claims.user_id()?)
        .await?;

    Ok(Json(deposit))
}

pub async fn list_deposits(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(params): Query<DepositListParams>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin, Role::Kasir])?;

    // Cashiers see their own deposits, admin sees all of them.
    let kasir_filter = match claims.role {
        Role::Kasir => Some(claims.user_id()?),
        _ => None,
    };

    let status_filter = params
        .status
        .as_deref()
        .map(|s| {
            DepositStatus::parse(s).ok_or_else(|| {
                AppError::UnprocessableEntity(anyhow::anyhow!("Unknown status filter: {}", s))
            })
        })
        .transpose()?;

    let deposits = state.db.list_deposits(kasir_filter, status_filter).await?;

    Ok(Json(deposits))
}
