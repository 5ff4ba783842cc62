//! Debt payment endpoints. Members request; staff resolve.

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
use crate::models::{DebtPaymentStatus, DebtSource, Role};
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDebtPaymentRequest {
    pub nominal: Decimal,
    pub source: DebtSource,
    /// Staff may submit on behalf of a member at the counter. Ignored
    /// for anggota callers.
    pub member_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct DebtListParams {
    pub member_id: Option<Uuid>,
    pub status: Option<String>,
    pub page_size: Option<i32>,
}

pub async fn create_debt_payment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateDebtPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let member_id = match claims.role {
        Role::Anggota => claims.parsed_member_id()?.ok_or_else(|| {
            AppError::Forbidden(anyhow::anyhow!("No member record for this account"))
        })?,
        _ => payload.member_id.ok_or_else(|| {
            AppError::UnprocessableEntity(anyhow::anyhow!("member_id is required"))
        })?,
    };

    let payment = state
        .db
        .create_debt_payment(member_id, payload.nominal, payload.source)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn approve_debt_payment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin, Role::Kasir])?;

    let payment = state
        .db
        .approve_debt_payment(payment_id, claims.user_id()?)
        .await?;

    Ok(Json(payment))
}

pub async fn reject_debt_payment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin, Role::Kasir])?;

    let payment = state
        .db
        .reject_debt_payment(payment_id, claims.user_id()?)
        .await?;

    Ok(Json(payment))
}

pub async fn list_debt_payments(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(params): Query<DebtListParams>,
) -> Result<impl IntoResponse, AppError> {
    let member_filter = match claims.role {
        Role::Anggota => Some(claims.parsed_member_id()?.ok_or_else(|| {
            AppError::Forbidden(anyhow::anyhow!("No member record for this account"))
        })?),
        _ => params.member_id,
    };

    let status_filter = params
        .status
        .as_deref()
        .map(|s| {
            DebtPaymentStatus::parse(s).ok_or_else(|| {
                AppError::UnprocessableEntity(anyhow::anyhow!("Unknown status filter: {}", s))
            })
        })
        .transpose()?;

    let payments = state
        .db
        .list_debt_payments(member_filter, status_filter, params.page_size.unwrap_or(50))
        .await?;

    Ok(Json(payments))
}
