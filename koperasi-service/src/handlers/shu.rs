//! SHU (sisa hasil usaha) endpoints: yearly distribution and topup of
//! accrued SHU into spendable saldo.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use koperasi_core::error::AppError;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::{require_role, AuthUser};
use crate::models::Role;
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct DistributeShuRequest {
    pub member_id: Uuid,
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ShuTopupRequest {
    pub member_id: Uuid,
    pub nominal: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ShuListParams {
    pub member_id: Option<Uuid>,
    pub year: Option<i32>,
}

pub async fn distribute_shu(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<DistributeShuRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin])?;
    payload.validate()?;

    let distribution = state
        .db
        .distribute_shu(payload.member_id, payload.year, payload.amount)
        .await?;

    Ok((StatusCode::CREATED, Json(distribution)))
}

pub async fn shu_topup(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<ShuTopupRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin])?;

    let member = state
        .db
        .apply_shu_topup(payload.member_id, payload.nominal)
        .await?;

    Ok(Json(member))
}

pub async fn list_shu_distributions(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(params): Query<ShuListParams>,
) -> Result<impl IntoResponse, AppError> {
    let member_filter = match claims.role {
        Role::Anggota => Some(claims.parsed_member_id()?.ok_or_else(|| {
            AppError::Forbidden(anyhow::anyhow!("No member record for this account"))
        })?),
        _ => params.member_id,
    };

    let distributions = state
        .db
        .list_shu_distributions(member_filter, params.year)
        .await?;

    Ok(Json(distributions))
}
