//! Sale endpoints.
//!
//! A cashier posts a direct sale that settles immediately; a member
//! self-checkout posts as `pending` and is settled at the counter. The
//! member id on a self-checkout always comes from the token.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use koperasi_core::error::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{require_role, AuthUser};
use crate::models::{
    PaymentMethod, PostSale, Role, SaleLine, Transaction, TransactionLine, TransactionStatus,
};
use crate::services::metrics::SALES_TOTAL;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct PostSaleRequest {
    /// Staff-posted sales may name a member (or none for a walk-in).
    /// Ignored for anggota callers, whose own member id is used.
    pub member_id: Option<Uuid>,
    pub lines: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub lines: Vec<TransactionLine>,
}

#[derive(Debug, Deserialize)]
pub struct SaleListParams {
    pub member_id: Option<Uuid>,
    pub status: Option<TransactionStatus>,
    pub page_size: Option<i32>,
}

pub async fn post_sale(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<PostSaleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = match claims.role {
        Role::Admin | Role::Kasir => PostSale {
            member_id: payload.member_id,
            kasir_id: Some(claims.user_id()?),
            lines: payload.lines,
            payment_method: payload.payment_method,
        },
        Role::Anggota => {
            let member_id = claims.parsed_member_id()?.ok_or_else(|| {
                AppError::Forbidden(anyhow::anyhow!("No member record for this account"))
            })?;
            PostSale {
                member_id: Some(member_id),
                kasir_id: None,
                lines: payload.lines,
                payment_method: payload.payment_method,
            }
        }
    };

    let result = state.db.post_sale(&input, state.config.rules.debt_limit).await;

    match result {
        Ok((transaction, lines)) => {
            SALES_TOTAL.with_label_values(&["ok"]).inc();
            Ok((
                StatusCode::CREATED,
                Json(SaleResponse { transaction, lines }),
            ))
        }
        Err(e) => {
            SALES_TOTAL.with_label_values(&["error"]).inc();
            Err(e.into())
        }
    }
}

pub async fn settle_sale(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin, Role::Kasir])?;

    let transaction = state
        .db
        .settle_sale(transaction_id, claims.user_id()?)
        .await?;

    Ok(Json(transaction))
}

/// Staff cancel any pending sale; a member may cancel their own.
pub async fn cancel_sale(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if claims.role == Role::Anggota {
        let (transaction, _) = state
            .db
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Transaction not found")))?;
        if transaction.member_id != claims.parsed_member_id()? {
            return Err(AppError::NotFound(anyhow::anyhow!("Transaction not found")));
        }
    }

    let transaction = state.db.cancel_sale(transaction_id).await?;

    Ok(Json(transaction))
}

pub async fn get_sale(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (transaction, lines) = state
        .db
        .get_transaction(transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Transaction not found")))?;

    // Members only see their own transactions.
    if claims.role == Role::Anggota && transaction.member_id != claims.parsed_member_id()? {
        return Err(AppError::NotFound(anyhow::anyhow!("Transaction not found")));
    }

    Ok(Json(SaleResponse { transaction, lines }))
}

pub async fn list_sales(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(params): Query<SaleListParams>,
) -> Result<impl IntoResponse, AppError> {
    let member_filter = match claims.role {
        Role::Anggota => Some(claims.parsed_member_id()?.ok_or_else(|| {
            AppError::Forbidden(anyhow::anyhow!("No member record for this account"))
        })?),
        _ => params.member_id,
    };

    let transactions = state
        .db
        .list_transactions(member_filter, params.status, params.page_size.unwrap_or(50))
        .await?;

    Ok(Json(transactions))
}
