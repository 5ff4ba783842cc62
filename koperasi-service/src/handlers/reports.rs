//! Reporting endpoints. Admin only.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use koperasi_core::error::AppError;
use serde::Deserialize;

use crate::middleware::{require_role, AuthUser};
use crate::models::Role;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Settled-sales totals over an optional time window.
pub async fn sales_summary(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(params): Query<SummaryParams>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin])?;

    let summary = state.db.sales_summary(params.start, params.end).await?;

    Ok(Json(summary))
}
