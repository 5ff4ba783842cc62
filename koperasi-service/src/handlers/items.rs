//! Inventory endpoints. Writes are admin only; every authenticated role
//! can browse the storefront list.

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
use validator::Validate;

use crate::middleware::{require_role, AuthUser};
use crate::models::{CreateItem, Role, UpdateItem};
use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(range(min = 0))]
    pub stock: i32,
    pub cost_price: Decimal,
    pub sale_price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub cost_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ItemListParams {
    pub include_inactive: Option<bool>,
    pub page_size: Option<i32>,
    pub page_token: Option<Uuid>,
}

fn check_prices(cost_price: Option<Decimal>, sale_price: Option<Decimal>) -> Result<(), AppError> {
    for price in [cost_price, sale_price].into_iter().flatten() {
        if price < Decimal::ZERO {
            return Err(AppError::UnprocessableEntity(anyhow::anyhow!(
                "prices must be non-negative"
            )));
        }
    }
    Ok(())
}

pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin])?;
    payload.validate()?;
    check_prices(Some(payload.cost_price), Some(payload.sale_price))?;

    let item = state
        .db
        .create_item(&CreateItem {
            name: payload.name,
            stock: payload.stock,
            cost_price: payload.cost_price,
            sale_price: payload.sale_price,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(params): Query<ItemListParams>,
) -> Result<impl IntoResponse, AppError> {
    // Inactive items stay visible to staff for bookkeeping; the member
    // storefront only ever sees active ones.
    let include_inactive =
        params.include_inactive.unwrap_or(false) && claims.role != Role::Anggota;

    let items = state
        .db
        .list_items(
            !include_inactive,
            params.page_size.unwrap_or(50),
            params.page_token,
        )
        .await?;

    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let item = state
        .db
        .get_item(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item not found")))?;

    Ok(Json(item))
}

pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin])?;
    payload.validate()?;
    check_prices(payload.cost_price, payload.sale_price)?;

    let item = state
        .db
        .update_item(
            item_id,
            &UpdateItem {
                name: payload.name,
                stock: payload.stock,
                cost_price: payload.cost_price,
                sale_price: payload.sale_price,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item not found")))?;

    Ok(Json(item))
}

pub async fn deactivate_item(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    require_role(&claims, &[Role::Admin])?;

    let item = state
        .db
        .deactivate_item(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item not found")))?;

    Ok(Json(item))
}
