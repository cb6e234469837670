use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::{Admin, AuthUser};
use super::error::ApiError;
use super::extract::{AppJson, AppQuery};
use super::response::{ApiResponse, ApiResult};
use super::AppState;
use crate::domain::aggregates::{Order, OrderFilter, OrderPage, PlaceOrderRequest};

pub async fn place_order(
    State(s): State<AppState>,
    user: AuthUser,
    AppJson(r): AppJson<PlaceOrderRequest>,
) -> ApiResult<Order> {
    let order = s.services.orders.place_order(user.user_id, &r).await?;
    Ok(ApiResponse::created("order placed", order))
}

pub async fn order_history(State(s): State<AppState>, user: AuthUser) -> ApiResult<Vec<Order>> {
    let orders = s.services.orders.history(user.user_id).await?;
    Ok(ApiResponse::ok("order history retrieved", orders))
}

pub async fn filter_orders(
    State(s): State<AppState>,
    _: Admin,
    AppQuery(filter): AppQuery<OrderFilter>,
) -> ApiResult<OrderPage> {
    let page = s.services.orders.filter(filter).await?;
    Ok(ApiResponse::ok("orders retrieved", page))
}

pub async fn get_order(
    State(s): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Order> {
    let orders = &s.services.orders;
    let order = orders.get_order(id, user.user_id, user.is_admin()).await?;
    Ok(ApiResponse::ok("order retrieved", order))
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub status: Option<String>,
}

/// `PUT /orders/:id/status?status=SHIPPED`
pub async fn update_order_status(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
    AppQuery(p): AppQuery<StatusParams>,
) -> ApiResult<Order> {
    let status = p
        .status
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("status parameter is required"))?;
    let order = s.services.orders.update_order_status(id, &status).await?;
    Ok(ApiResponse::ok("order status updated", order))
}
