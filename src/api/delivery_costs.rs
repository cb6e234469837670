use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::Admin;
use super::extract::{AppJson, AppQuery};
use super::response::{ApiResponse, ApiResult};
use super::AppState;
use crate::domain::aggregates::{DeliveryCost, DeliveryCostRequest};

#[derive(Debug, Default, Deserialize)]
pub struct LocationParams {
    pub location: Option<String>,
}

pub async fn list_delivery_costs(
    State(s): State<AppState>,
    AppQuery(p): AppQuery<LocationParams>,
) -> ApiResult<Vec<DeliveryCost>> {
    let costs = s.services.delivery_costs.list(p.location.as_deref()).await?;
    Ok(ApiResponse::ok("delivery costs retrieved", costs))
}

pub async fn get_delivery_cost(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeliveryCost> {
    let cost = s.services.delivery_costs.get(id).await?;
    Ok(ApiResponse::ok("delivery cost retrieved", cost))
}

pub async fn add_delivery_cost(
    State(s): State<AppState>,
    _: Admin,
    AppJson(r): AppJson<DeliveryCostRequest>,
) -> ApiResult<DeliveryCost> {
    let cost = s.services.delivery_costs.add(&r).await?;
    Ok(ApiResponse::created("delivery cost added", cost))
}

pub async fn update_delivery_cost(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
    AppJson(r): AppJson<DeliveryCostRequest>,
) -> ApiResult<DeliveryCost> {
    let cost = s.services.delivery_costs.update(id, &r).await?;
    Ok(ApiResponse::ok("delivery cost updated", cost))
}

pub async fn delete_delivery_cost(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    s.services.delivery_costs.delete(id).await?;
    Ok(ApiResponse::done("delivery cost deleted"))
}
