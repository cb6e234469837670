use axum::extract::{Path, State};
use uuid::Uuid;

use super::auth::Admin;
use super::extract::AppJson;
use super::response::{ApiResponse, ApiResult};
use super::AppState;
use crate::domain::aggregates::{Discount, DiscountRequest};

pub async fn list_discounts(State(s): State<AppState>) -> ApiResult<Vec<Discount>> {
    let discounts = s.services.discounts.list().await?;
    Ok(ApiResponse::ok("discounts retrieved", discounts))
}

pub async fn add_discount(
    State(s): State<AppState>,
    _: Admin,
    AppJson(r): AppJson<DiscountRequest>,
) -> ApiResult<Discount> {
    let discount = s.services.discounts.add(&r).await?;
    Ok(ApiResponse::created("discount added", discount))
}

pub async fn update_discount(
    State(s): State<AppState>,
    _: Admin,
    AppJson(r): AppJson<DiscountRequest>,
) -> ApiResult<Discount> {
    let discount = s.services.discounts.update(&r).await?;
    Ok(ApiResponse::ok("discount updated", discount))
}

pub async fn delete_discount(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    s.services.discounts.delete(id).await?;
    Ok(ApiResponse::done("discount deleted"))
}
