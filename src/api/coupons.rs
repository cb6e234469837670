use axum::extract::{Path, State};
use uuid::Uuid;

use super::auth::{Admin, AuthUser};
use super::extract::AppJson;
use super::response::{ApiResponse, ApiResult};
use super::AppState;
use crate::domain::aggregates::{Coupon, CouponRequest, CouponUsage, CouponWithStats};
use crate::services::{ApplyCouponRequest, CouponApplication};

pub async fn list_coupons(State(s): State<AppState>, _: Admin) -> ApiResult<Vec<CouponWithStats>> {
    let coupons = s.services.coupons.list_with_stats().await?;
    Ok(ApiResponse::ok("coupons retrieved", coupons))
}

pub async fn get_coupon(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
) -> ApiResult<Coupon> {
    let coupon = s.services.coupons.get(id).await?;
    Ok(ApiResponse::ok("coupon retrieved", coupon))
}

pub async fn create_coupon(
    State(s): State<AppState>,
    _: Admin,
    AppJson(r): AppJson<CouponRequest>,
) -> ApiResult<Coupon> {
    let coupon = s.services.coupons.create(&r).await?;
    Ok(ApiResponse::created("coupon created", coupon))
}

pub async fn update_coupon(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
    AppJson(r): AppJson<CouponRequest>,
) -> ApiResult<Coupon> {
    let coupon = s.services.coupons.update(id, &r).await?;
    Ok(ApiResponse::ok("coupon updated", coupon))
}

pub async fn delete_coupon(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    s.services.coupons.delete(id).await?;
    Ok(ApiResponse::done("coupon deleted"))
}

pub async fn coupon_by_code(
    State(s): State<AppState>,
    _: AuthUser,
    Path(code): Path<String>,
) -> ApiResult<Coupon> {
    let coupon = s.services.coupons.by_code(&code).await?;
    Ok(ApiResponse::ok("coupon retrieved", coupon))
}

pub async fn apply_coupon(
    State(s): State<AppState>,
    user: AuthUser,
    AppJson(r): AppJson<ApplyCouponRequest>,
) -> ApiResult<CouponApplication> {
    let usages = &s.services.coupon_usages;
    let application = usages.apply_coupon(user.user_id, &r).await?;
    Ok(ApiResponse::ok("coupon applied", application))
}

pub async fn get_usage(
    State(s): State<AppState>,
    user: AuthUser,
    Path(code): Path<String>,
) -> ApiResult<CouponUsage> {
    let usages = &s.services.coupon_usages;
    let usage = usages.get_usage(user.user_id, &code).await?;
    Ok(ApiResponse::ok("coupon usage retrieved", usage))
}

pub async fn remove_coupon(
    State(s): State<AppState>,
    user: AuthUser,
    Path(code): Path<String>,
) -> ApiResult<()> {
    let usages = &s.services.coupon_usages;
    usages.remove_coupon(user.user_id, &code).await?;
    Ok(ApiResponse::done("coupon removed"))
}
