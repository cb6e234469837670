use axum::extract::{Path, State};
use uuid::Uuid;

use super::auth::Admin;
use super::extract::{AppJson, AppQuery};
use super::response::{ApiResponse, ApiResult};
use super::AppState;
use crate::domain::aggregates::{AffiliateRequest, AffiliateStatusRequest, AffiliateSubmission};
use crate::domain::aggregates::{SubmissionFilter, SubmissionPage};

/// Public: no caller identity needed.
pub async fn submit_affiliate(
    State(s): State<AppState>,
    AppJson(r): AppJson<AffiliateRequest>,
) -> ApiResult<AffiliateSubmission> {
    let submission = s.services.affiliates.submit(&r).await?;
    Ok(ApiResponse::created("affiliate application submitted", submission))
}

pub async fn list_affiliates(
    State(s): State<AppState>,
    _: Admin,
    AppQuery(filter): AppQuery<SubmissionFilter>,
) -> ApiResult<SubmissionPage<AffiliateSubmission>> {
    let page = s.services.affiliates.list(&filter).await?;
    Ok(ApiResponse::ok("affiliate applications retrieved", page))
}

pub async fn get_affiliate(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
) -> ApiResult<AffiliateSubmission> {
    let submission = s.services.affiliates.get(id).await?;
    Ok(ApiResponse::ok("affiliate application retrieved", submission))
}

pub async fn update_affiliate_status(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
    AppJson(r): AppJson<AffiliateStatusRequest>,
) -> ApiResult<AffiliateSubmission> {
    let submission = s.services.affiliates.update_status(id, &r).await?;
    Ok(ApiResponse::ok("affiliate application updated", submission))
}

pub async fn delete_affiliate(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    s.services.affiliates.delete(id).await?;
    Ok(ApiResponse::done("affiliate application deleted"))
}
