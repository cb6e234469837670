use axum::extract::{Path, State};
use uuid::Uuid;

use super::auth::Admin;
use super::extract::{AppJson, AppQuery};
use super::response::{ApiResponse, ApiResult};
use super::AppState;
use crate::domain::aggregates::{
    ContactRequest, ContactSubmission, SubmissionFilter, SubmissionPage,
};

pub async fn submit_contact(
    State(s): State<AppState>,
    AppJson(r): AppJson<ContactRequest>,
) -> ApiResult<ContactSubmission> {
    let submission = s.services.contacts.submit(&r).await?;
    Ok(ApiResponse::created("contact form submitted", submission))
}

pub async fn list_contacts(
    State(s): State<AppState>,
    _: Admin,
    AppQuery(filter): AppQuery<SubmissionFilter>,
) -> ApiResult<SubmissionPage<ContactSubmission>> {
    let page = s.services.contacts.list(&filter).await?;
    Ok(ApiResponse::ok("contact submissions retrieved", page))
}

pub async fn get_contact(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
) -> ApiResult<ContactSubmission> {
    let submission = s.services.contacts.get(id).await?;
    Ok(ApiResponse::ok("contact submission retrieved", submission))
}

pub async fn delete_contact(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    s.services.contacts.delete(id).await?;
    Ok(ApiResponse::done("contact submission deleted"))
}
