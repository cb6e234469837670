use axum::extract::{Path, State};
use uuid::Uuid;

use super::auth::AuthUser;
use super::extract::AppJson;
use super::response::{ApiResponse, ApiResult};
use super::AppState;
use crate::domain::aggregates::{Address, AddressRequest};

pub async fn get_address(State(s): State<AppState>, user: AuthUser) -> ApiResult<Address> {
    let address = s.services.addresses.get_for_user(user.user_id).await?;
    Ok(ApiResponse::ok("address retrieved", address))
}

pub async fn add_address(
    State(s): State<AppState>,
    user: AuthUser,
    AppJson(r): AppJson<AddressRequest>,
) -> ApiResult<Address> {
    let address = s.services.addresses.add(user.user_id, &r).await?;
    Ok(ApiResponse::created("address added", address))
}

pub async fn update_address(
    State(s): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(r): AppJson<AddressRequest>,
) -> ApiResult<Address> {
    let address = s.services.addresses.update(id, user.user_id, &r).await?;
    Ok(ApiResponse::ok("address updated", address))
}
