use axum::extract::{Path, State};
use uuid::Uuid;

use super::auth::AuthUser;
use super::extract::AppJson;
use super::response::{ApiResponse, ApiResult};
use super::AppState;
use crate::domain::aggregates::{AddToCartRequest, CartItem};

pub async fn get_cart(State(s): State<AppState>, user: AuthUser) -> ApiResult<Vec<CartItem>> {
    let items = s.services.carts.list(user.user_id).await?;
    Ok(ApiResponse::ok("cart retrieved", items))
}

pub async fn add_to_cart(
    State(s): State<AppState>,
    user: AuthUser,
    AppJson(r): AppJson<AddToCartRequest>,
) -> ApiResult<CartItem> {
    let item = s.services.carts.add(user.user_id, &r).await?;
    Ok(ApiResponse::created("added to cart", item))
}

pub async fn remove_cart_line(
    State(s): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    s.services.carts.remove(user.user_id, id).await?;
    Ok(ApiResponse::done("removed from cart"))
}

pub async fn clear_cart(State(s): State<AppState>, user: AuthUser) -> ApiResult<()> {
    s.services.carts.clear(user.user_id).await?;
    Ok(ApiResponse::done("cart cleared"))
}
