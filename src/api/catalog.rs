use axum::extract::{Path, State};
use uuid::Uuid;

use super::auth::Admin;
use super::extract::{AppJson, AppQuery};
use super::response::{ApiResponse, ApiResult};
use super::AppState;
use crate::domain::aggregates::{Category, CategoryRequest, Product, ProductFilter, ProductRequest};

pub async fn list_products(
    State(s): State<AppState>,
    AppQuery(filter): AppQuery<ProductFilter>,
) -> ApiResult<Vec<Product>> {
    let products = s.services.catalog.list_products(&filter).await?;
    Ok(ApiResponse::ok("products retrieved", products))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Product> {
    let product = s.services.catalog.get_product(id).await?;
    Ok(ApiResponse::ok("product retrieved", product))
}

pub async fn create_product(
    State(s): State<AppState>,
    _: Admin,
    AppJson(r): AppJson<ProductRequest>,
) -> ApiResult<Product> {
    let product = s.services.catalog.create_product(&r).await?;
    Ok(ApiResponse::created("product created", product))
}

pub async fn update_product(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
    AppJson(r): AppJson<ProductRequest>,
) -> ApiResult<Product> {
    let product = s.services.catalog.update_product(id, &r).await?;
    Ok(ApiResponse::ok("product updated", product))
}

pub async fn delete_product(
    State(s): State<AppState>,
    _: Admin,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    s.services.catalog.delete_product(id).await?;
    Ok(ApiResponse::done("product deleted"))
}

pub async fn list_categories(State(s): State<AppState>) -> ApiResult<Vec<Category>> {
    let categories = s.services.catalog.list_categories().await?;
    Ok(ApiResponse::ok("categories retrieved", categories))
}

pub async fn get_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Category> {
    let category = s.services.catalog.get_category(id).await?;
    Ok(ApiResponse::ok("category retrieved", category))
}

pub async fn create_category(
    State(s): State<AppState>,
    _: Admin,
    AppJson(r): AppJson<CategoryRequest>,
) -> ApiResult<Category> {
    let category = s.services.catalog.create_category(&r).await?;
    Ok(ApiResponse::created("category created", category))
}
