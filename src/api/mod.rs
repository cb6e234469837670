//! HTTP surface.

use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::services::Services;

pub mod auth;
pub mod error;
pub mod extract;
pub mod response;

mod address;
mod affiliates;
mod cart;
mod catalog;
mod contacts;
mod coupons;
mod delivery_costs;
mod discounts;
mod orders;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "flexfume-commerce"}))
}

/// Routes without middleware; the binary adds tracing and CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/api/v1/products/:id",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route(
            "/api/v1/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route("/api/v1/categories/:id", get(catalog::get_category))
        .route(
            "/api/v1/discounts",
            get(discounts::list_discounts)
                .post(discounts::add_discount)
                .put(discounts::update_discount),
        )
        .route("/api/v1/discounts/:id", delete(discounts::delete_discount))
        .route(
            "/api/v1/delivery-costs",
            get(delivery_costs::list_delivery_costs).post(delivery_costs::add_delivery_cost),
        )
        .route(
            "/api/v1/delivery-costs/:id",
            get(delivery_costs::get_delivery_cost)
                .put(delivery_costs::update_delivery_cost)
                .delete(delivery_costs::delete_delivery_cost),
        )
        .route(
            "/api/v1/coupons",
            get(coupons::list_coupons).post(coupons::create_coupon),
        )
        .route(
            "/api/v1/coupons/:id",
            get(coupons::get_coupon)
                .put(coupons::update_coupon)
                .delete(coupons::delete_coupon),
        )
        .route("/api/v1/coupons/code/:code", get(coupons::coupon_by_code))
        .route("/api/v1/coupon-usages/apply", post(coupons::apply_coupon))
        .route(
            "/api/v1/coupon-usages/:code",
            get(coupons::get_usage).delete(coupons::remove_coupon),
        )
        .route(
            "/api/v1/cart",
            get(cart::get_cart)
                .post(cart::add_to_cart)
                .delete(cart::clear_cart),
        )
        .route("/api/v1/cart/:id", delete(cart::remove_cart_line))
        .route(
            "/api/v1/orders",
            get(orders::filter_orders).post(orders::place_order),
        )
        .route("/api/v1/orders/history", get(orders::order_history))
        .route("/api/v1/orders/:id", get(orders::get_order))
        .route(
            "/api/v1/orders/:id/status",
            put(orders::update_order_status),
        )
        .route(
            "/api/v1/address",
            get(address::get_address).post(address::add_address),
        )
        .route("/api/v1/address/:id", put(address::update_address))
        .route(
            "/api/v1/affiliate/submit",
            post(affiliates::submit_affiliate),
        )
        .route(
            "/api/v1/affiliate/applications",
            get(affiliates::list_affiliates),
        )
        .route(
            "/api/v1/affiliate/applications/:id",
            get(affiliates::get_affiliate).delete(affiliates::delete_affiliate),
        )
        .route(
            "/api/v1/affiliate/applications/:id/status",
            put(affiliates::update_affiliate_status),
        )
        .route(
            "/api/v1/contact",
            get(contacts::list_contacts).post(contacts::submit_contact),
        )
        .route(
            "/api/v1/contact/:id",
            get(contacts::get_contact).delete(contacts::delete_contact),
        )

        .with_state(state)
}
