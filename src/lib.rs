//! Flexfume Commerce
//!
//! Storefront backend for a fragrance shop.
//!
//! ## Features
//! - Product catalog, categories and per-product discounts
//! - Coupons with per-user usage limits
//! - Delivery cost tables
//! - Carts, coupon application and order placement
//! - Admin delivery status management
//! - Address book, affiliate applications and contact form intake

pub mod api;
pub mod config;
pub mod domain;
pub mod events;
pub mod pricing;
pub mod services;
pub mod store;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::{Money, ValueError};

// =============================================================================
// Error Types
// =============================================================================

/// Broad class of a [`CommerceError`]. The HTTP layer maps these to status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    BusinessRule,
    Conflict,
    Persistence,
}

#[derive(Error, Debug)]
pub enum CommerceError {
    #[error("product {0} not found")]
    ProductNotFound(Uuid),

    #[error("category not found")]
    CategoryNotFound,

    #[error("discount not found")]
    DiscountNotFound,

    #[error("coupon not found")]
    CouponNotFound,

    #[error("delivery cost not found")]
    DeliveryCostNotFound,

    #[error("order not found")]
    OrderNotFound,

    #[error("coupon usage not found")]
    UsageNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("cart items not found")]
    CartItemsNotFound,

    #[error("address not found")]
    AddressNotFound,

    #[error("affiliate submission not found")]
    AffiliateSubmissionNotFound,

    #[error("contact submission not found")]
    ContactSubmissionNotFound,

    #[error("invalid coupon type {0:?}, must be PERCENTAGE or FIXED")]
    InvalidCouponType(String),

    #[error("invalid order status {0:?}")]
    InvalidOrderStatus(String),

    #[error("invalid affiliate status {0:?}")]
    InvalidAffiliateStatus(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("at least one social media handle is required")]
    NoSocialMediaProvided,

    #[error("invalid email format")]
    InvalidEmail,

    #[error("invalid phone format")]
    InvalidPhone,

    #[error("{0}")]
    Validation(String),

    #[error("insufficient stock for product {product}")]
    InsufficientStock { product: String },

    #[error("coupon is not active")]
    CouponInactive,

    #[error("coupon has expired")]
    CouponExpired,

    #[error("order amount {subtotal} is below the coupon minimum {minimum}")]
    MinOrderNotMet { subtotal: Money, minimum: Money },

    #[error("coupon usage limit exceeded")]
    UsageLimitExceeded,

    #[error("coupon code already exists")]
    CouponCodeExists,

    #[error("cannot delete coupon that has been used")]
    CouponHasUsage,

    #[error("discount already exists for this product")]
    DiscountAlreadyExists,

    #[error("address already exists for this user")]
    AddressAlreadyExists,

    #[error("order placement failed: {0}")]
    OrderPlacementFailed(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl CommerceError {
    pub fn kind(&self) -> ErrorKind {
        use CommerceError::*;
        match self {
            ProductNotFound(_)
            | CategoryNotFound
            | DiscountNotFound
            | CouponNotFound
            | DeliveryCostNotFound
            | OrderNotFound
            | UsageNotFound
            | UserNotFound
            | CartItemsNotFound
            | AddressNotFound
            | AffiliateSubmissionNotFound
            | ContactSubmissionNotFound => ErrorKind::NotFound,
            InvalidCouponType(_)
            | InvalidOrderStatus(_)
            | InvalidAffiliateStatus(_)
            | MissingField(_)
            | NoSocialMediaProvided
            | InvalidEmail
            | InvalidPhone
            | Validation(_) => ErrorKind::Validation,
            InsufficientStock { .. }
            | CouponInactive
            | CouponExpired
            | MinOrderNotMet { .. }
            | UsageLimitExceeded
            | CouponCodeExists
            | CouponHasUsage
            | DiscountAlreadyExists => ErrorKind::BusinessRule,
            AddressAlreadyExists => ErrorKind::Conflict,
            OrderPlacementFailed(_) | Storage(_) => ErrorKind::Persistence,
        }
    }

    /// Stable machine-readable code, safe to match on in clients.
    pub fn code(&self) -> &'static str {
        use CommerceError::*;
        match self {
            ProductNotFound(_) => "product_not_found",
            CategoryNotFound => "category_not_found",
            DiscountNotFound => "discount_not_found",
            CouponNotFound => "coupon_not_found",
            DeliveryCostNotFound => "delivery_cost_not_found",
            OrderNotFound => "order_not_found",
            UsageNotFound => "usage_not_found",
            UserNotFound => "user_not_found",
            CartItemsNotFound => "cart_items_not_found",
            AddressNotFound => "address_not_found",
            AffiliateSubmissionNotFound => "affiliate_submission_not_found",
            ContactSubmissionNotFound => "contact_submission_not_found",
            InvalidCouponType(_) => "invalid_coupon_type",
            InvalidOrderStatus(_) => "invalid_order_status",
            InvalidAffiliateStatus(_) => "invalid_affiliate_status",
            MissingField(_) => "missing_field",
            NoSocialMediaProvided => "no_social_media_provided",
            InvalidEmail => "invalid_email",
            InvalidPhone => "invalid_phone",
            Validation(_) => "validation_failed",
            InsufficientStock { .. } => "insufficient_stock",
            CouponInactive => "coupon_inactive",
            CouponExpired => "coupon_expired",
            MinOrderNotMet { .. } => "min_order_not_met",
            UsageLimitExceeded => "usage_limit_exceeded",
            CouponCodeExists => "coupon_code_exists",
            CouponHasUsage => "coupon_has_usage",
            DiscountAlreadyExists => "discount_already_exists",
            AddressAlreadyExists => "address_already_exists",
            OrderPlacementFailed(_) => "order_placement_failed",
            Storage(_) => "storage_error",
        }
    }
}

impl From<sqlx::Error> for CommerceError {
    fn from(e: sqlx::Error) -> Self {
        CommerceError::Storage(e.to_string())
    }
}

impl From<validator::ValidationErrors> for CommerceError {
    fn from(e: validator::ValidationErrors) -> Self {
        CommerceError::Validation(e.to_string())
    }
}

impl From<ValueError> for CommerceError {
    fn from(e: ValueError) -> Self {
        CommerceError::Validation(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CommerceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(CommerceError::CouponNotFound.kind(), ErrorKind::NotFound);
        let status = CommerceError::InvalidOrderStatus("LOST".into());
        assert_eq!(status.kind(), ErrorKind::Validation);
        let limit = CommerceError::UsageLimitExceeded;
        assert_eq!(limit.kind(), ErrorKind::BusinessRule);
        let address = CommerceError::AddressAlreadyExists;
        assert_eq!(address.kind(), ErrorKind::Conflict);
        let storage = CommerceError::Storage("boom".into());
        assert_eq!(storage.kind(), ErrorKind::Persistence);
    }

    #[test]
    fn test_min_order_message() {
        let err = CommerceError::MinOrderNotMet {
            subtotal: Money::from_major(80),
            minimum: Money::from_major(100),
        };
        assert_eq!(err.code(), "min_order_not_met");
        assert_eq!(
            err.to_string(),
            "order amount 80.00 is below the coupon minimum 100.00"
        );
    }
}
