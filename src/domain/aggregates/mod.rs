//! Aggregates module
pub mod address;
pub mod affiliate;
pub mod cart;
pub mod contact;
pub mod coupon;
pub mod coupon_usage;
pub mod delivery_cost;
pub mod discount;
pub mod order;
pub mod paging;
pub mod product;

pub use address::{Address, AddressRequest};
pub use affiliate::{AffiliateRequest, AffiliateStatus, AffiliateStatusRequest, AffiliateSubmission};
pub use cart::{AddToCartRequest, CartItem};
pub use contact::{ContactRequest, ContactSubmission};
pub use coupon::{Coupon, CouponRequest, CouponStats, CouponType, CouponWithStats};
pub use coupon_usage::{CouponUsage, CouponUse, UseKind};
pub use delivery_cost::{DeliveryCost, DeliveryCostRequest};
pub use discount::{Discount, DiscountRequest};
pub use order::{
    DeliveryStatus, NewOrder, Order, OrderFilter, OrderItem, OrderItemRequest, OrderPage,
    OrderQuery, PaymentStatus, PlaceOrderRequest, ShippingAddress, DEFAULT_PAYMENT_METHOD,
};
pub use paging::{page_of, PageQuery, SubmissionFilter, SubmissionPage};
pub use product::{
    Category, CategoryRequest, Product, ProductFilter, ProductPricing, ProductRequest,
};
