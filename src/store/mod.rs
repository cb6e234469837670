//! Storage seams.
//!
//! One trait per collaborator the services talk to. Both [`PgStore`] and
//! [`MemoryStore`] implement all of them; services hold them as `Arc<dyn _>`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::aggregates::{
    Address, AffiliateStatus, AffiliateSubmission, CartItem, Category, ContactSubmission, Coupon,
    CouponStats, CouponUsage, CouponUse, DeliveryCost, DeliveryStatus, Discount, NewOrder, Order,
    OrderQuery, PageQuery, Product, ProductFilter, ProductPricing,
};
use crate::domain::value_objects::Quantity;
use crate::Result;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Products and categories. Soft-deleted products are invisible to every read.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Price, stock and active discount of a live product.
    async fn product_pricing(&self, id: Uuid) -> Result<Option<ProductPricing>>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn update_product(&self, product: &Product) -> Result<bool>;
    async fn delete_product(&self, id: Uuid) -> Result<bool>;
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>>;
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn insert_category(&self, category: &Category) -> Result<()>;
}

#[async_trait]
pub trait DiscountStore: Send + Sync {
    async fn discount_for_product(&self, product_id: Uuid) -> Result<Option<Discount>>;
    async fn find_discount(&self, id: Uuid) -> Result<Option<Discount>>;
    async fn list_discounts(&self) -> Result<Vec<Discount>>;
    async fn insert_discount(&self, discount: &Discount) -> Result<()>;
    async fn update_discount(&self, discount: &Discount) -> Result<bool>;
    async fn delete_discount(&self, id: Uuid) -> Result<bool>;
}

/// Coupon lookups are pure: validity is judged by the caller.
#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>>;
    async fn find_coupon(&self, id: Uuid) -> Result<Option<Coupon>>;
    /// Whether a live coupon other than `except` already uses `code`.
    async fn code_taken(&self, code: &str, except: Option<Uuid>) -> Result<bool>;
    async fn list_coupons(&self) -> Result<Vec<Coupon>>;
    async fn insert_coupon(&self, coupon: &Coupon) -> Result<()>;
    async fn update_coupon(&self, coupon: &Coupon) -> Result<bool>;
    async fn delete_coupon(&self, id: Uuid) -> Result<bool>;
    async fn coupon_stats(&self, id: Uuid) -> Result<CouponStats>;
}

/// Per (coupon, user) usage counter.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Creates the row or records another use on it, atomically refusing to
    /// go past `use_.usage_limit` with [`crate::CommerceError::UsageLimitExceeded`].
    /// A redeem that finds a held use spends it instead of counting anew.
    async fn record_use(&self, use_: &CouponUse) -> Result<CouponUsage>;
    /// Deletes the row; [`crate::CommerceError::UsageNotFound`] when absent.
    async fn release(&self, coupon_id: Uuid, user_id: Uuid) -> Result<()>;
    async fn find_usage(&self, coupon_id: Uuid, user_id: Uuid) -> Result<Option<CouponUsage>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Writes the order, its items, the stock decrements and the coupon use
    /// as one unit. A product without enough stock fails the whole unit with
    /// [`crate::CommerceError::InsufficientStock`].
    async fn place_order(&self, order: &NewOrder) -> Result<Order>;
    async fn find_order(&self, id: Uuid) -> Result<Option<Order>>;
    async fn update_delivery_status(&self, id: Uuid, status: DeliveryStatus) -> Result<bool>;
    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>>;
    /// One page of matching orders, newest first, and the total match count.
    async fn filter_orders(&self, query: &OrderQuery) -> Result<(Vec<Order>, u64)>;
}

#[async_trait]
pub trait DeliveryCostStore: Send + Sync {
    async fn find_delivery_cost(&self, id: Uuid) -> Result<Option<DeliveryCost>>;
    async fn list_delivery_costs(&self) -> Result<Vec<DeliveryCost>>;
    async fn search_delivery_costs(&self, location: &str) -> Result<Vec<DeliveryCost>>;
    async fn insert_delivery_cost(&self, cost: &DeliveryCost) -> Result<()>;
    async fn update_delivery_cost(&self, cost: &DeliveryCost) -> Result<bool>;
    async fn delete_delivery_cost(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    /// The subset of `ids` that are live lines owned by `user_id`.
    async fn cart_lines(&self, ids: &[Uuid], user_id: Uuid) -> Result<Vec<CartItem>>;
    async fn cart_for_user(&self, user_id: Uuid) -> Result<Vec<CartItem>>;
    /// Adds to the user's line for the product, creating it when missing.
    async fn add_to_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: Quantity,
    ) -> Result<CartItem>;
    async fn remove_cart_line(&self, user_id: Uuid, id: Uuid) -> Result<bool>;
    async fn clear_cart(&self, user_id: Uuid) -> Result<()>;
}

/// Local record of the users the auth gateway has vouched for.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Records the id if it is new. Idempotent.
    async fn register_user(&self, id: Uuid) -> Result<()>;
    async fn user_exists(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn address_for_user(&self, user_id: Uuid) -> Result<Option<Address>>;
    /// The address `id` when `user_id` owns it.
    async fn find_address(&self, id: Uuid, user_id: Uuid) -> Result<Option<Address>>;
    /// Fails with [`crate::CommerceError::AddressAlreadyExists`] when the
    /// user already has a live address.
    async fn insert_address(&self, address: &Address) -> Result<()>;
    async fn update_address(&self, address: &Address) -> Result<bool>;
}

#[async_trait]
pub trait AffiliateStore: Send + Sync {
    async fn insert_affiliate(&self, submission: &AffiliateSubmission) -> Result<()>;
    async fn find_affiliate(&self, id: Uuid) -> Result<Option<AffiliateSubmission>>;
    /// One page, newest first, and the total match count.
    async fn list_affiliates(
        &self,
        status: Option<AffiliateStatus>,
        page: PageQuery,
    ) -> Result<(Vec<AffiliateSubmission>, u64)>;
    async fn update_affiliate(&self, submission: &AffiliateSubmission) -> Result<bool>;
    async fn delete_affiliate(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert_contact(&self, submission: &ContactSubmission) -> Result<()>;
    async fn find_contact(&self, id: Uuid) -> Result<Option<ContactSubmission>>;
    /// One page, newest first, and the total count.
    async fn list_contacts(&self, page: PageQuery) -> Result<(Vec<ContactSubmission>, u64)>;
    async fn delete_contact(&self, id: Uuid) -> Result<bool>;
}
