//! Application services.
//!
//! Each service owns the store handles it needs as trait objects, so the
//! same code runs over [`crate::store::PgStore`] and
//! [`crate::store::MemoryStore`].

use std::sync::Arc;

use crate::events::EventPublisher;
use crate::store::{
    AddressStore, AffiliateStore, CartStore, CatalogStore, ContactStore, CouponStore,
    DeliveryCostStore, DiscountStore, OrderStore, UsageLedger, UserDirectory,
};

pub mod address;
pub mod affiliate;
pub mod cart;
pub mod catalog;
pub mod contact;
pub mod coupon;
pub mod coupon_usage;
pub mod delivery_cost;
pub mod discount;
pub mod order;
pub mod user;

pub use address::AddressService;
pub use affiliate::AffiliateService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use contact::ContactService;
pub use coupon::CouponService;
pub use coupon_usage::{ApplyCouponRequest, CouponApplication, CouponUsageService};
pub use delivery_cost::DeliveryCostService;
pub use discount::DiscountService;
pub use order::OrderService;
pub use user::UserService;

/// Every store trait at once; implemented by any type that provides them all.
pub trait Store:
    CatalogStore
    + DiscountStore
    + CouponStore
    + UsageLedger
    + OrderStore
    + DeliveryCostStore
    + CartStore
    + UserDirectory
    + AddressStore
    + AffiliateStore
    + ContactStore
{
}

impl<T> Store for T where
    T: CatalogStore
        + DiscountStore
        + CouponStore
        + UsageLedger
        + OrderStore
        + DeliveryCostStore
        + CartStore
        + UserDirectory
        + AddressStore
        + AffiliateStore
        + ContactStore
{
}

#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub catalog: CatalogService,
    pub discounts: DiscountService,
    pub coupons: CouponService,
    pub coupon_usages: CouponUsageService,
    pub delivery_costs: DeliveryCostService,
    pub carts: CartService,
    pub orders: OrderService,
    pub addresses: AddressService,
    pub affiliates: AffiliateService,
    pub contacts: ContactService,
}

impl Services {
    pub fn new<S: Store + 'static>(store: Arc<S>, events: EventPublisher) -> Self {
        let catalog: Arc<dyn CatalogStore> = store.clone();
        let coupons: Arc<dyn CouponStore> = store.clone();
        let delivery_costs: Arc<dyn DeliveryCostStore> = store.clone();
        let carts: Arc<dyn CartStore> = store.clone();
        let ledger: Arc<dyn UsageLedger> = store.clone();
        let users: Arc<dyn UserDirectory> = store.clone();
        Self {
            users: UserService::new(users.clone()),
            catalog: CatalogService::new(catalog.clone()),
            discounts: DiscountService::new(store.clone(), catalog.clone()),
            coupons: CouponService::new(coupons.clone()),
            coupon_usages: CouponUsageService::new(
                coupons.clone(),
                ledger,
                carts.clone(),
                catalog.clone(),
                events.clone(),
            ),
            delivery_costs: DeliveryCostService::new(delivery_costs.clone()),
            carts: CartService::new(carts, catalog.clone()),
            orders: OrderService::new(
                catalog,
                coupons,
                delivery_costs,
                users.clone(),
                store.clone(),
                events,
            ),
            addresses: AddressService::new(store.clone(), users),
            affiliates: AffiliateService::new(store.clone()),
            contacts: ContactService::new(store),
        }
    }
}
