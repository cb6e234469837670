//! In-process store.
//!
//! All tables sit behind one mutex, so every trait call is a single atomic
//! unit, the same guarantee a Postgres transaction gives [`super::PgStore`].
//! Deleted rows are dropped rather than flagged.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    AddressStore, AffiliateStore, CartStore, CatalogStore, ContactStore, CouponStore,
    DeliveryCostStore, DiscountStore, OrderStore, UsageLedger, UserDirectory,
};
use crate::domain::aggregates::{
    page_of, Address, AffiliateStatus, AffiliateSubmission, CartItem, Category, ContactSubmission,
    Coupon, CouponStats, CouponUsage, CouponUse, DeliveryCost, DeliveryStatus, Discount, NewOrder,
    Order, OrderQuery, PageQuery, Product, ProductFilter, ProductPricing,
};
use crate::domain::value_objects::{Money, Percentage, Quantity};
use crate::{CommerceError, Result};

#[derive(Default)]
struct Tables {
    users: HashSet<Uuid>,
    categories: HashMap<Uuid, Category>,
    products: HashMap<Uuid, Product>,
    discounts: HashMap<Uuid, Discount>,
    coupons: HashMap<Uuid, Coupon>,
    usages: HashMap<(Uuid, Uuid), CouponUsage>,
    delivery_costs: HashMap<Uuid, DeliveryCost>,
    carts: HashMap<Uuid, CartItem>,
    orders: HashMap<Uuid, Order>,
    addresses: HashMap<Uuid, Address>,
    affiliates: HashMap<Uuid, AffiliateSubmission>,
    contacts: HashMap<Uuid, ContactSubmission>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(mut rows: Vec<T>, created: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|r| std::cmp::Reverse(created(r)));
    rows
}

/// Overwrites the row keyed by `id`; false when there is none.
fn replace<T: Clone>(rows: &mut HashMap<Uuid, T>, id: Uuid, value: &T) -> bool {
    match rows.get_mut(&id) {
        Some(row) => {
            *row = value.clone();
            true
        }
        None => false,
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn product_pricing(&self, id: Uuid) -> Result<Option<ProductPricing>> {
        let t = self.tables.lock().await;
        let discount = t
            .discounts
            .values()
            .find(|d| d.product_id == id)
            .map_or(Percentage::NONE, |d| d.percentage);
        Ok(t.products.get(&id).map(|p| ProductPricing {
            product_id: p.id,
            name: p.product_name.clone(),
            price: p.price,
            stock: p.stock,
            discount,
        }))
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let t = self.tables.lock().await;
        let rows: Vec<Product> = t
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        Ok(newest_first(rows, |p: &Product| p.created_at))
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let mut t = self.tables.lock().await;
        Ok(replace(&mut t.products, product.id, product))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.lock().await.products.remove(&id).is_some())
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.tables.lock().await.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<Category> = t.categories.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.categories.insert(category.id, category.clone());
        Ok(())
    }
}

#[async_trait]
impl DiscountStore for MemoryStore {
    async fn discount_for_product(&self, product_id: Uuid) -> Result<Option<Discount>> {
        let t = self.tables.lock().await;
        Ok(t.discounts
            .values()
            .find(|d| d.product_id == product_id)
            .cloned())
    }

    async fn find_discount(&self, id: Uuid) -> Result<Option<Discount>> {
        Ok(self.tables.lock().await.discounts.get(&id).cloned())
    }

    async fn list_discounts(&self) -> Result<Vec<Discount>> {
        let t = self.tables.lock().await;
        let rows: Vec<Discount> = t.discounts.values().cloned().collect();
        Ok(newest_first(rows, |d: &Discount| d.created_at))
    }

    async fn insert_discount(&self, discount: &Discount) -> Result<()> {
        let mut t = self.tables.lock().await;
        if t.discounts
            .values()
            .any(|d| d.product_id == discount.product_id)
        {
            return Err(CommerceError::DiscountAlreadyExists);
        }
        t.discounts.insert(discount.id, discount.clone());
        Ok(())
    }

    async fn update_discount(&self, discount: &Discount) -> Result<bool> {
        let mut t = self.tables.lock().await;
        Ok(replace(&mut t.discounts, discount.id, discount))
    }

    async fn delete_discount(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.lock().await.discounts.remove(&id).is_some())
    }
}

#[async_trait]
impl CouponStore for MemoryStore {
    async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>> {
        let t = self.tables.lock().await;
        Ok(t.coupons
            .values()
            .find(|c| c.code.as_str() == code)
            .cloned())
    }

    async fn find_coupon(&self, id: Uuid) -> Result<Option<Coupon>> {
        Ok(self.tables.lock().await.coupons.get(&id).cloned())
    }

    async fn code_taken(&self, code: &str, except: Option<Uuid>) -> Result<bool> {
        let t = self.tables.lock().await;
        Ok(t.coupons
            .values()
            .any(|c| c.code.as_str() == code && Some(c.id) != except))
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        let t = self.tables.lock().await;
        let rows: Vec<Coupon> = t.coupons.values().cloned().collect();
        Ok(newest_first(rows, |c: &Coupon| c.created_at))
    }

    async fn insert_coupon(&self, coupon: &Coupon) -> Result<()> {
        let mut t = self.tables.lock().await;
        if t.coupons.values().any(|c| c.code == coupon.code) {
            return Err(CommerceError::CouponCodeExists);
        }
        t.coupons.insert(coupon.id, coupon.clone());
        Ok(())
    }

    async fn update_coupon(&self, coupon: &Coupon) -> Result<bool> {
        let mut t = self.tables.lock().await;
        if t.coupons
            .values()
            .any(|c| c.code == coupon.code && c.id != coupon.id)
        {
            return Err(CommerceError::CouponCodeExists);
        }
        Ok(replace(&mut t.coupons, coupon.id, coupon))
    }

    async fn delete_coupon(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables.lock().await;
        if t.usages.keys().any(|(coupon_id, _)| *coupon_id == id) {
            return Err(CommerceError::CouponHasUsage);
        }
        Ok(t.coupons.remove(&id).is_some())
    }

    async fn coupon_stats(&self, id: Uuid) -> Result<CouponStats> {
        let t = self.tables.lock().await;
        let rows: Vec<&CouponUsage> = t.usages.values().filter(|u| u.coupon_id == id).collect();
        Ok(CouponStats {
            total_usage_count: rows.iter().map(|u| i64::from(u.usage_count)).sum(),
            unique_users_count: rows.len() as i64,
            total_savings_amount: rows.iter().map(|u| u.discounted_amount).sum::<Money>(),
        })
    }
}

fn record(
    usages: &mut HashMap<(Uuid, Uuid), CouponUsage>,
    use_: &CouponUse,
) -> Result<CouponUsage> {
    match usages.get_mut(&(use_.coupon_id, use_.user_id)) {
        Some(row) => {
            if !row.record(use_) {
                return Err(CommerceError::UsageLimitExceeded);
            }
            Ok(row.clone())
        }
        None => {
            if use_.usage_limit < 1 {
                return Err(CommerceError::UsageLimitExceeded);
            }
            let row = CouponUsage::first(use_);
            usages.insert((use_.coupon_id, use_.user_id), row.clone());
            Ok(row)
        }
    }
}

#[async_trait]
impl UsageLedger for MemoryStore {
    async fn record_use(&self, use_: &CouponUse) -> Result<CouponUsage> {
        record(&mut self.tables.lock().await.usages, use_)
    }

    async fn release(&self, coupon_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.usages
            .remove(&(coupon_id, user_id))
            .map(|_| ())
            .ok_or(CommerceError::UsageNotFound)
    }

    async fn find_usage(&self, coupon_id: Uuid, user_id: Uuid) -> Result<Option<CouponUsage>> {
        let t = self.tables.lock().await;
        Ok(t.usages.get(&(coupon_id, user_id)).cloned())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place_order(&self, new_order: &NewOrder) -> Result<Order> {
        let mut t = self.tables.lock().await;
        let order = &new_order.order;

        // Check every decrement before touching anything so a failure leaves no trace.
        let mut wanted: HashMap<Uuid, u32> = HashMap::new();
        for item in &order.items {
            let product = t
                .products
                .get(&item.product_id)
                .ok_or(CommerceError::ProductNotFound(item.product_id))?;
            let total = wanted.entry(item.product_id).or_default();
            *total = total
                .checked_add(item.quantity.value())
                .filter(|qty| *qty <= product.stock)
                .ok_or_else(|| CommerceError::InsufficientStock {
                    product: product.product_name.clone(),
                })?;
        }
        if let Some(use_) = &new_order.coupon_use {
            record(&mut t.usages, use_)?;
        }
        for (product_id, qty) in wanted {
            if let Some(p) = t.products.get_mut(&product_id) {
                p.stock -= qty;
                p.updated_at = Utc::now();
            }
        }
        t.orders.insert(order.id, order.clone());
        Ok(order.clone())
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn update_delivery_status(&self, id: Uuid, status: DeliveryStatus) -> Result<bool> {
        let mut t = self.tables.lock().await;
        match t.orders.get_mut(&id) {
            Some(order) => {
                order.delivery_status = status;
                order.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        let t = self.tables.lock().await;
        let rows: Vec<Order> = t
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |o: &Order| o.created_at))
    }

    async fn filter_orders(&self, query: &OrderQuery) -> Result<(Vec<Order>, u64)> {
        let t = self.tables.lock().await;
        let rows: Vec<Order> = t
            .orders
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        let rows = newest_first(rows, |o: &Order| o.created_at);
        let total = rows.len() as u64;
        let page = rows
            .into_iter()
            .skip(query.offset())
            .take(query.size as usize)
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl DeliveryCostStore for MemoryStore {
    async fn find_delivery_cost(&self, id: Uuid) -> Result<Option<DeliveryCost>> {
        Ok(self.tables.lock().await.delivery_costs.get(&id).cloned())
    }

    async fn list_delivery_costs(&self) -> Result<Vec<DeliveryCost>> {
        let t = self.tables.lock().await;
        let rows: Vec<DeliveryCost> = t.delivery_costs.values().cloned().collect();
        Ok(newest_first(rows, |c: &DeliveryCost| c.created_at))
    }

    async fn search_delivery_costs(&self, location: &str) -> Result<Vec<DeliveryCost>> {
        let t = self.tables.lock().await;
        let rows: Vec<DeliveryCost> = t
            .delivery_costs
            .values()
            .filter(|c| c.location_matches(location))
            .cloned()
            .collect();
        Ok(newest_first(rows, |c: &DeliveryCost| c.created_at))
    }

    async fn insert_delivery_cost(&self, cost: &DeliveryCost) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.delivery_costs.insert(cost.id, cost.clone());
        Ok(())
    }

    async fn update_delivery_cost(&self, cost: &DeliveryCost) -> Result<bool> {
        let mut t = self.tables.lock().await;
        Ok(replace(&mut t.delivery_costs, cost.id, cost))
    }

    async fn delete_delivery_cost(&self, id: Uuid) -> Result<bool> {
        let mut t = self.tables.lock().await;
        Ok(t.delivery_costs.remove(&id).is_some())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart_lines(&self, ids: &[Uuid], user_id: Uuid) -> Result<Vec<CartItem>> {
        let t = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| t.carts.get(id))
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn cart_for_user(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
        let t = self.tables.lock().await;
        let rows: Vec<CartItem> = t
            .carts
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |c: &CartItem| c.created_at))
    }

    async fn add_to_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: Quantity,
    ) -> Result<CartItem> {
        let mut t = self.tables.lock().await;
        if let Some(line) = t
            .carts
            .values_mut()
            .find(|c| c.user_id == user_id && c.product_id == product_id)
        {
            line.merge(quantity);
            return Ok(line.clone());
        }
        let line = CartItem::new(user_id, product_id, quantity);
        t.carts.insert(line.id, line.clone());
        Ok(line)
    }

    async fn remove_cart_line(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let mut t = self.tables.lock().await;
        let owned = t.carts.get(&id).is_some_and(|line| line.user_id == user_id);
        if owned {
            t.carts.remove(&id);
        }
        Ok(owned)
    }

    async fn clear_cart(&self, user_id: Uuid) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.carts.retain(|_, c| c.user_id != user_id);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn register_user(&self, id: Uuid) -> Result<()> {
        self.tables.lock().await.users.insert(id);
        Ok(())
    }

    async fn user_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.lock().await.users.contains(&id))
    }
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn address_for_user(&self, user_id: Uuid) -> Result<Option<Address>> {
        let t = self.tables.lock().await;
        Ok(t.addresses
            .values()
            .find(|a| a.user_id == user_id)
            .cloned())
    }

    async fn find_address(&self, id: Uuid, user_id: Uuid) -> Result<Option<Address>> {
        let t = self.tables.lock().await;
        Ok(t.addresses
            .get(&id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn insert_address(&self, address: &Address) -> Result<()> {
        let mut t = self.tables.lock().await;
        if t.addresses.values().any(|a| a.user_id == address.user_id) {
            return Err(CommerceError::AddressAlreadyExists);
        }
        t.addresses.insert(address.id, address.clone());
        Ok(())
    }

    async fn update_address(&self, address: &Address) -> Result<bool> {
        let mut t = self.tables.lock().await;
        Ok(replace(&mut t.addresses, address.id, address))
    }
}

#[async_trait]
impl AffiliateStore for MemoryStore {
    async fn insert_affiliate(&self, submission: &AffiliateSubmission) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.affiliates.insert(submission.id, submission.clone());
        Ok(())
    }

    async fn find_affiliate(&self, id: Uuid) -> Result<Option<AffiliateSubmission>> {
        Ok(self.tables.lock().await.affiliates.get(&id).cloned())
    }

    async fn list_affiliates(
        &self,
        status: Option<AffiliateStatus>,
        page: PageQuery,
    ) -> Result<(Vec<AffiliateSubmission>, u64)> {
        let t = self.tables.lock().await;
        let rows: Vec<AffiliateSubmission> = t
            .affiliates
            .values()
            .filter(|s| status.map_or(true, |status| s.status == status))
            .cloned()
            .collect();
        let rows = newest_first(rows, |s: &AffiliateSubmission| s.created_at);
        Ok(page_of(rows, page))
    }

    async fn update_affiliate(&self, submission: &AffiliateSubmission) -> Result<bool> {
        let mut t = self.tables.lock().await;
        Ok(replace(&mut t.affiliates, submission.id, submission))
    }

    async fn delete_affiliate(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.lock().await.affiliates.remove(&id).is_some())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn insert_contact(&self, submission: &ContactSubmission) -> Result<()> {
        let mut t = self.tables.lock().await;
        t.contacts.insert(submission.id, submission.clone());
        Ok(())
    }

    async fn find_contact(&self, id: Uuid) -> Result<Option<ContactSubmission>> {
        Ok(self.tables.lock().await.contacts.get(&id).cloned())
    }

    async fn list_contacts(&self, page: PageQuery) -> Result<(Vec<ContactSubmission>, u64)> {
        let t = self.tables.lock().await;
        let rows: Vec<ContactSubmission> = t.contacts.values().cloned().collect();
        let rows = newest_first(rows, |s: &ContactSubmission| s.created_at);
        Ok(page_of(rows, page))
    }

    async fn delete_contact(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.lock().await.contacts.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{
        ContactRequest, OrderItem, PaymentStatus, ProductRequest, UseKind,
    };

    fn use_of(kind: UseKind, usage_limit: i32) -> CouponUse {
        CouponUse {
            coupon_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            usage_limit,
            discounted_amount: Money::from_major(10),
            kind,
        }
    }

    fn order_of(user_id: Uuid, lines: &[(Uuid, Quantity)]) -> NewOrder {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let items = lines
            .iter()
            .map(|(product_id, quantity)| OrderItem {
                id: Uuid::now_v7(),
                order_id: id,
                product_id: *product_id,
                quantity: *quantity,
                price: Money::from_major(1),
                created_at: now,
            })
            .collect();
        let order = Order {
            id,
            user_id,
            address: "House 7".into(),
            area: "Dhaka".into(),
            total_amount: Money::from_major(1),
            payment_method: "CASH_ON_DELIVERY".into(),
            payment_status: PaymentStatus::Pending,
            delivery_status: DeliveryStatus::Pending,
            coupon_id: None,
            discount_amount: Money::ZERO,
            delivery_cost: Money::ZERO,
            notes: None,
            items,
            created_at: now,
            updated_at: now,
        };
        NewOrder {
            order,
            coupon_use: None,
        }
    }

    async fn stocked(store: &MemoryStore, stock: i64) -> Product {
        let product = Product::create(&ProductRequest {
            product_name: "Oud Noir".into(),
            product_code: None,
            description: None,
            price: Money::from_major(10),
            stock: Some(stock),
            category_id: Uuid::now_v7(),
        })
        .unwrap();
        store.insert_product(&product).await.unwrap();
        product
    }

    #[tokio::test]
    async fn test_release_missing_usage() {
        let store = MemoryStore::new();
        let err = store
            .release(Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::UsageNotFound));
    }

    #[tokio::test]
    async fn test_record_use_stops_at_limit() {
        let store = MemoryStore::new();
        let use_ = use_of(UseKind::Hold, 2);
        assert_eq!(store.record_use(&use_).await.unwrap().usage_count, 1);
        assert_eq!(store.record_use(&use_).await.unwrap().usage_count, 2);
        let err = store.record_use(&use_).await.unwrap_err();
        assert!(matches!(err, CommerceError::UsageLimitExceeded));
        let row = store
            .find_usage(use_.coupon_id, use_.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.usage_count, 2);
    }

    #[tokio::test]
    async fn test_order_spends_held_use() {
        let store = MemoryStore::new();
        let hold = use_of(UseKind::Hold, 1);
        store.record_use(&hold).await.unwrap();

        let product = stocked(&store, 5).await;
        let line = (product.id, Quantity::new(1).unwrap());
        let mut new_order = order_of(hold.user_id, &[line]);
        new_order.coupon_use = Some(CouponUse {
            kind: UseKind::Redeem,
            ..hold.clone()
        });
        store.place_order(&new_order).await.unwrap();

        let row = store
            .find_usage(hold.coupon_id, hold.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((row.usage_count, row.held_count), (1, 0));
    }

    #[tokio::test]
    async fn test_order_quantity_overflow_is_insufficient_stock() {
        let store = MemoryStore::new();
        let product = stocked(&store, 10).await;
        let max = Quantity::new(i64::from(i32::MAX)).unwrap();
        let lines = [(product.id, max), (product.id, max), (product.id, max)];
        let err = store
            .place_order(&order_of(Uuid::now_v7(), &lines))
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::InsufficientStock { .. }));
        let untouched = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(untouched.stock, 10);
    }

    #[tokio::test]
    async fn test_cart_merges_lines() {
        let store = MemoryStore::new();
        let (user, product) = (Uuid::now_v7(), Uuid::now_v7());
        let first = store
            .add_to_cart(user, product, Quantity::new(1).unwrap())
            .await
            .unwrap();
        let second = store
            .add_to_cart(user, product, Quantity::new(2).unwrap())
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity.value(), 3);
        let foreign = store.cart_lines(&[first.id], Uuid::now_v7()).await.unwrap();
        assert!(foreign.is_empty());
    }

    #[tokio::test]
    async fn test_contacts_page_newest_first() {
        let store = MemoryStore::new();
        for (age, name) in [(3, "first"), (2, "second"), (1, "third")] {
            let mut contact = ContactSubmission::submit(&ContactRequest {
                name: Some(name.into()),
                email: Some("a@example.com".into()),
                message: Some("hello".into()),
                ..Default::default()
            })
            .unwrap();
            contact.created_at = Utc::now() - chrono::Duration::minutes(age);
            store.insert_contact(&contact).await.unwrap();
        }
        let page = PageQuery { page: 1, limit: 2 };
        let (rows, total) = store.list_contacts(page).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "third");
    }
}
