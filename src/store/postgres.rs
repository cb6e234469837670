//! Postgres store.
//!
//! Rows are read into `*Row` structs and converted into aggregates, so a
//! corrupt row surfaces as a storage error instead of a panic. Deletes are
//! soft: every read filters on `deleted_at IS NULL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::{
    AddressStore, AffiliateStore, CartStore, CatalogStore, ContactStore, CouponStore,
    DeliveryCostStore, DiscountStore, OrderStore, UsageLedger, UserDirectory,
};
use crate::domain::aggregates::{
    Address, AffiliateStatus, AffiliateSubmission, CartItem, Category, ContactSubmission, Coupon,
    CouponStats, CouponUsage, CouponUse, DeliveryCost, DeliveryStatus, Discount, NewOrder, Order,
    OrderItem, OrderQuery, PageQuery, Product, ProductFilter, ProductPricing, UseKind,
};
use crate::domain::value_objects::{CouponCode, Percentage, Quantity};
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|d| d.is_unique_violation())
}

fn stock(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| CommerceError::Storage(format!("negative stock {value}")))
}

/// Value for an `INTEGER` column.
fn int_column(value: u32, column: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| CommerceError::Validation(format!("{column} is out of range")))
}

/// `LIMIT` and `OFFSET` binds for a one-based page.
fn limit_offset(page: PageQuery) -> (i64, i64) {
    (i64::from(page.limit), page.offset() as i64)
}

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    product_name: String,
    product_code: Option<String>,
    description: Option<String>,
    price: Decimal,
    stock: i32,
    category_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = CommerceError;
    fn try_from(r: ProductRow) -> Result<Self> {
        Ok(Product {
            id: r.id,
            product_name: r.product_name,
            product_code: r.product_code,
            description: r.description,
            price: r.price.into(),
            stock: stock(r.stock)?,
            category_id: r.category_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PricingRow {
    id: Uuid,
    product_name: String,
    price: Decimal,
    stock: i32,
    discount: i32,
}

impl TryFrom<PricingRow> for ProductPricing {
    type Error = CommerceError;
    fn try_from(r: PricingRow) -> Result<Self> {
        Ok(ProductPricing {
            product_id: r.id,
            name: r.product_name,
            price: r.price.into(),
            stock: stock(r.stock)?,
            discount: Percentage::new(r.discount)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Category {
            id: r.id,
            name: r.name,
            description: r.description,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DiscountRow {
    id: Uuid,
    product_id: Uuid,
    percentage: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DiscountRow> for Discount {
    type Error = CommerceError;
    fn try_from(r: DiscountRow) -> Result<Self> {
        Ok(Discount {
            id: r.id,
            product_id: r.product_id,
            percentage: Percentage::new(r.percentage)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: Uuid,
    code: String,
    coupon_type: String,
    amount: Decimal,
    min_order_amount: Decimal,
    max_amount_applied: Decimal,
    expiration_time: DateTime<Utc>,
    usage_limit: i32,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = CommerceError;
    fn try_from(r: CouponRow) -> Result<Self> {
        Ok(Coupon {
            id: r.id,
            code: CouponCode::new(r.code)?,
            coupon_type: r.coupon_type.parse()?,
            amount: r.amount.into(),
            min_order_amount: r.min_order_amount.into(),
            max_amount_applied: r.max_amount_applied.into(),
            expiration_time: r.expiration_time,
            usage_limit: r.usage_limit,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UsageRow {
    id: Uuid,
    coupon_id: Uuid,
    user_id: Uuid,
    usage_count: i32,
    held_count: i32,
    discounted_amount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UsageRow> for CouponUsage {
    fn from(r: UsageRow) -> Self {
        CouponUsage {
            id: r.id,
            coupon_id: r.coupon_id,
            user_id: r.user_id,
            usage_count: r.usage_count,
            held_count: r.held_count,
            discounted_amount: r.discounted_amount.into(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DeliveryCostRow {
    id: Uuid,
    location: String,
    service: Option<String>,
    cost: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DeliveryCostRow> for DeliveryCost {
    fn from(r: DeliveryCostRow) -> Self {
        DeliveryCost {
            id: r.id,
            location: r.location,
            service: r.service,
            cost: r.cost.into(),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for CartItem {
    type Error = CommerceError;
    fn try_from(r: CartRow) -> Result<Self> {
        Ok(CartItem {
            id: r.id,
            user_id: r.user_id,
            product_id: r.product_id,
            quantity: Quantity::new(i64::from(r.quantity))?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    address: String,
    area: String,
    total_amount: Decimal,
    payment_method: String,
    payment_status: String,
    delivery_status: String,
    coupon_id: Option<Uuid>,
    discount_amount: Decimal,
    delivery_cost: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order> {
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            address: self.address,
            area: self.area,
            total_amount: self.total_amount.into(),
            payment_method: self.payment_method,
            payment_status: self.payment_status.parse()?,
            delivery_status: self.delivery_status.parse()?,
            coupon_id: self.coupon_id,
            discount_amount: self.discount_amount.into(),
            delivery_cost: self.delivery_cost.into(),
            notes: self.notes,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = CommerceError;
    fn try_from(r: OrderItemRow) -> Result<Self> {
        Ok(OrderItem {
            id: r.id,
            order_id: r.order_id,
            product_id: r.product_id,
            quantity: Quantity::new(i64::from(r.quantity))?,
            price: r.price.into(),
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    user_id: Uuid,
    full_name: String,
    phone_number: String,
    address: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(r: AddressRow) -> Self {
        Address {
            id: r.id,
            user_id: r.user_id,
            full_name: r.full_name,
            phone_number: r.phone_number,
            address: r.address,
            is_default: r.is_default,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AffiliateRow {
    id: Uuid,
    name: String,
    about: String,
    phone: Option<String>,
    instagram: Option<String>,
    facebook: Option<String>,
    youtube: Option<String>,
    linkedin: Option<String>,
    other_social: Option<String>,
    status: String,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AffiliateRow> for AffiliateSubmission {
    type Error = CommerceError;
    fn try_from(r: AffiliateRow) -> Result<Self> {
        Ok(AffiliateSubmission {
            id: r.id,
            name: r.name,
            about: r.about,
            phone: r.phone,
            instagram: r.instagram,
            facebook: r.facebook,
            youtube: r.youtube,
            linkedin: r.linkedin,
            other_social: r.other_social,
            status: r.status.parse()?,
            admin_notes: r.admin_notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    subject: Option<String>,
    message: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContactRow> for ContactSubmission {
    fn from(r: ContactRow) -> Self {
        ContactSubmission {
            id: r.id,
            name: r.name,
            email: r.email,
            phone: r.phone,
            subject: r.subject,
            message: r.message,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
impl CatalogStore for PgStore {
    async fn product_pricing(&self, id: Uuid) -> Result<Option<ProductPricing>> {
        sqlx::query_as::<_, PricingRow>(
            "SELECT p.id, p.product_name, p.price, p.stock, \
             COALESCE(d.percentage, 0) AS discount \
             FROM products p \
             LEFT JOIN discounts d ON d.product_id = p.id AND d.deleted_at IS NULL \
             WHERE p.id = $1 AND p.deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(ProductPricing::try_from)
        .transpose()
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE deleted_at IS NULL \
             AND ($1::uuid IS NULL OR category_id = $1) \
             AND ($2::text IS NULL OR product_name ILIKE '%' || $2 || '%') \
             ORDER BY created_at DESC",
        )
        .bind(filter.category)
        .bind(search)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Product::try_from)
        .collect()
    }

    async fn insert_product(&self, p: &Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, product_name, product_code, description, price, stock, \
             category_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(p.id)
        .bind(&p.product_name)
        .bind(&p.product_code)
        .bind(&p.description)
        .bind(p.price.amount())
        .bind(int_column(p.stock, "stock")?)
        .bind(p.category_id)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_product(&self, p: &Product) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE products SET product_name = $2, product_code = $3, description = $4, \
             price = $5, stock = $6, category_id = $7, updated_at = $8 \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(p.id)
        .bind(&p.product_name)
        .bind(&p.product_code)
        .bind(&p.description)
        .bind(p.price.amount())
        .bind(int_column(p.stock, "stock")?)
        .bind(p.category_id)
        .bind(p.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE products SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT * FROM categories WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT * FROM categories WHERE deleted_at IS NULL ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn insert_category(&self, c: &Category) -> Result<()> {
        sqlx::query(
            "INSERT INTO categories (id, name, description, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(c.id)
        .bind(&c.name)
        .bind(&c.description)
        .bind(c.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Discounts
// =============================================================================

#[async_trait]
impl DiscountStore for PgStore {
    async fn discount_for_product(&self, product_id: Uuid) -> Result<Option<Discount>> {
        sqlx::query_as::<_, DiscountRow>(
            "SELECT * FROM discounts WHERE product_id = $1 AND deleted_at IS NULL",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Discount::try_from)
        .transpose()
    }

    async fn find_discount(&self, id: Uuid) -> Result<Option<Discount>> {
        sqlx::query_as::<_, DiscountRow>(
            "SELECT * FROM discounts WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Discount::try_from)
        .transpose()
    }

    async fn list_discounts(&self) -> Result<Vec<Discount>> {
        sqlx::query_as::<_, DiscountRow>(
            "SELECT * FROM discounts WHERE deleted_at IS NULL ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Discount::try_from)
        .collect()
    }

    async fn insert_discount(&self, d: &Discount) -> Result<()> {
        sqlx::query(
            "INSERT INTO discounts (id, product_id, percentage, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(d.id)
        .bind(d.product_id)
        .bind(i32::from(d.percentage))
        .bind(d.created_at)
        .bind(d.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CommerceError::DiscountAlreadyExists
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    async fn update_discount(&self, d: &Discount) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE discounts SET percentage = $2, updated_at = $3 \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(d.id)
        .bind(i32::from(d.percentage))
        .bind(d.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_discount(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE discounts SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }
}

// =============================================================================
// Coupons
// =============================================================================

fn coupon_write_error(e: sqlx::Error) -> CommerceError {
    if is_unique_violation(&e) {
        CommerceError::CouponCodeExists
    } else {
        e.into()
    }
}

#[async_trait]
impl CouponStore for PgStore {
    async fn coupon_by_code(&self, code: &str) -> Result<Option<Coupon>> {
        sqlx::query_as::<_, CouponRow>(
            "SELECT * FROM coupons WHERE code = $1 AND deleted_at IS NULL",
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?
        .map(Coupon::try_from)
        .transpose()
    }

    async fn find_coupon(&self, id: Uuid) -> Result<Option<Coupon>> {
        sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Coupon::try_from)
            .transpose()
    }

    async fn code_taken(&self, code: &str, except: Option<Uuid>) -> Result<bool> {
        let (taken,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM coupons WHERE code = $1 AND deleted_at IS NULL \
             AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(code.trim())
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        sqlx::query_as::<_, CouponRow>(
            "SELECT * FROM coupons WHERE deleted_at IS NULL ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Coupon::try_from)
        .collect()
    }

    async fn insert_coupon(&self, c: &Coupon) -> Result<()> {
        sqlx::query(
            "INSERT INTO coupons (id, code, coupon_type, amount, min_order_amount, \
             max_amount_applied, expiration_time, usage_limit, active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(c.id)
        .bind(c.code.as_str())
        .bind(c.coupon_type.to_string())
        .bind(c.amount.amount())
        .bind(c.min_order_amount.amount())
        .bind(c.max_amount_applied.amount())
        .bind(c.expiration_time)
        .bind(c.usage_limit)
        .bind(c.active)
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await
        .map_err(coupon_write_error)?;
        Ok(())
    }

    async fn update_coupon(&self, c: &Coupon) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE coupons SET code = $2, coupon_type = $3, amount = $4, min_order_amount = $5, \
             max_amount_applied = $6, expiration_time = $7, usage_limit = $8, active = $9, \
             updated_at = $10 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(c.id)
        .bind(c.code.as_str())
        .bind(c.coupon_type.to_string())
        .bind(c.amount.amount())
        .bind(c.min_order_amount.amount())
        .bind(c.max_amount_applied.amount())
        .bind(c.expiration_time)
        .bind(c.usage_limit)
        .bind(c.active)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await
        .map_err(coupon_write_error)?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_coupon(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let (used,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM coupon_usages WHERE coupon_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if used {
            return Err(CommerceError::CouponHasUsage);
        }
        let done = sqlx::query(
            "UPDATE coupons SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(done.rows_affected() > 0)
    }

    async fn coupon_stats(&self, id: Uuid) -> Result<CouponStats> {
        let (total, users, savings): (i64, i64, Decimal) = sqlx::query_as(
            "SELECT COALESCE(SUM(usage_count), 0)::BIGINT, COUNT(*)::BIGINT, \
             COALESCE(SUM(discounted_amount), 0) \
             FROM coupon_usages WHERE coupon_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(CouponStats {
            total_usage_count: total,
            unique_users_count: users,
            total_savings_amount: savings.into(),
        })
    }
}

// =============================================================================
// Usage ledger
// =============================================================================

/// Inserts the (coupon, user) row or records another use on it. A redeem
/// with a held use pending spends it; anything else counts a new use. The
/// conditional `DO UPDATE` returns nothing once the limit is reached, which
/// is the refusal signal.
async fn upsert_usage<'e, E: PgExecutor<'e>>(
    executor: E,
    use_: &CouponUse,
) -> Result<CouponUsage> {
    let redeem = use_.kind == UseKind::Redeem;
    if use_.usage_limit < 1 && !redeem {
        return Err(CommerceError::UsageLimitExceeded);
    }
    let row = sqlx::query_as::<_, UsageRow>(
        "INSERT INTO coupon_usages (id, coupon_id, user_id, usage_count, held_count, \
         discounted_amount, created_at, updated_at) \
         VALUES ($1, $2, $3, 1, CASE WHEN $6::boolean THEN 0 ELSE 1 END, $4, NOW(), NOW()) \
         ON CONFLICT (coupon_id, user_id) DO UPDATE SET \
         usage_count = CASE WHEN $6::boolean AND coupon_usages.held_count > 0 \
             THEN coupon_usages.usage_count ELSE coupon_usages.usage_count + 1 END, \
         held_count = CASE \
             WHEN $6::boolean AND coupon_usages.held_count > 0 THEN coupon_usages.held_count - 1 \
             WHEN $6::boolean THEN coupon_usages.held_count \
             ELSE coupon_usages.held_count + 1 END, \
         discounted_amount = EXCLUDED.discounted_amount, updated_at = NOW() \
         WHERE ($6::boolean AND coupon_usages.held_count > 0) \
         OR coupon_usages.usage_count < $5 \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(use_.coupon_id)
    .bind(use_.user_id)
    .bind(use_.discounted_amount.amount())
    .bind(use_.usage_limit)
    .bind(redeem)
    .fetch_optional(executor)
    .await?;
    row.map(CouponUsage::from)
        .ok_or(CommerceError::UsageLimitExceeded)
}

#[async_trait]
impl UsageLedger for PgStore {
    async fn record_use(&self, use_: &CouponUse) -> Result<CouponUsage> {
        upsert_usage(&self.pool, use_).await
    }

    async fn release(&self, coupon_id: Uuid, user_id: Uuid) -> Result<()> {
        let done = sqlx::query(
            "DELETE FROM coupon_usages WHERE coupon_id = $1 AND user_id = $2",
        )
        .bind(coupon_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(CommerceError::UsageNotFound);
        }
        Ok(())
    }

    async fn find_usage(&self, coupon_id: Uuid, user_id: Uuid) -> Result<Option<CouponUsage>> {
        let row = sqlx::query_as::<_, UsageRow>(
            "SELECT * FROM coupon_usages WHERE coupon_id = $1 AND user_id = $2",
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CouponUsage::from))
    }
}

// =============================================================================
// Orders
// =============================================================================

impl PgStore {
    /// Attaches items to a batch of order rows, preserving row order.
    async fn with_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY created_at, id",
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;
        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order
                .entry(item.order_id)
                .or_default()
                .push(OrderItem::try_from(item)?);
        }
        rows.into_iter()
            .map(|r| {
                let items = by_order.remove(&r.id).unwrap_or_default();
                r.into_order(items)
            })
            .collect()
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn place_order(&self, new_order: &NewOrder) -> Result<Order> {
        let order = &new_order.order;
        let mut tx = self.pool.begin().await?;

        // Decrement in product id order so concurrent orders lock rows consistently.
        let mut wanted: BTreeMap<Uuid, i64> = BTreeMap::new();
        for item in &order.items {
            *wanted.entry(item.product_id).or_default() += i64::from(item.quantity.value());
        }
        for (&product_id, &quantity) in &wanted {
            let decremented = match i32::try_from(quantity) {
                Ok(quantity) => {
                    let done = sqlx::query(
                        "UPDATE products SET stock = stock - $1, updated_at = NOW() \
                         WHERE id = $2 AND stock >= $1 AND deleted_at IS NULL",
                    )
                    .bind(quantity)
                    .bind(product_id)
                    .execute(&mut *tx)
                    .await?;
                    done.rows_affected() > 0
                }
                // More than any stock column holds.
                Err(_) => false,
            };
            if !decremented {
                let name: Option<(String,)> = sqlx::query_as(
                    "SELECT product_name FROM products WHERE id = $1 AND deleted_at IS NULL",
                )
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
                return Err(match name {
                    Some((product,)) => CommerceError::InsufficientStock { product },
                    None => CommerceError::ProductNotFound(product_id),
                });
            }
        }

        sqlx::query(
            "INSERT INTO orders (id, user_id, address, area, total_amount, payment_method, \
             payment_status, delivery_status, coupon_id, discount_amount, delivery_cost, notes, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(&order.address)
        .bind(&order.area)
        .bind(order.total_amount.amount())
        .bind(&order.payment_method)
        .bind(order.payment_status.as_str())
        .bind(order.delivery_status.as_str())
        .bind(order.coupon_id)
        .bind(order.discount_amount.amount())
        .bind(order.delivery_cost.amount())
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity, price, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(item.id)
            .bind(item.order_id)
            .bind(item.product_id)
            .bind(int_column(item.quantity.value(), "quantity")?)
            .bind(item.price.amount())
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(use_) = &new_order.coupon_use {
            upsert_usage(&mut *tx, use_).await?;
        }

        tx.commit().await?;
        Ok(order.clone())
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(self.with_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn update_delivery_status(&self, id: Uuid, status: DeliveryStatus) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE orders SET delivery_status = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders WHERE user_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.with_items(rows).await
    }

    async fn filter_orders(&self, q: &OrderQuery) -> Result<(Vec<Order>, u64)> {
        const MATCH: &str = "deleted_at IS NULL \
            AND ($1::text IS NULL OR delivery_status = $1) \
            AND ($2::timestamptz IS NULL OR created_at >= $2) \
            AND ($3::timestamptz IS NULL OR created_at <= $3)";
        let status = q.status.map(|s| s.as_str());
        let count = format!("SELECT COUNT(*) FROM orders WHERE {MATCH}");
        let (total,): (i64,) = sqlx::query_as(&count)
            .bind(status)
            .bind(q.start_date)
            .bind(q.end_date)
            .fetch_one(&self.pool)
            .await?;
        let select = format!(
            "SELECT * FROM orders WHERE {MATCH} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&select)
            .bind(status)
            .bind(q.start_date)
            .bind(q.end_date)
            .bind(i64::from(q.size))
            .bind(q.offset() as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok((self.with_items(rows).await?, total.max(0) as u64))
    }
}

// =============================================================================
// Delivery costs
// =============================================================================

#[async_trait]
impl DeliveryCostStore for PgStore {
    async fn find_delivery_cost(&self, id: Uuid) -> Result<Option<DeliveryCost>> {
        let row = sqlx::query_as::<_, DeliveryCostRow>(
            "SELECT * FROM delivery_costs WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(DeliveryCost::from))
    }

    async fn list_delivery_costs(&self) -> Result<Vec<DeliveryCost>> {
        let rows = sqlx::query_as::<_, DeliveryCostRow>(
            "SELECT * FROM delivery_costs WHERE deleted_at IS NULL ORDER BY location",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(DeliveryCost::from).collect())
    }

    async fn search_delivery_costs(&self, location: &str) -> Result<Vec<DeliveryCost>> {
        let rows = sqlx::query_as::<_, DeliveryCostRow>(
            "SELECT * FROM delivery_costs WHERE deleted_at IS NULL \
             AND location ILIKE '%' || $1 || '%' ORDER BY location",
        )
        .bind(location.trim())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(DeliveryCost::from).collect())
    }

    async fn insert_delivery_cost(&self, c: &DeliveryCost) -> Result<()> {
        sqlx::query(
            "INSERT INTO delivery_costs (id, location, service, cost, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(c.id)
        .bind(&c.location)
        .bind(&c.service)
        .bind(c.cost.amount())
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_delivery_cost(&self, c: &DeliveryCost) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE delivery_costs SET location = $2, service = $3, cost = $4, updated_at = $5 \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(c.id)
        .bind(&c.location)
        .bind(&c.service)
        .bind(c.cost.amount())
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_delivery_cost(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE delivery_costs SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }
}

// =============================================================================
// Carts and users
// =============================================================================

#[async_trait]
impl CartStore for PgStore {
    async fn cart_lines(&self, ids: &[Uuid], user_id: Uuid) -> Result<Vec<CartItem>> {
        sqlx::query_as::<_, CartRow>(
            "SELECT * FROM carts WHERE id = ANY($1) AND user_id = $2 ORDER BY created_at",
        )
        .bind(ids)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(CartItem::try_from)
        .collect()
    }

    async fn cart_for_user(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
        sqlx::query_as::<_, CartRow>(
            "SELECT * FROM carts WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(CartItem::try_from)
        .collect()
    }

    async fn add_to_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: Quantity,
    ) -> Result<CartItem> {
        // The merged quantity is capped at INTEGER's maximum, like `Quantity::add`.
        sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (id, user_id, product_id, quantity, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) \
             ON CONFLICT (user_id, product_id) DO UPDATE \
             SET quantity = \
             LEAST(carts.quantity::BIGINT + EXCLUDED.quantity, 2147483647)::INTEGER, \
             updated_at = NOW() \
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(product_id)
        .bind(int_column(quantity.value(), "quantity")?)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn remove_cart_line(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM carts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn clear_cart(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn register_user(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn user_exists(&self, id: Uuid) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

// =============================================================================
// Addresses
// =============================================================================

#[async_trait]
impl AddressStore for PgStore {
    async fn address_for_user(&self, user_id: Uuid) -> Result<Option<Address>> {
        let row = sqlx::query_as::<_, AddressRow>(
            "SELECT * FROM addresses WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Address::from))
    }

    async fn find_address(&self, id: Uuid, user_id: Uuid) -> Result<Option<Address>> {
        let row = sqlx::query_as::<_, AddressRow>(
            "SELECT * FROM addresses WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Address::from))
    }

    async fn insert_address(&self, a: &Address) -> Result<()> {
        sqlx::query(
            "INSERT INTO addresses (id, user_id, full_name, phone_number, address, is_default, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(a.id)
        .bind(a.user_id)
        .bind(&a.full_name)
        .bind(&a.phone_number)
        .bind(&a.address)
        .bind(a.is_default)
        .bind(a.created_at)
        .bind(a.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CommerceError::AddressAlreadyExists
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    async fn update_address(&self, a: &Address) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE addresses SET full_name = $3, phone_number = $4, address = $5, \
             is_default = $6, updated_at = $7 \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(a.id)
        .bind(a.user_id)
        .bind(&a.full_name)
        .bind(&a.phone_number)
        .bind(&a.address)
        .bind(a.is_default)
        .bind(a.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }
}

// =============================================================================
// Affiliate and contact intake
// =============================================================================

#[async_trait]
impl AffiliateStore for PgStore {
    async fn insert_affiliate(&self, s: &AffiliateSubmission) -> Result<()> {
        sqlx::query(
            "INSERT INTO affiliate_submissions (id, name, about, phone, instagram, facebook, \
             youtube, linkedin, other_social, status, admin_notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(s.id)
        .bind(&s.name)
        .bind(&s.about)
        .bind(&s.phone)
        .bind(&s.instagram)
        .bind(&s.facebook)
        .bind(&s.youtube)
        .bind(&s.linkedin)
        .bind(&s.other_social)
        .bind(s.status.as_str())
        .bind(&s.admin_notes)
        .bind(s.created_at)
        .bind(s.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_affiliate(&self, id: Uuid) -> Result<Option<AffiliateSubmission>> {
        sqlx::query_as::<_, AffiliateRow>(
            "SELECT * FROM affiliate_submissions WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(AffiliateSubmission::try_from)
        .transpose()
    }

    async fn list_affiliates(
        &self,
        status: Option<AffiliateStatus>,
        page: PageQuery,
    ) -> Result<(Vec<AffiliateSubmission>, u64)> {
        const MATCH: &str = "deleted_at IS NULL AND ($1::text IS NULL OR status = $1)";
        let status = status.map(|s| s.as_str());
        let count = format!("SELECT COUNT(*) FROM affiliate_submissions WHERE {MATCH}");
        let (total,): (i64,) = sqlx::query_as(&count)
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        let (limit, offset) = limit_offset(page);
        let select = format!(
            "SELECT * FROM affiliate_submissions WHERE {MATCH} \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, AffiliateRow>(&select)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let rows = rows
            .into_iter()
            .map(AffiliateSubmission::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((rows, total.max(0) as u64))
    }

    async fn update_affiliate(&self, s: &AffiliateSubmission) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE affiliate_submissions SET status = $2, admin_notes = $3, updated_at = $4 \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(s.id)
        .bind(s.status.as_str())
        .bind(&s.admin_notes)
        .bind(s.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_affiliate(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE affiliate_submissions SET deleted_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn insert_contact(&self, s: &ContactSubmission) -> Result<()> {
        sqlx::query(
            "INSERT INTO contact_submissions (id, name, email, phone, subject, message, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(s.id)
        .bind(&s.name)
        .bind(&s.email)
        .bind(&s.phone)
        .bind(&s.subject)
        .bind(&s.message)
        .bind(s.created_at)
        .bind(s.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_contact(&self, id: Uuid) -> Result<Option<ContactSubmission>> {
        let row = sqlx::query_as::<_, ContactRow>(
            "SELECT * FROM contact_submissions WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ContactSubmission::from))
    }

    async fn list_contacts(&self, page: PageQuery) -> Result<(Vec<ContactSubmission>, u64)> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM contact_submissions WHERE deleted_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;
        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, ContactRow>(
            "SELECT * FROM contact_submissions WHERE deleted_at IS NULL \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let rows = rows.into_iter().map(ContactSubmission::from).collect();
        Ok((rows, total.max(0) as u64))
    }

    async fn delete_contact(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query(
            "UPDATE contact_submissions SET deleted_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_column_bounds() {
        assert_eq!(int_column(i32::MAX as u32, "stock").unwrap(), i32::MAX);
        let err = int_column(u32::MAX, "stock").unwrap_err();
        let CommerceError::Validation(message) = err else {
            panic!("expected a validation error, got {err:?}");
        };
        assert_eq!(message, "stock is out of range");
    }

    #[test]
    fn test_limit_offset_is_one_based() {
        assert_eq!(limit_offset(PageQuery { page: 3, limit: 20 }), (20, 40));
        assert_eq!(limit_offset(PageQuery::default()), (10, 0));
    }
}
