//! Coupon application against cart lines and the per-user usage ledger.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{Coupon, CouponUsage, CouponUse, UseKind};
use crate::domain::events::{CouponEvent, DomainEvent};
use crate::domain::value_objects::{non_blank, Money};
use crate::events::EventPublisher;
use crate::pricing::{self, PricedLine};
use crate::store::{CartStore, CatalogStore, CouponStore, UsageLedger};
use crate::{CommerceError, Result};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCouponRequest {
    #[serde(alias = "cartInfoList")]
    pub cart_item_ids: Vec<Uuid>,
    pub coupon_code: String,
}

impl ApplyCouponRequest {
    /// Requested line ids in order, each once.
    fn distinct_ids(&self) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        self.cart_item_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Outcome of applying a coupon to a set of cart lines.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponApplication {
    pub coupon_code: String,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub final_amount: Money,
    pub usage_count: i32,
}

#[derive(Clone)]
pub struct CouponUsageService {
    coupons: Arc<dyn CouponStore>,
    ledger: Arc<dyn UsageLedger>,
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
    events: EventPublisher,
}

impl CouponUsageService {
    pub fn new(
        coupons: Arc<dyn CouponStore>,
        ledger: Arc<dyn UsageLedger>,
        carts: Arc<dyn CartStore>,
        catalog: Arc<dyn CatalogStore>,
        events: EventPublisher,
    ) -> Self {
        Self {
            coupons,
            ledger,
            carts,
            catalog,
            events,
        }
    }

    async fn coupon(&self, code: &str) -> Result<Coupon> {
        let code = non_blank(Some(code)).ok_or(CommerceError::MissingField("coupon code"))?;
        self.coupons
            .coupon_by_code(code)
            .await?
            .ok_or(CommerceError::CouponNotFound)
    }

    /// Prices the caller's cart lines, takes the coupon off the subtotal and
    /// holds one use for the coming order. Every call counts, including
    /// repeats on the same cart.
    pub async fn apply_coupon(
        &self,
        user_id: Uuid,
        request: &ApplyCouponRequest,
    ) -> Result<CouponApplication> {
        let ids = request.distinct_ids();
        if ids.is_empty() {
            return Err(CommerceError::MissingField("cart item ids"));
        }
        let coupon = self.coupon(&request.coupon_code).await?;
        let lines = self.carts.cart_lines(&ids, user_id).await?;
        if lines.len() != ids.len() {
            return Err(CommerceError::CartItemsNotFound);
        }

        let mut priced = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = self
                .catalog
                .product_pricing(line.product_id)
                .await?
                .ok_or(CommerceError::ProductNotFound(line.product_id))?;
            priced.push(PricedLine::at_catalog_price(&product, line.quantity));
        }

        let quote = pricing::quote(priced, Some(&coupon), Money::ZERO, Utc::now())
            .inspect_err(|e| {
                tracing::warn!(
                    coupon = %coupon.code,
                    user_id = %user_id,
                    reason = e.code(),
                    "coupon rejected"
                );
            })?;

        let use_ = CouponUse {
            coupon_id: coupon.id,
            user_id,
            usage_limit: coupon.usage_limit,
            discounted_amount: quote.coupon_discount,
            kind: UseKind::Hold,
        };
        let usage = self.ledger.record_use(&use_).await.inspect_err(|e| {
            tracing::warn!(
                coupon = %coupon.code,
                user_id = %user_id,
                reason = e.code(),
                "coupon use not recorded"
            );
        })?;

        tracing::info!(
            coupon = %coupon.code,
            user_id = %user_id,
            usage_count = usage.usage_count,
            discount = %quote.coupon_discount,
            "coupon applied"
        );
        self.events
            .publish(DomainEvent::Coupon(CouponEvent::Applied {
                coupon_id: coupon.id,
                user_id,
                usage_count: usage.usage_count,
                discount: quote.coupon_discount.amount(),
            }))
            .await;

        Ok(CouponApplication {
            coupon_code: coupon.code.to_string(),
            subtotal: quote.subtotal,
            discount_amount: quote.coupon_discount,
            final_amount: quote.total,
            usage_count: usage.usage_count,
        })
    }

    /// Gives back every use the caller made of the coupon.
    pub async fn remove_coupon(&self, user_id: Uuid, code: &str) -> Result<()> {
        let coupon = self.coupon(code).await?;
        self.ledger.release(coupon.id, user_id).await?;
        tracing::info!(coupon = %coupon.code, user_id = %user_id, "coupon usage released");
        self.events
            .publish(DomainEvent::Coupon(CouponEvent::Released {
                coupon_id: coupon.id,
                user_id,
            }))
            .await;
        Ok(())
    }

    pub async fn get_usage(&self, user_id: Uuid, code: &str) -> Result<CouponUsage> {
        let coupon = self.coupon(code).await?;
        self.ledger
            .find_usage(coupon.id, user_id)
            .await?
            .ok_or(CommerceError::UsageNotFound)
    }
}
