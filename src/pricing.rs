//! Order pricing.
//!
//! Every derived amount is rounded to cents before it is used further, so the
//! stored totals can be recomputed exactly from the stored lines:
//!
//! 1. unit price = price × (1 − discount%), per line total = unit × quantity
//! 2. subtotal = Σ line totals
//! 3. coupon discount, checked against min order, capped at the coupon's
//!    max (when non-zero) and at the subtotal
//! 4. total = subtotal − coupon discount + delivery cost
//!
//! The coupon is always taken off the post-product-discount, pre-delivery subtotal.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{Coupon, CouponType, ProductPricing};
use crate::domain::value_objects::{Money, Quantity};
use crate::{CommerceError, Result};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: Quantity,
    /// Discounted unit price, frozen onto the order item.
    pub unit_price: Money,
    pub line_total: Money,
}

impl PricedLine {
    /// Prices a line at the current catalog price without looking at stock.
    pub fn at_catalog_price(product: &ProductPricing, quantity: Quantity) -> Self {
        let unit_price = product.discounted_unit_price();
        Self {
            product_id: product.product_id,
            quantity,
            unit_price,
            line_total: unit_price.multiply(quantity),
        }
    }
}

/// Prices a line for purchase, rejecting quantities above the available stock.
pub fn price_line(product: &ProductPricing, quantity: Quantity) -> Result<PricedLine> {
    if quantity.value() > product.stock {
        return Err(CommerceError::InsufficientStock {
            product: product.name.clone(),
        });
    }
    Ok(PricedLine::at_catalog_price(product, quantity))
}

pub fn subtotal(lines: &[PricedLine]) -> Money {
    lines.iter().map(|l| l.line_total).sum()
}

/// Discount granted by `coupon` on `subtotal` at time `now`.
pub fn coupon_discount(coupon: &Coupon, subtotal: Money, now: DateTime<Utc>) -> Result<Money> {
    coupon.ensure_usable(now)?;
    if subtotal < coupon.min_order_amount {
        return Err(CommerceError::MinOrderNotMet {
            subtotal,
            minimum: coupon.min_order_amount,
        });
    }
    let mut discount = match coupon.coupon_type {
        CouponType::Percentage => subtotal.percent(coupon.amount.amount()),
        CouponType::Fixed => coupon.amount,
    };
    if coupon.max_amount_applied.is_positive() {
        discount = discount.min(coupon.max_amount_applied);
    }
    Ok(discount.min(subtotal))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub coupon_discount: Money,
    pub delivery_cost: Money,
    pub total: Money,
}

pub fn quote(
    lines: Vec<PricedLine>,
    coupon: Option<&Coupon>,
    delivery_cost: Money,
    now: DateTime<Utc>,
) -> Result<Quote> {
    let subtotal = subtotal(&lines);
    let coupon_discount = match coupon {
        Some(coupon) => coupon_discount(coupon, subtotal, now)?,
        None => Money::ZERO,
    };
    let total = subtotal.subtract(coupon_discount).add(delivery_cost);
    Ok(Quote {
        lines,
        subtotal,
        coupon_discount,
        delivery_cost,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::CouponRequest;
    use crate::domain::value_objects::Percentage;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn product(price: Money, stock: u32, pct: i32) -> ProductPricing {
        ProductPricing {
            product_id: Uuid::now_v7(),
            name: "Amber Musk".into(),
            price,
            stock,
            discount: Percentage::new(pct).unwrap(),
        }
    }

    fn coupon(code: &str, kind: &str, amount: i64, min: i64, max: i64) -> Coupon {
        Coupon::create(&CouponRequest {
            code: Some(code.into()),
            coupon_type: Some(kind.into()),
            amount: Some(Money::from_major(amount)),
            min_order_amount: Some(Money::from_major(min)),
            max_amount_applied: Some(Money::from_major(max)),
            expiration_time: Some(Utc::now() + Duration::days(1)),
            usage_limit: Some(3),
            active: Some(true),
        })
        .unwrap()
    }

    fn qty(n: i64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_percentage_coupon_capped_at_max() {
        let line = price_line(&product(Money::from_major(1000), 5, 20), qty(2)).unwrap();
        assert_eq!(line.unit_price, Money::from_major(800));
        let save10 = coupon("SAVE10", "PERCENTAGE", 10, 500, 150);
        let q = quote(vec![line], Some(&save10), Money::from_major(60), Utc::now()).unwrap();
        assert_eq!(q.subtotal, Money::from_major(1600));
        assert_eq!(q.coupon_discount, Money::from_major(150));
        assert_eq!(q.total, Money::from_major(1510));
    }

    #[test]
    fn test_fixed_coupon_min_order_not_met() {
        let line = price_line(&product(Money::from_major(80), 5, 0), qty(1)).unwrap();
        let flat50 = coupon("FLAT50", "FIXED", 50, 100, 0);
        let err = quote(vec![line], Some(&flat50), Money::ZERO, Utc::now()).unwrap_err();
        let CommerceError::MinOrderNotMet { subtotal, minimum } = err else {
            panic!("expected min order failure, got {err:?}");
        };
        assert_eq!(subtotal, Money::from_major(80));
        assert_eq!(minimum, Money::from_major(100));
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        let line = price_line(&product(Money::from_major(30), 5, 0), qty(1)).unwrap();
        let big = coupon("BIG", "FIXED", 500, 0, 0);
        let q = quote(vec![line], Some(&big), Money::from_major(10), Utc::now()).unwrap();
        assert_eq!(q.coupon_discount, Money::from_major(30));
        assert_eq!(q.total, Money::from_major(10));
    }

    #[test]
    fn test_insufficient_stock() {
        let err = price_line(&product(Money::from_major(30), 1, 0), qty(2)).unwrap_err();
        assert!(matches!(err, CommerceError::InsufficientStock { .. }));
    }

    #[test]
    fn test_rounding_at_each_step() {
        // 19.99 less 15% = 16.9915 -> 16.99
        let amber = product(Money::new(Decimal::new(1999, 2)), 10, 15);
        let line = price_line(&amber, qty(3)).unwrap();
        assert_eq!(line.unit_price, Money::new(Decimal::new(1699, 2)));
        assert_eq!(line.line_total, Money::new(Decimal::new(5097, 2)));
        // 12.5% of 50.97 = 6.371... -> 6.37
        let mut pct = coupon("HALF", "PERCENTAGE", 1, 0, 0);
        pct.amount = Money::new(Decimal::new(125, 1));
        let q = quote(vec![line], Some(&pct), Money::ZERO, Utc::now()).unwrap();
        assert_eq!(q.coupon_discount, Money::new(Decimal::new(637, 2)));
        assert_eq!(q.total, Money::new(Decimal::new(4460, 2)));
    }

    #[test]
    fn test_expired_coupon_rejected() {
        let line = price_line(&product(Money::from_major(100), 1, 0), qty(1)).unwrap();
        let c = coupon("OLD", "FIXED", 5, 0, 0);
        let later = Utc::now() + Duration::days(2);
        let quoted = quote(vec![line], Some(&c), Money::ZERO, later);
        assert!(matches!(quoted, Err(CommerceError::CouponExpired)));
    }

    #[test]
    fn test_no_coupon() {
        let lines = vec![
            price_line(&product(Money::from_major(100), 1, 10), qty(1)).unwrap(),
            price_line(&product(Money::from_major(40), 9, 0), qty(2)).unwrap(),
        ];
        let q = quote(lines, None, Money::from_major(60), Utc::now()).unwrap();
        assert_eq!(q.subtotal, Money::from_major(170));
        assert_eq!(q.coupon_discount, Money::ZERO);
        assert_eq!(q.total, Money::from_major(230));
    }
}
