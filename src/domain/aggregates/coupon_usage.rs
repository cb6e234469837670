//! Per (coupon, user) usage counter

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponUsage {
    pub id: Uuid,
    pub coupon_id: Uuid,
    pub user_id: Uuid,
    pub usage_count: i32,
    /// Uses taken by apply-coupon that no order has spent yet.
    pub held_count: i32,
    /// Discount granted by the most recent use.
    pub discounted_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a use lands on the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseKind {
    /// Apply-coupon: counts a use and keeps it held for the coming order.
    Hold,
    /// Place-order: spends a held use when there is one, else counts a new use.
    Redeem,
}

/// A use to record against the ledger, carrying the limit it must respect.
#[derive(Clone, Debug, PartialEq)]
pub struct CouponUse {
    pub coupon_id: Uuid,
    pub user_id: Uuid,
    pub usage_limit: i32,
    pub discounted_amount: Money,
    pub kind: UseKind,
}

impl CouponUse {
    /// True when this use spends a hold instead of counting a new use.
    pub fn spends_hold(&self, held_count: i32) -> bool {
        self.kind == UseKind::Redeem && held_count > 0
    }
}

impl CouponUsage {
    pub fn first(use_: &CouponUse) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            coupon_id: use_.coupon_id,
            user_id: use_.user_id,
            usage_count: 1,
            held_count: i32::from(use_.kind == UseKind::Hold),
            discounted_amount: use_.discounted_amount,
            created_at: now,
            updated_at: now,
        }
    }

    /// Counts another use, or spends a held one. Returns false, leaving the
    /// row untouched, when a new use would pass the limit.
    pub fn record(&mut self, use_: &CouponUse) -> bool {
        if use_.spends_hold(self.held_count) {
            self.held_count -= 1;
        } else if self.usage_count >= use_.usage_limit {
            return false;
        } else {
            self.usage_count += 1;
            if use_.kind == UseKind::Hold {
                self.held_count += 1;
            }
        }
        self.discounted_amount = use_.discounted_amount;
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn use_of(kind: UseKind, usage_limit: i32) -> CouponUse {
        CouponUse {
            coupon_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            usage_limit,
            discounted_amount: Money::from_major(5),
            kind,
        }
    }

    #[test]
    fn test_record_respects_limit() {
        let use_ = use_of(UseKind::Hold, 2);
        let mut usage = CouponUsage::first(&use_);
        assert!(usage.record(&use_));
        assert_eq!(usage.usage_count, 2);
        assert!(!usage.record(&use_));
        assert_eq!(usage.usage_count, 2);
        assert_eq!(usage.held_count, 2);
    }

    #[test]
    fn test_redeem_spends_held_use() {
        let hold = use_of(UseKind::Hold, 1);
        let mut usage = CouponUsage::first(&hold);
        let redeem = CouponUse {
            kind: UseKind::Redeem,
            ..hold.clone()
        };
        assert!(usage.record(&redeem));
        assert_eq!(usage.usage_count, 1);
        assert_eq!(usage.held_count, 0);
        // Nothing held and the limit is reached.
        assert!(!usage.record(&redeem));
    }

    #[test]
    fn test_redeem_without_hold_counts() {
        let redeem = use_of(UseKind::Redeem, 2);
        let mut usage = CouponUsage::first(&redeem);
        assert_eq!(usage.held_count, 0);
        assert!(usage.record(&redeem));
        assert_eq!(usage.usage_count, 2);
    }
}
