//! Coupon Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::{non_blank, CouponCode, Money};
use crate::{CommerceError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponType {
    Percentage,
    Fixed,
}

impl FromStr for CouponType {
    type Err = CommerceError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "PERCENTAGE" => Ok(Self::Percentage),
            "FIXED" => Ok(Self::Fixed),
            other => Err(CommerceError::InvalidCouponType(other.to_string())),
        }
    }
}

impl fmt::Display for CouponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percentage => write!(f, "PERCENTAGE"),
            Self::Fixed => write!(f, "FIXED"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    pub code: CouponCode,
    pub coupon_type: CouponType,
    pub amount: Money,
    pub min_order_amount: Money,
    /// Upper bound on the discount; zero means uncapped.
    pub max_amount_applied: Money,
    pub expiration_time: DateTime<Utc>,
    /// Uses allowed per user.
    pub usage_limit: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    pub fn create(request: &CouponRequest) -> Result<Self> {
        let code = CouponCode::new(request.code.as_deref().unwrap_or_default())?;
        let coupon_type: CouponType = request
            .coupon_type
            .as_deref()
            .ok_or(CommerceError::MissingField("coupon type"))?
            .parse()?;
        let amount = request
            .amount
            .ok_or(CommerceError::MissingField("coupon amount"))?;
        let expiration_time = request
            .expiration_time
            .ok_or(CommerceError::MissingField("expiration time"))?;
        let now = Utc::now();
        let coupon = Self {
            id: Uuid::now_v7(),
            code,
            coupon_type,
            amount,
            min_order_amount: request.min_order_amount.unwrap_or(Money::ZERO),
            max_amount_applied: request.max_amount_applied.unwrap_or(Money::ZERO),
            expiration_time,
            usage_limit: request.usage_limit.unwrap_or(1),
            active: request.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        coupon.check()?;
        Ok(coupon)
    }

    /// Applies the fields present in `patch`; absent fields keep their value.
    pub fn apply(&mut self, patch: &CouponRequest) -> Result<()> {
        if let Some(code) = non_blank(patch.code.as_deref()) {
            self.code = CouponCode::new(code)?;
        }
        if let Some(kind) = non_blank(patch.coupon_type.as_deref()) {
            self.coupon_type = kind.parse()?;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(min) = patch.min_order_amount {
            self.min_order_amount = min;
        }
        if let Some(max) = patch.max_amount_applied {
            self.max_amount_applied = max;
        }
        if let Some(expiration) = patch.expiration_time {
            self.expiration_time = expiration;
        }
        if let Some(limit) = patch.usage_limit {
            self.usage_limit = limit;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        self.check()?;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn check(&self) -> Result<()> {
        if !self.amount.is_positive() {
            return Err(invalid("coupon amount must be greater than 0"));
        }
        if self.coupon_type == CouponType::Percentage
            && self.amount.amount() > Decimal::ONE_HUNDRED
        {
            return Err(invalid("percentage coupon amount cannot exceed 100"));
        }
        if self.min_order_amount.is_negative() || self.max_amount_applied.is_negative() {
            return Err(invalid("coupon bounds cannot be negative"));
        }
        if self.usage_limit < 1 {
            return Err(invalid("usage limit must be at least 1"));
        }
        Ok(())
    }

    /// Rejects inactive and expired coupons.
    pub fn ensure_usable(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.active {
            return Err(CommerceError::CouponInactive);
        }
        if now > self.expiration_time {
            return Err(CommerceError::CouponExpired);
        }
        Ok(())
    }
}

fn invalid(message: &str) -> CommerceError {
    CommerceError::Validation(message.into())
}

/// Body for both create and partial update.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRequest {
    pub code: Option<String>,
    pub coupon_type: Option<String>,
    pub amount: Option<Money>,
    pub min_order_amount: Option<Money>,
    pub max_amount_applied: Option<Money>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponStats {
    pub total_usage_count: i64,
    pub unique_users_count: i64,
    pub total_savings_amount: Money,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponWithStats {
    #[serde(flatten)]
    pub coupon: Coupon,
    #[serde(flatten)]
    pub stats: CouponStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request() -> CouponRequest {
        CouponRequest {
            code: Some(" SAVE10 ".into()),
            coupon_type: Some("percentage".into()),
            amount: Some(Money::from_major(10)),
            min_order_amount: Some(Money::from_major(500)),
            max_amount_applied: Some(Money::from_major(150)),
            expiration_time: Some(Utc::now() + Duration::days(7)),
            usage_limit: None,
            active: None,
        }
    }

    #[test]
    fn test_coupon_create_normalizes() {
        let c = Coupon::create(&request()).unwrap();
        assert_eq!(c.code.as_str(), "SAVE10");
        assert_eq!(c.coupon_type, CouponType::Percentage);
        assert_eq!(c.usage_limit, 1);
        assert!(c.active);
    }

    #[test]
    fn test_coupon_rejects_unknown_type() {
        let req = CouponRequest {
            coupon_type: Some("BOGO".into()),
            ..request()
        };
        let err = Coupon::create(&req).unwrap_err();
        assert!(matches!(err, CommerceError::InvalidCouponType(t) if t == "BOGO"));
    }

    #[test]
    fn test_coupon_rejects_zero_amount() {
        let req = CouponRequest {
            amount: Some(Money::ZERO),
            ..request()
        };
        assert!(matches!(Coupon::create(&req), Err(CommerceError::Validation(_))));
    }

    #[test]
    fn test_coupon_patch_keeps_absent_fields() {
        let mut c = Coupon::create(&request()).unwrap();
        c.apply(&CouponRequest {
            active: Some(false),
            ..Default::default()
        })
        .unwrap();
        assert!(!c.active);
        assert_eq!(c.amount, Money::from_major(10));
        assert_eq!(c.code.as_str(), "SAVE10");
    }

    #[test]
    fn test_ensure_usable() {
        let mut c = Coupon::create(&request()).unwrap();
        assert!(c.ensure_usable(Utc::now()).is_ok());
        let later = Utc::now() + Duration::days(8);
        assert!(matches!(c.ensure_usable(later), Err(CommerceError::CouponExpired)));
        c.active = false;
        assert!(matches!(
            c.ensure_usable(Utc::now()),
            Err(CommerceError::CouponInactive)
        ));
    }
}
