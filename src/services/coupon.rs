//! Coupon administration and lookup.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{Coupon, CouponRequest, CouponWithStats};
use crate::store::CouponStore;
use crate::{CommerceError, Result};

#[derive(Clone)]
pub struct CouponService {
    coupons: Arc<dyn CouponStore>,
}

impl CouponService {
    pub fn new(coupons: Arc<dyn CouponStore>) -> Self {
        Self { coupons }
    }

    pub async fn create(&self, request: &CouponRequest) -> Result<Coupon> {
        let coupon = Coupon::create(request)?;
        if self.coupons.code_taken(coupon.code.as_str(), None).await? {
            return Err(CommerceError::CouponCodeExists);
        }
        self.coupons.insert_coupon(&coupon).await?;
        tracing::info!(coupon = %coupon.code, coupon_type = %coupon.coupon_type, "coupon created");
        Ok(coupon)
    }

    pub async fn update(&self, id: Uuid, patch: &CouponRequest) -> Result<Coupon> {
        let mut coupon = self.get(id).await?;
        coupon.apply(patch)?;
        if self
            .coupons
            .code_taken(coupon.code.as_str(), Some(id))
            .await?
        {
            return Err(CommerceError::CouponCodeExists);
        }
        if !self.coupons.update_coupon(&coupon).await? {
            return Err(CommerceError::CouponNotFound);
        }
        Ok(coupon)
    }

    pub async fn get(&self, id: Uuid) -> Result<Coupon> {
        self.coupons
            .find_coupon(id)
            .await?
            .ok_or(CommerceError::CouponNotFound)
    }

    /// Pure lookup: an expired or inactive coupon is still returned.
    pub async fn by_code(&self, code: &str) -> Result<Coupon> {
        self.coupons
            .coupon_by_code(code.trim())
            .await?
            .ok_or(CommerceError::CouponNotFound)
    }

    pub async fn list_with_stats(&self) -> Result<Vec<CouponWithStats>> {
        let coupons = self.coupons.list_coupons().await?;
        let mut listed = Vec::with_capacity(coupons.len());
        for coupon in coupons {
            let stats = self.coupons.coupon_stats(coupon.id).await?;
            listed.push(CouponWithStats { coupon, stats });
        }
        Ok(listed)
    }

    /// Refused with [`CommerceError::CouponHasUsage`] once anyone has used the coupon.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.coupons.delete_coupon(id).await? {
            return Err(CommerceError::CouponNotFound);
        }
        tracing::info!(coupon_id = %id, "coupon deleted");
        Ok(())
    }
}
