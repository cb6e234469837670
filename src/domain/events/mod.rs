//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::DeliveryStatus;

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Order(OrderEvent),
    Coupon(CouponEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum OrderEvent {
    Placed {
        order_id: Uuid,
        user_id: Uuid,
        total: Decimal,
        coupon_id: Option<Uuid>,
    },
    StatusChanged {
        order_id: Uuid,
        status: DeliveryStatus,
    },
}

#[derive(Clone, Debug, Serialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum CouponEvent {
    Applied {
        coupon_id: Uuid,
        user_id: Uuid,
        usage_count: i32,
        discount: Decimal,
    },
    Released {
        coupon_id: Uuid,
        user_id: Uuid,
    },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Order(OrderEvent::Placed { .. }) => "commerce.order.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "commerce.order.status_changed",
            Self::Coupon(CouponEvent::Applied { .. }) => "commerce.coupon.applied",
            Self::Coupon(CouponEvent::Released { .. }) => "commerce.coupon.released",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload() {
        let event = DomainEvent::Order(OrderEvent::StatusChanged {
            order_id: Uuid::nil(),
            status: DeliveryStatus::Shipped,
        });
        assert_eq!(event.subject(), "commerce.order.status_changed");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "statusChanged");
        assert_eq!(json["status"], "SHIPPED");
        assert!(json.get("orderId").is_some());
    }
}
