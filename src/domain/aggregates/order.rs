//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::coupon_usage::CouponUse;
use crate::domain::value_objects::{non_blank, Money, Quantity};
use crate::pricing::Quote;
use crate::{CommerceError, Result};

pub const DEFAULT_PAYMENT_METHOD: &str = "CASH_ON_DELIVERY";

/// `PENDING → CONFIRMED → PROCESSING → SHIPPED → DELIVERED`, plus `CANCELLED`
/// and `RETURNED`. Every move is an explicit admin update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Returned => "RETURNED",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = CommerceError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            "RETURNED" => Ok(Self::Returned),
            _ => Err(CommerceError::InvalidOrderStatus(s.to_string())),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = CommerceError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(CommerceError::Storage(format!("unknown payment status {other:?}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address: String,
    pub area: String,
    pub total_amount: Money,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub coupon_id: Option<Uuid>,
    pub discount_amount: Money,
    pub delivery_cost: Money,
    pub notes: Option<String>,
    #[serde(rename = "orderItemInfoList")]
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line of a placed order. `price` is the unit price frozen at placement.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Quantity,
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub area: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Body of place-order. The caller's user id comes from the auth context.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<String>,
    pub delivery_cost_id: Uuid,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

impl PlaceOrderRequest {
    /// Returns the trimmed (address, area) pair.
    pub fn shipping(&self) -> Result<(String, String)> {
        let shipping = self
            .shipping_address
            .as_ref()
            .ok_or(CommerceError::MissingField("shipping address"))?;
        let address = non_blank(Some(&shipping.address))
            .ok_or(CommerceError::MissingField("address"))?;
        let area = non_blank(Some(&shipping.area)).ok_or(CommerceError::MissingField("area"))?;
        Ok((address.to_string(), area.to_string()))
    }

    pub fn coupon_code(&self) -> Option<&str> {
        non_blank(self.coupon_code.as_deref())
    }
}

/// A fully priced order ready for the persister: every id, price and total is final.
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub order: Order,
    /// Ledger entry recorded in the same transaction as the order rows.
    pub coupon_use: Option<CouponUse>,
}

impl NewOrder {
    pub fn priced(
        user_id: Uuid,
        (address, area): (String, String),
        payment_method: Option<&str>,
        notes: Option<String>,
        quote: &Quote,
        coupon_use: Option<CouponUse>,
    ) -> Self {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let items = quote
            .lines
            .iter()
            .map(|line| OrderItem {
                id: Uuid::now_v7(),
                order_id: id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.unit_price,
                created_at: now,
            })
            .collect();
        let payment_method = non_blank(payment_method).unwrap_or(DEFAULT_PAYMENT_METHOD);
        let order = Order {
            id,
            user_id,
            address,
            area,
            total_amount: quote.total,
            payment_method: payment_method.to_string(),
            payment_status: PaymentStatus::Pending,
            delivery_status: DeliveryStatus::Pending,
            coupon_id: coupon_use.as_ref().map(|u| u.coupon_id),
            discount_amount: quote.coupon_discount,
            delivery_cost: quote.delivery_cost,
            notes,
            items,
            created_at: now,
            updated_at: now,
        };
        Self { order, coupon_use }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// Validated form of [`OrderFilter`]. `page` is zero-based.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderQuery {
    pub status: Option<DeliveryStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: u32,
    pub size: u32,
}

impl OrderQuery {
    pub fn matches(&self, order: &Order) -> bool {
        self.status.map_or(true, |s| order.delivery_status == s)
            && self.start_date.map_or(true, |d| order.created_at >= d)
            && self.end_date.map_or(true, |d| order.created_at <= d)
    }

    pub fn offset(&self) -> usize {
        self.page as usize * self.size as usize
    }
}

impl TryFrom<OrderFilter> for OrderQuery {
    type Error = CommerceError;
    fn try_from(f: OrderFilter) -> Result<Self> {
        let status = match non_blank(f.status.as_deref()) {
            Some(s) => Some(s.parse()?),
            None => None,
        };
        Ok(Self {
            status,
            start_date: f.start_date,
            end_date: f.end_date,
            page: f.page.unwrap_or(0),
            size: f.size.unwrap_or(10).clamp(1, 100),
        })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub order_info_list: Vec<Order>,
    pub total_page: u64,
    pub total_elements: u64,
}

impl OrderPage {
    pub fn new(orders: Vec<Order>, total_elements: u64, size: u32) -> Self {
        let total_page = total_elements.div_ceil(size.max(1) as u64);
        Self {
            order_info_list: orders,
            total_page,
            total_elements,
        }
    }
}
