//! Order placement and delivery status management.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{
    CouponUse, DeliveryStatus, NewOrder, Order, OrderFilter, OrderPage, OrderQuery,
    PlaceOrderRequest, UseKind,
};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Quantity;
use crate::events::EventPublisher;
use crate::pricing;
use crate::store::{CatalogStore, CouponStore, DeliveryCostStore, OrderStore, UserDirectory};
use crate::{CommerceError, ErrorKind, Result};

#[derive(Clone)]
pub struct OrderService {
    catalog: Arc<dyn CatalogStore>,
    coupons: Arc<dyn CouponStore>,
    delivery_costs: Arc<dyn DeliveryCostStore>,
    users: Arc<dyn UserDirectory>,
    orders: Arc<dyn OrderStore>,
    events: EventPublisher,
}

impl OrderService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        coupons: Arc<dyn CouponStore>,
        delivery_costs: Arc<dyn DeliveryCostStore>,
        users: Arc<dyn UserDirectory>,
        orders: Arc<dyn OrderStore>,
        events: EventPublisher,
    ) -> Self {
        Self {
            catalog,
            coupons,
            delivery_costs,
            users,
            orders,
            events,
        }
    }

    /// Prices the request, then writes the order, its items, the stock
    /// decrements and the coupon use in one unit. A use held by an earlier
    /// apply-coupon is spent rather than counted again.
    pub async fn place_order(&self, user_id: Uuid, request: &PlaceOrderRequest) -> Result<Order> {
        request.validate()?;
        let shipping = request.shipping()?;
        if !self.users.user_exists(user_id).await? {
            return Err(CommerceError::UserNotFound);
        }
        let delivery = self
            .delivery_costs
            .find_delivery_cost(request.delivery_cost_id)
            .await?
            .ok_or(CommerceError::DeliveryCostNotFound)?;

        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let quantity = Quantity::new(item.quantity)?;
            let product = self
                .catalog
                .product_pricing(item.product_id)
                .await?
                .ok_or(CommerceError::ProductNotFound(item.product_id))?;
            let line = pricing::price_line(&product, quantity).inspect_err(|e| reject(user_id, e))?;
            lines.push(line);
        }

        let coupon = match request.coupon_code() {
            Some(code) => Some(
                self.coupons
                    .coupon_by_code(code)
                    .await?
                    .ok_or(CommerceError::CouponNotFound)?,
            ),
            None => None,
        };
        let quote = pricing::quote(lines, coupon.as_ref(), delivery.cost, Utc::now())
            .inspect_err(|e| reject(user_id, e))?;
        let coupon_use = coupon.as_ref().map(|c| CouponUse {
            coupon_id: c.id,
            user_id,
            usage_limit: c.usage_limit,
            discounted_amount: quote.coupon_discount,
            kind: UseKind::Redeem,
        });

        let new_order = NewOrder::priced(
            user_id,
            shipping,
            request.payment_method.as_deref(),
            request.notes.clone(),
            &quote,
            coupon_use,
        );
        let order = self
            .orders
            .place_order(&new_order)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::Persistence => {
                    tracing::error!(user_id = %user_id, error = %e, "order placement failed");
                    CommerceError::OrderPlacementFailed(e.to_string())
                }
                _ => {
                    reject(user_id, &e);
                    e
                }
            })?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.total_amount,
            coupon = ?order.coupon_id,
            "order placed"
        );
        self.events
            .publish(DomainEvent::Order(OrderEvent::Placed {
                order_id: order.id,
                user_id,
                total: order.total_amount.amount(),
                coupon_id: order.coupon_id,
            }))
            .await;
        Ok(order)
    }

    /// Any move within the delivery status enum is allowed.
    pub async fn update_order_status(&self, id: Uuid, status: &str) -> Result<Order> {
        let status: DeliveryStatus = status.parse()?;
        if !self.orders.update_delivery_status(id, status).await? {
            return Err(CommerceError::OrderNotFound);
        }
        tracing::info!(order_id = %id, status = %status, "order status updated");
        self.events
            .publish(DomainEvent::Order(OrderEvent::StatusChanged {
                order_id: id,
                status,
            }))
            .await;
        self.orders
            .find_order(id)
            .await?
            .ok_or(CommerceError::OrderNotFound)
    }

    pub async fn history(&self, user_id: Uuid) -> Result<Vec<Order>> {
        self.orders.orders_for_user(user_id).await
    }

    pub async fn filter(&self, filter: OrderFilter) -> Result<OrderPage> {
        let query = OrderQuery::try_from(filter)?;
        let (orders, total) = self.orders.filter_orders(&query).await?;
        Ok(OrderPage::new(orders, total, query.size))
    }

    /// Owners see their own orders; admins see all. Others get not-found.
    pub async fn get_order(&self, id: Uuid, caller: Uuid, is_admin: bool) -> Result<Order> {
        match self.orders.find_order(id).await? {
            Some(order) if is_admin || order.user_id == caller => Ok(order),
            _ => Err(CommerceError::OrderNotFound),
        }
    }
}

fn reject(user_id: Uuid, e: &CommerceError) {
    tracing::warn!(user_id = %user_id, reason = e.code(), "order rejected: {e}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{
        CategoryRequest, CouponRequest, DeliveryCostRequest, DiscountRequest, OrderItemRequest,
        PaymentStatus, ProductRequest, ShippingAddress, DEFAULT_PAYMENT_METHOD,
    };
    use crate::domain::value_objects::{Money, Percentage};
    use crate::services::{
        ApplyCouponRequest, CatalogService, CouponService, CouponUsageService, DeliveryCostService,
        DiscountService,
    };
    use crate::store::{CartStore, MemoryStore, UsageLedger};
    use chrono::Duration;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: OrderService,
        user: Uuid,
        product: Uuid,
        delivery: Uuid,
    }

    async fn fixture(price: i64, stock: i64, discount: i32) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let catalog = CatalogService::new(store.clone());
        let category = catalog
            .create_category(&CategoryRequest {
                name: "Parfum".into(),
                description: None,
            })
            .await
            .unwrap();
        let product = catalog
            .create_product(&ProductRequest {
                product_name: "Amber Musk".into(),
                product_code: None,
                description: None,
                price: Money::from_major(price),
                stock: Some(stock),
                category_id: category.id,
            })
            .await
            .unwrap();
        if discount > 0 {
            DiscountService::new(store.clone(), store.clone())
                .add(&DiscountRequest {
                    product_id: product.id,
                    percentage: Percentage::new(discount).unwrap(),
                })
                .await
                .unwrap();
        }
        let delivery = DeliveryCostService::new(store.clone())
            .add(&DeliveryCostRequest {
                location: Some("Dhaka".into()),
                service: None,
                cost: Some(Money::from_major(60)),
            })
            .await
            .unwrap();
        let user = Uuid::now_v7();
        store.register_user(user).await.unwrap();
        let service = OrderService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            EventPublisher::disabled(),
        );
        Fixture {
            store,
            service,
            user,
            product: product.id,
            delivery: delivery.id,
        }
    }

    fn request(f: &Fixture, quantity: i64, coupon: Option<&str>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            items: vec![OrderItemRequest {
                product_id: f.product,
                quantity,
            }],
            shipping_address: Some(ShippingAddress {
                address: "12 Lake Rd".into(),
                area: "Gulshan".into(),
            }),
            payment_method: None,
            delivery_cost_id: f.delivery,
            coupon_code: coupon.map(String::from),
            notes: None,
        }
    }

    async fn stock(f: &Fixture) -> u32 {
        let product = f.store.find_product(f.product).await.unwrap();
        product.unwrap().stock
    }

    async fn save10(store: &Arc<MemoryStore>, usage_limit: i32) -> Uuid {
        CouponService::new(store.clone())
            .create(&CouponRequest {
                code: Some("SAVE10".into()),
                coupon_type: Some("PERCENTAGE".into()),
                amount: Some(Money::from_major(10)),
                min_order_amount: Some(Money::from_major(500)),
                max_amount_applied: Some(Money::from_major(150)),
                expiration_time: Some(Utc::now() + Duration::days(1)),
                usage_limit: Some(usage_limit),
                active: Some(true),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_place_order_with_coupon() {
        let f = fixture(1000, 5, 20).await;
        let coupon_id = save10(&f.store, 1).await;
        let req = request(&f, 2, Some("SAVE10"));
        let order = f.service.place_order(f.user, &req).await.unwrap();

        assert_eq!(order.total_amount, Money::from_major(1510));
        assert_eq!(order.discount_amount, Money::from_major(150));
        assert_eq!(order.delivery_cost, Money::from_major(60));
        assert_eq!(order.items[0].price, Money::from_major(800));
        assert_eq!(order.payment_method, DEFAULT_PAYMENT_METHOD);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.delivery_status, DeliveryStatus::Pending);
        assert_eq!(order.coupon_id, Some(coupon_id));
        assert_eq!(stock(&f).await, 3);
        let usage = f.store.find_usage(coupon_id, f.user).await.unwrap();
        let usage = usage.unwrap();
        assert_eq!(usage.usage_count, 1);

        // The single allowed use is spent: the next order is refused and stock is untouched.
        let req = request(&f, 1, Some("SAVE10"));
        let err = f.service.place_order(f.user, &req).await.unwrap_err();
        assert!(matches!(err, CommerceError::UsageLimitExceeded));
        assert_eq!(stock(&f).await, 3);
    }

    #[tokio::test]
    async fn test_order_after_apply_spends_one_use() {
        let f = fixture(1000, 5, 20).await;
        let coupon_id = save10(&f.store, 1).await;
        let line = f
            .store
            .add_to_cart(f.user, f.product, Quantity::new(2).unwrap())
            .await
            .unwrap();
        let usages = CouponUsageService::new(
            f.store.clone(),
            f.store.clone(),
            f.store.clone(),
            f.store.clone(),
            EventPublisher::disabled(),
        );
        let apply = ApplyCouponRequest {
            cart_item_ids: vec![line.id],
            coupon_code: "SAVE10".into(),
        };
        usages.apply_coupon(f.user, &apply).await.unwrap();

        let req = request(&f, 2, Some("SAVE10"));
        let order = f.service.place_order(f.user, &req).await.unwrap();
        assert_eq!(order.discount_amount, Money::from_major(150));
        let usage = f.store.find_usage(coupon_id, f.user).await.unwrap();
        let usage = usage.unwrap();
        assert_eq!((usage.usage_count, usage.held_count), (1, 0));

        // Nothing held and the limit is reached.
        let err = f.service.place_order(f.user, &req).await.unwrap_err();
        assert!(matches!(err, CommerceError::UsageLimitExceeded));
    }

    #[tokio::test]
    async fn test_frozen_price() {
        let f = fixture(1000, 5, 20).await;
        let req = request(&f, 1, None);
        let order = f.service.place_order(f.user, &req).await.unwrap();
        let mut product = f.store.find_product(f.product).await.unwrap().unwrap();
        product.price = Money::from_major(2000);
        f.store.update_product(&product).await.unwrap();
        let stored = f.service.get_order(order.id, f.user, false).await.unwrap();
        assert_eq!(stored.items[0].price, Money::from_major(800));
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_stock() {
        let f = fixture(100, 2, 0).await;
        let req = request(&f, 3, None);
        let err = f.service.place_order(f.user, &req).await.unwrap_err();
        assert!(matches!(err, CommerceError::InsufficientStock { .. }));
        assert_eq!(stock(&f).await, 2);
    }

    #[tokio::test]
    async fn test_failed_placement_keeps_coupon_use() {
        let f = fixture(1000, 1, 0).await;
        let coupon_id = save10(&f.store, 1).await;
        let req = request(&f, 2, Some("SAVE10"));
        let err = f.service.place_order(f.user, &req).await.unwrap_err();
        assert!(matches!(err, CommerceError::InsufficientStock { .. }));
        let usage = f.store.find_usage(coupon_id, f.user).await.unwrap();
        assert!(usage.is_none());
    }

    #[tokio::test]
    async fn test_required_fields() {
        let f = fixture(100, 2, 0).await;
        let mut req = request(&f, 1, None);
        req.shipping_address = None;
        let err = f.service.place_order(f.user, &req).await.unwrap_err();
        assert!(matches!(err, CommerceError::MissingField("shipping address")));

        let mut req = request(&f, 1, None);
        req.items.clear();
        let err = f.service.place_order(f.user, &req).await.unwrap_err();
        assert!(matches!(err, CommerceError::Validation(_)));

        let (stranger, req) = (Uuid::now_v7(), request(&f, 1, None));
        let err = f.service.place_order(stranger, &req).await.unwrap_err();
        assert!(matches!(err, CommerceError::UserNotFound));

        let mut req = request(&f, 1, None);
        req.delivery_cost_id = Uuid::now_v7();
        let err = f.service.place_order(f.user, &req).await.unwrap_err();
        assert!(matches!(err, CommerceError::DeliveryCostNotFound));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_orders_for_last_unit() {
        let f = fixture(100, 1, 0).await;
        let other = Uuid::now_v7();
        f.store.register_user(other).await.unwrap();

        let (a, b) = (f.service.clone(), f.service.clone());
        let (req_a, req_b) = (request(&f, 1, None), request(&f, 1, None));
        let user = f.user;
        let first = tokio::spawn(async move { a.place_order(user, &req_a).await });
        let second = tokio::spawn(async move { b.place_order(other, &req_b).await });
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(CommerceError::InsufficientStock { .. }))));
        assert_eq!(stock(&f).await, 0);
    }

    #[tokio::test]
    async fn test_status_updates_and_filter() {
        let f = fixture(100, 10, 0).await;
        let req = request(&f, 1, None);
        let order = f.service.place_order(f.user, &req).await.unwrap();
        f.service.place_order(f.user, &req).await.unwrap();

        let err = f
            .service
            .update_order_status(order.id, "LOST")
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::InvalidOrderStatus(_)));
        let err = f
            .service
            .update_order_status(Uuid::now_v7(), "SHIPPED")
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::OrderNotFound));
        let shipped = f
            .service
            .update_order_status(order.id, "shipped")
            .await
            .unwrap();
        assert_eq!(shipped.delivery_status, DeliveryStatus::Shipped);

        let shipped_only = OrderFilter {
            status: Some("SHIPPED".into()),
            ..Default::default()
        };
        let page = f.service.filter(shipped_only).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.order_info_list[0].id, order.id);

        let first_of_two = OrderFilter {
            size: Some(1),
            page: Some(1),
            ..Default::default()
        };
        let page = f.service.filter(first_of_two).await.unwrap();
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.total_page, 2);
        assert_eq!(page.order_info_list.len(), 1);

        assert_eq!(f.service.history(f.user).await.unwrap().len(), 2);
        let stranger = Uuid::now_v7();
        let err = f
            .service
            .get_order(order.id, stranger, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::OrderNotFound));
        assert!(f.service.get_order(order.id, stranger, true).await.is_ok());
    }
}
