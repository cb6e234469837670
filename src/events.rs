//! NATS publisher for domain events.
//!
//! Publishing is fire-and-forget: a broker outage never fails a request,
//! it only shows up as a warning in the logs.

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
}

impl EventPublisher {
    /// Connects when `url` is set. A failed connection disables publishing.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else {
            return Self::disabled();
        };
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(%url, "connected to NATS");
                Self {
                    client: Some(client),
                }
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "NATS unavailable, events disabled");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn publish(&self, event: DomainEvent) {
        let Some(client) = &self.client else { return };
        let subject = event.subject();
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(subject, error = %e, "failed to encode event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.to_string(), payload.into()).await {
            tracing::warn!(subject, error = %e, "failed to publish event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::CouponEvent;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_disabled_publisher_is_noop() {
        let events = EventPublisher::connect(None).await;
        assert!(!events.is_enabled());
        let released = CouponEvent::Released {
            coupon_id: Uuid::nil(),
            user_id: Uuid::nil(),
        };
        events.publish(DomainEvent::Coupon(released)).await;
    }
}
