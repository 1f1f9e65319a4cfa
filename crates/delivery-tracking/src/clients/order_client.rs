//! # Order Client
//!
//! High-level API for the `Order` actor: placing orders and the shipment write-backs.
use crate::model::{Order, OrderAction, OrderActionResult, OrderCreate, TrackingNumber};
use crate::order_actor::OrderError;
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

/// Client for interacting with the Order actor.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, params))]
    pub async fn create_order(&self, params: OrderCreate) -> Result<String, OrderError> {
        debug!(items = params.items.len(), "Sending create_order");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    /// Fetches an order, treating absence as [`OrderError::NotFound`].
    pub async fn fetch(&self, order_ref: &str) -> Result<Order, OrderError> {
        self.get(order_ref.to_string())
            .await?
            .ok_or_else(|| OrderError::NotFound(order_ref.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn mark_shipped(
        &self,
        order_ref: String,
        tracking_number: TrackingNumber,
        at: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        match self
            .inner
            .perform_action(order_ref, OrderAction::MarkShipped { tracking_number, at })
            .await
        {
            Ok((OrderActionResult::MarkShipped(()), order)) => Ok(order),
            Ok(_) => unreachable!("MarkShipped action must return MarkShipped result"),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn mark_delivered(
        &self,
        order_ref: String,
        at: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        match self
            .inner
            .perform_action(order_ref, OrderAction::MarkDelivered { at })
            .await
        {
            Ok((OrderActionResult::MarkDelivered(()), order)) => Ok(order),
            Ok(_) => unreachable!("MarkDelivered action must return MarkDelivered result"),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, order_ref: String) -> Result<Order, OrderError> {
        match self.inner.perform_action(order_ref, OrderAction::Cancel).await {
            Ok((OrderActionResult::Cancel(()), order)) => Ok(order),
            Ok(_) => unreachable!("Cancel action must return Cancel result"),
            Err(e) => Err(Self::map_error(e)),
        }
    }
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        OrderError::from(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Customer, OrderStatus};
    use actor_framework::mock::{create_mock_client, expect_action, MockClient};
    use chrono::TimeZone;

    fn shipped_order() -> Order {
        Order {
            order_ref: "ORD-000001".into(),
            customer: Customer {
                name: "Arjun".into(),
                email: "arjun@example.com".into(),
                phone: None,
            },
            items: vec![],
            shipping_address: Address::new("1 MG Road", "Pune", "Maharashtra", "411001"),
            total: 0.0,
            shipping_cost: 0.0,
            status: OrderStatus::Shipped,
            tracking_number: None,
            placed_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            shipped_at: None,
            delivered_at: None,
        }
    }

    #[tokio::test]
    async fn mark_delivered_sends_the_timestamp() {
        let (client, mut receiver) = create_mock_client::<Order>(10);
        let order_client = OrderClient::new(client);
        let at = Utc.with_ymd_and_hms(2026, 3, 5, 14, 0, 0).unwrap();

        let task = tokio::spawn(async move {
            order_client.mark_delivered("ORD-000001".to_string(), at).await
        });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, "ORD-000001");
        assert!(matches!(action, OrderAction::MarkDelivered { at: sent } if sent == at));

        let mut delivered = shipped_order();
        delivered.status = OrderStatus::Delivered;
        responder
            .send(Ok((OrderActionResult::MarkDelivered(()), delivered)))
            .unwrap();

        let order = task.await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn missing_orders_map_to_not_found() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_get().return_ok(None);
        mock.expect_action()
            .return_err(FrameworkError::NotFound("ORD-000404".into()));

        let client = OrderClient::new(mock.client());
        assert_eq!(
            client.fetch("ORD-000404").await.unwrap_err(),
            OrderError::NotFound("ORD-000404".into())
        );
        assert_eq!(
            client.cancel("ORD-000404".into()).await.unwrap_err(),
            OrderError::NotFound("ORD-000404".into())
        );
        mock.verify();
    }
}
