//! [`ActorEntity`] implementation for [`Order`].
//!
//! Orders are owned by the wider marketplace; the delivery subsystem only places test and
//! demo orders and writes shipment progress back onto them.

use super::error::OrderError;
use crate::model::{Order, OrderAction, OrderActionResult, OrderCreate, OrderStatus, OrderUpdate};
use actor_framework::ActorEntity;
use async_trait::async_trait;

#[async_trait]
impl ActorEntity for Order {
    type Id = String;
    type Create = OrderCreate;
    type Update = OrderUpdate;
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Context = ();
    type Error = OrderError;

    fn from_create_params(id: String, params: OrderCreate) -> Result<Self, OrderError> {
        if params.customer.email.trim().is_empty() {
            return Err(OrderError::ValidationError("customer email is required".into()));
        }
        if params.items.iter().any(|item| item.quantity == 0) {
            return Err(OrderError::ValidationError("item quantity must be positive".into()));
        }
        let items_total: f64 = params
            .items
            .iter()
            .map(|item| item.unit_price * f64::from(item.quantity))
            .sum();
        Ok(Self {
            order_ref: id,
            customer: params.customer,
            total: items_total + params.shipping_cost,
            items: params.items,
            shipping_address: params.shipping_address,
            shipping_cost: params.shipping_cost,
            status: OrderStatus::Placed,
            tracking_number: None,
            placed_at: params.placed_at,
            shipped_at: None,
            delivered_at: None,
        })
    }

    async fn on_update(&mut self, update: OrderUpdate, _ctx: &()) -> Result<(), OrderError> {
        if !self.status.is_shippable() {
            return Err(OrderError::InvalidTransition(format!(
                "order {} is {} and can no longer be edited",
                self.order_ref, self.status
            )));
        }
        if let Some(address) = update.shipping_address {
            self.shipping_address = address;
        }
        if let Some(phone) = update.customer_phone {
            self.customer.phone = Some(phone);
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: OrderAction,
        _ctx: &(),
    ) -> Result<OrderActionResult, OrderError> {
        match action {
            OrderAction::MarkShipped { tracking_number, at } => {
                if !self.status.is_shippable() {
                    return Err(OrderError::InvalidTransition(format!(
                        "order {} is {} and cannot ship",
                        self.order_ref, self.status
                    )));
                }
                self.status = OrderStatus::Shipped;
                self.tracking_number = Some(tracking_number);
                self.shipped_at = Some(at);
                Ok(OrderActionResult::MarkShipped(()))
            }
            OrderAction::MarkDelivered { at } => match self.status {
                OrderStatus::Shipped => {
                    self.status = OrderStatus::Delivered;
                    self.delivered_at = Some(at);
                    Ok(OrderActionResult::MarkDelivered(()))
                }
                // Repeated delivery write-backs are harmless.
                OrderStatus::Delivered => Ok(OrderActionResult::MarkDelivered(())),
                other => Err(OrderError::InvalidTransition(format!(
                    "order {} is {other} and cannot be delivered",
                    self.order_ref
                ))),
            },
            OrderAction::Cancel => {
                if !self.status.is_shippable() {
                    return Err(OrderError::InvalidTransition(format!(
                        "order {} is {} and cannot be cancelled",
                        self.order_ref, self.status
                    )));
                }
                self.status = OrderStatus::Cancelled;
                Ok(OrderActionResult::Cancel(()))
            }
        }
    }
}
