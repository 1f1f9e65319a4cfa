//! The marketplace order a delivery fulfils.

use crate::model::{Address, TrackingNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Placed,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Orders in these states can still be handed to a courier.
    pub fn is_shippable(self) -> bool {
        matches!(self, OrderStatus::Placed | OrderStatus::Confirmed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub artisan_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_ref: String,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub total: f64,
    pub shipping_cost: f64,
    pub status: OrderStatus,
    pub tracking_number: Option<TrackingNumber>,
    pub placed_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
    /// The artisan who ships the order: the seller of its first item.
    pub fn primary_artisan(&self) -> Option<&str> {
        self.items.first().map(|item| item.artisan_ref.as_str())
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Payload for placing an order. The total is computed from the items and shipping cost.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub shipping_cost: f64,
    pub placed_at: DateTime<Utc>,
}

/// Fields a customer may still change before shipment.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub shipping_address: Option<Address>,
    pub customer_phone: Option<String>,
}

/// Shipment write-backs recorded on an order.
#[derive(Debug, Clone)]
pub enum OrderAction {
    MarkShipped {
        tracking_number: TrackingNumber,
        at: DateTime<Utc>,
    },
    MarkDelivered {
        at: DateTime<Utc>,
    },
    Cancel,
}

/// Results from OrderActions - variants match 1:1 with OrderAction
#[derive(Debug, Clone)]
pub enum OrderActionResult {
    MarkShipped(()),
    MarkDelivered(()),
    Cancel(()),
}
