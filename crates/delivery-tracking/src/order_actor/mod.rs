//! Order store: the collaborator deliveries are created for and report progress to.

pub mod entity;
pub mod error;

pub use error::*;

use crate::clients::OrderClient;
use crate::model::Order;
use actor_framework::ResourceActor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Creates a new Order actor and its client. Order refs look like `ORD-000001`.
pub fn new(buffer_size: usize) -> (ResourceActor<Order>, OrderClient) {
    let order_counter = Arc::new(AtomicU64::new(1));
    let next_order_ref = move || {
        let n = order_counter.fetch_add(1, Ordering::SeqCst);
        format!("ORD-{n:06}")
    };

    let (actor, generic_client) = ResourceActor::new(buffer_size, next_order_ref);
    (actor, OrderClient::new(generic_client))
}
