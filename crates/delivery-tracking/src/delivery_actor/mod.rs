//! # Delivery Actor
//!
//! Owns every [`DeliveryRecord`] and applies changes to them one request at a time.
//!
//! - Ids are tracking numbers, minted from the injected clock and a random suffix. A
//!   generated number that is already taken is regenerated by the actor.
//! - Each order can have only one delivery; a second create for the same order is rejected.
//! - A failed action leaves the record exactly as it was.

mod actions;
pub mod entity;

pub use actions::*;
pub use entity::DeliveryContext;

use crate::clients::DeliveryClient;
use crate::model::{tracking_number_generator, DeliveryRecord};
use actor_framework::ResourceActor;
use mockable::Clock;
use std::sync::Arc;

/// Creates a new Delivery actor and its client.
pub fn new(buffer_size: usize, clock: Arc<dyn Clock>) -> (ResourceActor<DeliveryRecord>, DeliveryClient) {
    let (actor, generic_client) =
        ResourceActor::new(buffer_size, tracking_number_generator(clock));
    (actor, DeliveryClient::new(generic_client))
}
