//! Artisan store. Deliveries read the sender's name, contact and pickup address from here.

pub mod entity;
pub mod error;

pub use error::*;

use crate::clients::ArtisanClient;
use crate::model::Artisan;
use actor_framework::ResourceActor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Creates a new Artisan actor and its client. Artisan refs look like `ART-0001`.
pub fn new(buffer_size: usize) -> (ResourceActor<Artisan>, ArtisanClient) {
    let artisan_counter = Arc::new(AtomicU64::new(1));
    let next_artisan_ref = move || {
        let n = artisan_counter.fetch_add(1, Ordering::SeqCst);
        format!("ART-{n:04}")
    };

    let (actor, generic_client) = ResourceActor::new(buffer_size, next_artisan_ref);
    (actor, ArtisanClient::new(generic_client))
}
