//! Domain clients wrapping each actor's `ResourceClient`.

mod artisan_client;
mod delivery_client;
mod order_client;

pub use actor_framework::ActorClient;
pub use artisan_client::ArtisanClient;
pub use delivery_client::DeliveryClient;
pub use order_client::OrderClient;
