use crate::model::Address;
use serde::{Deserialize, Serialize};

/// A seller on the marketplace. Deliveries use the artisan as their sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artisan {
    pub artisan_ref: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
}

/// Payload for registering an artisan.
#[derive(Debug, Clone)]
pub struct ArtisanCreate {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
}

/// Contact details an artisan may change.
#[derive(Debug, Clone, Default)]
pub struct ArtisanUpdate {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}
