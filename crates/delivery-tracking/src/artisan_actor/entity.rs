use super::error::ArtisanError;
use crate::model::{Artisan, ArtisanCreate, ArtisanUpdate};
use actor_framework::ActorEntity;
use async_trait::async_trait;

#[async_trait]
impl ActorEntity for Artisan {
    type Id = String;
    type Create = ArtisanCreate;
    type Update = ArtisanUpdate;
    type Action = ();
    type ActionResult = ();
    type Context = ();
    type Error = ArtisanError;

    fn from_create_params(id: String, params: ArtisanCreate) -> Result<Self, ArtisanError> {
        if params.name.trim().is_empty() {
            return Err(ArtisanError::ValidationError("name is required".into()));
        }
        if !params.email.contains('@') {
            return Err(ArtisanError::ValidationError(format!(
                "invalid email '{}'",
                params.email
            )));
        }
        Ok(Self {
            artisan_ref: id,
            name: params.name,
            email: params.email,
            phone: params.phone,
            address: params.address,
        })
    }

    async fn on_update(&mut self, update: ArtisanUpdate, _ctx: &()) -> Result<(), ArtisanError> {
        if let Some(email) = update.email {
            if !email.contains('@') {
                return Err(ArtisanError::ValidationError(format!("invalid email '{email}'")));
            }
            self.email = email;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(address) = update.address {
            self.address = address;
        }
        Ok(())
    }

    async fn handle_action(&mut self, _action: (), _ctx: &()) -> Result<(), ArtisanError> {
        Ok(())
    }
}
