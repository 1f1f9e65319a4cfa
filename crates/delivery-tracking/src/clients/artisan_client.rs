//! # Artisan Client
use crate::artisan_actor::ArtisanError;
use crate::model::{Artisan, ArtisanCreate, ArtisanUpdate};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Artisan actor.
#[derive(Clone)]
pub struct ArtisanClient {
    inner: ResourceClient<Artisan>,
}

impl ArtisanClient {
    pub fn new(inner: ResourceClient<Artisan>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, params))]
    pub async fn create_artisan(&self, params: ArtisanCreate) -> Result<String, ArtisanError> {
        debug!(name = %params.name, "Sending create_artisan");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    pub async fn fetch(&self, artisan_ref: &str) -> Result<Artisan, ArtisanError> {
        self.get(artisan_ref.to_string())
            .await?
            .ok_or_else(|| ArtisanError::NotFound(artisan_ref.to_string()))
    }

    #[instrument(skip(self, update))]
    pub async fn update_artisan(
        &self,
        artisan_ref: String,
        update: ArtisanUpdate,
    ) -> Result<Artisan, ArtisanError> {
        self.inner
            .update(artisan_ref, update)
            .await
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl ActorClient<Artisan> for ArtisanClient {
    type Error = ArtisanError;

    fn inner(&self) -> &ResourceClient<Artisan> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        ArtisanError::from(e)
    }
}
