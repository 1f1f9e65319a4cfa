//! Error types for the Artisan actor.

use actor_framework::FrameworkError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ArtisanError {
    #[error("Artisan not found: {0}")]
    NotFound(String),

    #[error("Artisan validation error: {0}")]
    ValidationError(String),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for ArtisanError {
    fn from(e: FrameworkError) -> Self {
        match e.into_entity_error::<ArtisanError>() {
            Ok(domain) => domain,
            Err(FrameworkError::NotFound(id)) => ArtisanError::NotFound(id),
            Err(other) => ArtisanError::ActorCommunicationError(other.to_string()),
        }
    }
}
