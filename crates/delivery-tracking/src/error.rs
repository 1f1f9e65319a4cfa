//! Error taxonomy for the delivery subsystem.
//!
//! [`DeliveryError`] is both the error of the delivery actor's hooks and the error every
//! [`DeliveryService`](crate::service::DeliveryService) operation returns. Only
//! [`DeliveryError::Store`] represents infrastructure failure; see
//! [`respond`](crate::service::respond) for how the others are folded into an
//! [`ApiResponse`](crate::service::ApiResponse).

use crate::artisan_actor::ArtisanError;
use crate::order_actor::OrderError;
use actor_framework::FrameworkError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by delivery operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeliveryError {
    /// Unknown tracking number, delivery, order or artisan.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Missing or malformed input, unknown courier, illegal status transition.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The request is incompatible with the delivery's current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A courier or notification call failed.
    #[error("External service error ({service}): {message}")]
    ExternalService { service: String, message: String },

    /// The backing store could not serve the request.
    #[error("Store unavailable: {0}")]
    Store(String),
}

impl DeliveryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DeliveryError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DeliveryError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DeliveryError::Conflict(message.into())
    }

    pub fn external(service: impl Into<String>, message: impl ToString) -> Self {
        DeliveryError::ExternalService {
            service: service.into(),
            message: message.to_string(),
        }
    }

    /// Stable machine-readable kind, used in API responses.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeliveryError::NotFound { .. } => ErrorKind::NotFound,
            DeliveryError::Validation(_) => ErrorKind::Validation,
            DeliveryError::Conflict(_) => ErrorKind::Conflict,
            DeliveryError::ExternalService { .. } => ErrorKind::ExternalService,
            DeliveryError::Store(_) => ErrorKind::Store,
        }
    }

    /// Translates an actor error from the delivery store into the service taxonomy.
    pub(crate) fn from_store(e: FrameworkError) -> Self {
        match e.into_entity_error::<DeliveryError>() {
            Ok(domain) => domain,
            Err(FrameworkError::NotFound(id)) => DeliveryError::not_found("Delivery", id),
            Err(FrameworkError::DuplicateKey(order_ref)) => DeliveryError::conflict(format!(
                "order {order_ref} already has a delivery"
            )),
            Err(other) => DeliveryError::Store(other.to_string()),
        }
    }
}

impl From<OrderError> for DeliveryError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(id) => DeliveryError::not_found("Order", id),
            OrderError::ValidationError(message) => DeliveryError::Validation(message),
            OrderError::InvalidTransition(message) => DeliveryError::Conflict(message),
            OrderError::ActorCommunicationError(message) => DeliveryError::Store(message),
        }
    }
}

impl From<ArtisanError> for DeliveryError {
    fn from(e: ArtisanError) -> Self {
        match e {
            ArtisanError::NotFound(id) => DeliveryError::not_found("Artisan", id),
            ArtisanError::ValidationError(message) => DeliveryError::Validation(message),
            ArtisanError::ActorCommunicationError(message) => DeliveryError::Store(message),
        }
    }
}

/// Serialized error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    ExternalService,
    Store,
}
