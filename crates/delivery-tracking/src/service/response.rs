//! The uniform `{success, data | error}` shape handed to the routing layer.

use crate::error::{DeliveryError, ErrorKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: &DeliveryError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                kind: error.kind(),
                message: error.to_string(),
            }),
        }
    }
}

/// Folds a service result into an [`ApiResponse`].
///
/// Domain failures become `success: false` responses. Only [`DeliveryError::Store`] is passed
/// through as `Err`, for the caller to treat as an infrastructure fault.
pub fn respond<T>(result: Result<T, DeliveryError>) -> Result<ApiResponse<T>, DeliveryError> {
    match result {
        Ok(data) => Ok(ApiResponse::ok(data)),
        Err(e @ DeliveryError::Store(_)) => Err(e),
        Err(e) => Ok(ApiResponse::failure(&e)),
    }
}
