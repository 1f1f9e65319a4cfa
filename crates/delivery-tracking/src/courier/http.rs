//! Reqwest-backed carrier tracking adapter.
//!
//! Owns transport details only: the request, timeout and HTTP error mapping, and decoding the
//! carrier's scan list into timeline events.

use super::{CourierAdapter, CourierError};
use crate::model::{DeliveryStatus, StatusEvent, TrackingNumber, UpdatedBy};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One scan as carriers report it.
#[derive(Debug, Deserialize)]
struct ScanDto {
    status: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Adapter that GETs `{endpoint}/{trackingNumber}` and expects a JSON array of scans.
pub struct HttpCourierAdapter {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpCourierAdapter {
    /// Builds an adapter with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn scan_url(&self, tracking_number: &TrackingNumber) -> Result<Url, CourierError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| CourierError::transport(format!("endpoint {} cannot be a base", self.endpoint)))?
            .pop_if_empty()
            .push(tracking_number.as_str());
        Ok(url)
    }
}

#[async_trait]
impl CourierAdapter for HttpCourierAdapter {
    async fn fetch_updates(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Vec<StatusEvent>, CourierError> {
        let url = self.scan_url(tracking_number)?;
        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_scans(body.as_ref())
    }
}

fn parse_scans(body: &[u8]) -> Result<Vec<StatusEvent>, CourierError> {
    let scans: Vec<ScanDto> = serde_json::from_slice(body)
        .map_err(|error| CourierError::decode(format!("invalid scan payload: {error}")))?;
    let mut events: Vec<StatusEvent> = scans
        .into_iter()
        .filter_map(|scan| {
            let Some(status) = map_carrier_status(&scan.status) else {
                debug!(carrier_status = %scan.status, "Dropping unmapped carrier status");
                return None;
            };
            Some(StatusEvent {
                status,
                timestamp: scan.timestamp,
                location: scan.location,
                description: scan.description,
                updated_by: UpdatedBy::Courier,
            })
        })
        .collect();
    events.sort_by_key(|event| event.timestamp);
    Ok(events)
}

/// Maps a carrier's status vocabulary onto ours. Unknown strings yield `None`.
fn map_carrier_status(raw: &str) -> Option<DeliveryStatus> {
    if let Ok(status) = raw.parse::<DeliveryStatus>() {
        return Some(status);
    }
    let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    let status = match normalized.as_str() {
        "manifested" | "booked" | "shipment_created" => DeliveryStatus::LabelCreated,
        "pickup_pending" | "pickup_requested" => DeliveryStatus::PickupScheduled,
        "picked" | "collected" => DeliveryStatus::PickedUp,
        "dispatched" | "shipped" | "in_scan" | "reached_hub" | "transit" => DeliveryStatus::InTransit,
        "ofd" | "dispatched_for_delivery" => DeliveryStatus::OutForDelivery,
        "pod" | "completed" => DeliveryStatus::Delivered,
        "undelivered" | "delivery_attempted" | "ndr" => DeliveryStatus::FailedDelivery,
        "rto" | "rto_delivered" | "returned" => DeliveryStatus::ReturnedToSender,
        "canceled" => DeliveryStatus::Cancelled,
        _ => return None,
    };
    Some(status)
}

fn map_transport_error(error: reqwest::Error) -> CourierError {
    if error.is_timeout() {
        CourierError::timeout(error.to_string())
    } else {
        CourierError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CourierError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => CourierError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => CourierError::timeout(message),
        _ => CourierError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 120;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
