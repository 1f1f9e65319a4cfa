use super::{CourierAdapter, CourierError};
use crate::model::{DeliveryStatus, StatusEvent, TrackingNumber, UpdatedBy};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;

/// Stand-in for carriers without a configured API: every fetch reports the shipment as
/// in transit at the current time.
pub struct SyntheticCourierAdapter {
    clock: Arc<dyn Clock>,
}

impl SyntheticCourierAdapter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl CourierAdapter for SyntheticCourierAdapter {
    async fn fetch_updates(
        &self,
        _tracking_number: &TrackingNumber,
    ) -> Result<Vec<StatusEvent>, CourierError> {
        Ok(vec![StatusEvent::new(
            DeliveryStatus::InTransit,
            self.clock.utc(),
            UpdatedBy::Courier,
        )
        .described("Package in transit")])
    }
}
