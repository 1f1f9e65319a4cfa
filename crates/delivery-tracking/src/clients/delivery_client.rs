//! # Delivery Client
//!
//! Typed wrapper over `ResourceClient<DeliveryRecord>`. Each method sends one action and
//! returns its result together with the record as the actor left it, so callers never need a
//! second read to see the effect of their own write.
use crate::delivery_actor::{DeliveryAction, DeliveryActionResult};
use crate::error::DeliveryError;
use crate::model::{
    AttemptReport, DeliveryCreate, DeliveryIssue, DeliveryRecord, EventOrigin, IssueReport,
    IssueStatus, StatusChange, StatusEvent, TrackingNumber,
};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Delivery actor.
#[derive(Clone)]
pub struct DeliveryClient {
    inner: ResourceClient<DeliveryRecord>,
}

impl DeliveryClient {
    pub fn new(inner: ResourceClient<DeliveryRecord>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, params), fields(order_ref = %params.order_ref))]
    pub async fn create(&self, params: DeliveryCreate) -> Result<TrackingNumber, DeliveryError> {
        debug!("Sending create");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    /// Fetches a record, treating absence as [`DeliveryError::NotFound`].
    pub async fn fetch(&self, tracking_number: &TrackingNumber) -> Result<DeliveryRecord, DeliveryError> {
        self.get(tracking_number.clone())
            .await?
            .ok_or_else(|| DeliveryError::not_found("Delivery", tracking_number))
    }

    async fn act(
        &self,
        tracking_number: &TrackingNumber,
        action: DeliveryAction,
    ) -> Result<(DeliveryActionResult, DeliveryRecord), DeliveryError> {
        self.inner
            .perform_action(tracking_number.clone(), action)
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self, event), fields(status = %event.status))]
    pub async fn append_status(
        &self,
        tracking_number: &TrackingNumber,
        event: StatusEvent,
        origin: EventOrigin,
    ) -> Result<(Option<StatusChange>, DeliveryRecord), DeliveryError> {
        match self
            .act(tracking_number, DeliveryAction::AppendStatus { event, origin })
            .await?
        {
            (DeliveryActionResult::AppendStatus(change), record) => Ok((change, record)),
            _ => unreachable!("AppendStatus action must return AppendStatus result"),
        }
    }

    #[instrument(skip(self, report))]
    pub async fn record_attempt(
        &self,
        tracking_number: &TrackingNumber,
        report: AttemptReport,
    ) -> Result<(u32, Option<StatusChange>, DeliveryRecord), DeliveryError> {
        match self
            .act(tracking_number, DeliveryAction::RecordAttempt(report))
            .await?
        {
            (
                DeliveryActionResult::RecordAttempt {
                    attempt_number,
                    change,
                },
                record,
            ) => Ok((attempt_number, change, record)),
            _ => unreachable!("RecordAttempt action must return RecordAttempt result"),
        }
    }

    #[instrument(skip(self, report))]
    pub async fn report_issue(
        &self,
        tracking_number: &TrackingNumber,
        report: IssueReport,
    ) -> Result<(DeliveryIssue, DeliveryRecord), DeliveryError> {
        match self
            .act(tracking_number, DeliveryAction::ReportIssue(report))
            .await?
        {
            (DeliveryActionResult::ReportIssue(issue), record) => Ok((issue, record)),
            _ => unreachable!("ReportIssue action must return ReportIssue result"),
        }
    }

    #[instrument(skip(self, resolution))]
    pub async fn advance_issue(
        &self,
        tracking_number: &TrackingNumber,
        issue_id: String,
        status: IssueStatus,
        resolution: Option<String>,
    ) -> Result<(DeliveryIssue, DeliveryRecord), DeliveryError> {
        let action = DeliveryAction::AdvanceIssue {
            issue_id,
            status,
            resolution,
        };
        match self.act(tracking_number, action).await? {
            (DeliveryActionResult::AdvanceIssue(issue), record) => Ok((issue, record)),
            _ => unreachable!("AdvanceIssue action must return AdvanceIssue result"),
        }
    }

    #[instrument(skip(self, comment))]
    pub async fn submit_feedback(
        &self,
        tracking_number: &TrackingNumber,
        rating: u8,
        comment: Option<String>,
    ) -> Result<DeliveryRecord, DeliveryError> {
        match self
            .act(tracking_number, DeliveryAction::SubmitFeedback { rating, comment })
            .await?
        {
            (DeliveryActionResult::SubmitFeedback(()), record) => Ok(record),
            _ => unreachable!("SubmitFeedback action must return SubmitFeedback result"),
        }
    }

    /// Returns true when this caller claimed the delay alert and must send it.
    #[instrument(skip(self))]
    pub async fn claim_delay_notification(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<(bool, DeliveryRecord), DeliveryError> {
        match self
            .act(tracking_number, DeliveryAction::ClaimDelayNotification)
            .await?
        {
            (DeliveryActionResult::ClaimDelayNotification(claimed), record) => Ok((claimed, record)),
            _ => unreachable!("ClaimDelayNotification action must return ClaimDelayNotification result"),
        }
    }

    pub async fn record_notification_sent(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<(), DeliveryError> {
        match self
            .act(tracking_number, DeliveryAction::RecordNotificationSent)
            .await?
        {
            (DeliveryActionResult::RecordNotificationSent(()), _) => Ok(()),
            _ => unreachable!("RecordNotificationSent action must return RecordNotificationSent result"),
        }
    }

    #[instrument(skip(self))]
    pub async fn deactivate(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<(bool, DeliveryRecord), DeliveryError> {
        match self.act(tracking_number, DeliveryAction::Deactivate).await? {
            (DeliveryActionResult::Deactivate(was_active), record) => Ok((was_active, record)),
            _ => unreachable!("Deactivate action must return Deactivate result"),
        }
    }
}

#[async_trait]
impl ActorClient<DeliveryRecord> for DeliveryClient {
    type Error = DeliveryError;

    fn inner(&self) -> &ResourceClient<DeliveryRecord> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        DeliveryError::from_store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::delivery::tests::sample_record;
    use crate::model::DeliveryStatus;
    use actor_framework::mock::{create_mock_client, expect_action, MockClient};

    #[tokio::test]
    async fn append_status_forwards_event_and_origin() {
        let (client, mut receiver) = create_mock_client::<DeliveryRecord>(10);
        let delivery_client = DeliveryClient::new(client);
        let record = sample_record();
        let tn = record.tracking_number().clone();
        let event = StatusEvent::new(
            DeliveryStatus::InTransit,
            record.created_at,
            crate::model::UpdatedBy::Courier,
        );

        let task = {
            let tn = tn.clone();
            tokio::spawn(async move {
                delivery_client
                    .append_status(&tn, event, EventOrigin::Courier)
                    .await
            })
        };

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, tn);
        assert!(matches!(
            action,
            DeliveryAction::AppendStatus {
                origin: EventOrigin::Courier,
                ..
            }
        ));
        responder
            .send(Ok((DeliveryActionResult::AppendStatus(None), record)))
            .unwrap();

        let (change, _) = task.await.unwrap().unwrap();
        assert_eq!(change, None);
    }

    #[tokio::test]
    async fn store_failures_surface_as_store_errors() {
        let mut mock = MockClient::<DeliveryRecord>::new();
        mock.expect_get().return_ok(None);
        mock.expect_action().return_err(FrameworkError::ActorClosed);
        mock.expect_action().return_err(FrameworkError::EntityError(Box::new(
            DeliveryError::conflict("feedback already submitted"),
        )));

        let client = DeliveryClient::new(mock.client());
        let tn = TrackingNumber::parse("AM00123456007").unwrap();
        assert!(matches!(
            client.fetch(&tn).await,
            Err(DeliveryError::NotFound { entity: "Delivery", .. })
        ));
        assert!(matches!(
            client.deactivate(&tn).await,
            Err(DeliveryError::Store(_))
        ));
        assert_eq!(
            client.submit_feedback(&tn, 5, None).await.unwrap_err(),
            DeliveryError::conflict("feedback already submitted")
        );
        mock.verify();
    }
}
