//! [`ActorEntity`] implementation for [`DeliveryRecord`].
//!
//! Hooks only touch the record. Anything that talks to the outside world (couriers,
//! notifications, the order store) happens in the service, after the actor has replied.

use super::actions::{DeliveryAction, DeliveryActionResult};
use crate::error::DeliveryError;
use crate::model::{DeliveryCreate, DeliveryRecord, TrackingNumber, TransitionPolicy};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;

/// Injected into the delivery actor at `run`.
#[derive(Clone)]
pub struct DeliveryContext {
    pub policy: TransitionPolicy,
    pub clock: Arc<dyn Clock>,
}

#[async_trait]
impl ActorEntity for DeliveryRecord {
    type Id = TrackingNumber;
    type Create = DeliveryCreate;
    type Update = ();
    type Action = DeliveryAction;
    type ActionResult = DeliveryActionResult;
    type Context = DeliveryContext;
    type Error = DeliveryError;

    fn from_create_params(id: TrackingNumber, params: DeliveryCreate) -> Result<Self, DeliveryError> {
        if params.order_ref.trim().is_empty() {
            return Err(DeliveryError::validation("order reference is required"));
        }
        Ok(DeliveryRecord::new(id, params))
    }

    /// One delivery per order.
    fn unique_key(&self) -> Option<String> {
        Some(self.order_ref.clone())
    }

    /// Records are only changed through actions.
    async fn on_update(&mut self, _update: (), _ctx: &DeliveryContext) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: DeliveryAction,
        ctx: &DeliveryContext,
    ) -> Result<DeliveryActionResult, DeliveryError> {
        let now = ctx.clock.utc();
        match action {
            DeliveryAction::AppendStatus { event, origin } => {
                self.ensure_active()?;
                let change = self.append_event(event, origin, ctx.policy)?;
                Ok(DeliveryActionResult::AppendStatus(change))
            }
            DeliveryAction::RecordAttempt(report) => {
                self.ensure_active()?;
                let (attempt_number, change) = self.record_attempt(report, now, ctx.policy)?;
                Ok(DeliveryActionResult::RecordAttempt {
                    attempt_number,
                    change,
                })
            }
            DeliveryAction::ReportIssue(report) => {
                Ok(DeliveryActionResult::ReportIssue(self.report_issue(report, now)))
            }
            DeliveryAction::AdvanceIssue {
                issue_id,
                status,
                resolution,
            } => {
                let issue = self.advance_issue(&issue_id, status, resolution, now)?;
                Ok(DeliveryActionResult::AdvanceIssue(issue))
            }
            DeliveryAction::SubmitFeedback { rating, comment } => {
                self.submit_feedback(rating, comment, now)?;
                Ok(DeliveryActionResult::SubmitFeedback(()))
            }
            DeliveryAction::ClaimDelayNotification => Ok(
                DeliveryActionResult::ClaimDelayNotification(self.claim_delay_notification(now)),
            ),
            DeliveryAction::RecordNotificationSent => {
                self.record_notification_sent(now);
                Ok(DeliveryActionResult::RecordNotificationSent(()))
            }
            DeliveryAction::Deactivate => Ok(DeliveryActionResult::Deactivate(self.deactivate(now))),
        }
    }
}

impl DeliveryRecord {
    fn ensure_active(&self) -> Result<(), DeliveryError> {
        if self.is_active {
            Ok(())
        } else {
            Err(DeliveryError::conflict(format!(
                "delivery {} has been deactivated",
                self.tracking_number()
            )))
        }
    }
}
