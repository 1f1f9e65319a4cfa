//! The delivery record and the rules for growing its timeline.
//!
//! A [`DeliveryRecord`] is never edited field by field. Every change goes through one of the
//! mutators below (called from the delivery actor), so the derived state stays consistent:
//!
//! - the current status is the status of the last timeline event;
//! - `actual_delivery` is set exactly when the current status is `delivered`;
//! - the timeline only grows, in timestamp order.

use crate::courier::CourierName;
use crate::error::DeliveryError;
use crate::model::{
    Address, DeliveryIssue, DeliveryStatus, IssueReport, IssueStatus, TrackingNumber,
    TransitionPolicy, UpdatedBy,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// One entry in the status timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub status: DeliveryStatus,
    pub timestamp: DateTime<Utc>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub updated_by: UpdatedBy,
}

impl StatusEvent {
    pub fn new(status: DeliveryStatus, timestamp: DateTime<Utc>, updated_by: UpdatedBy) -> Self {
        Self {
            status,
            timestamp,
            location: None,
            description: None,
            updated_by,
        }
    }

    pub fn at_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Where an event came from. Decides how out-of-order timestamps are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    /// Submitted by a person or the system; stamped no earlier than the latest event.
    Manual,
    /// Pulled from a courier; dropped unless strictly newer than the latest event.
    Courier,
}

/// Status change produced by appending an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: DeliveryStatus,
    pub to: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierInfo {
    pub name: CourierName,
    pub display_name: String,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub tracking_url_template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenderInfo {
    pub artisan_ref: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pickup_address: Address,
    pub pickup_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Address,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDetails {
    pub weight_kg: f64,
    pub dimensions: Option<Dimensions>,
    pub declared_value: f64,
    pub is_fragile: bool,
    pub requires_signature: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Delivered,
    Failed { reason: String },
    Rescheduled { next_attempt: DateTime<Utc> },
}

impl AttemptOutcome {
    /// Status the delivery moves to when this outcome is recorded, if any.
    pub fn implied_status(&self) -> Option<DeliveryStatus> {
        match self {
            AttemptOutcome::Delivered => Some(DeliveryStatus::Delivered),
            AttemptOutcome::Failed { .. } => Some(DeliveryStatus::FailedDelivery),
            AttemptOutcome::Rescheduled { .. } => None,
        }
    }
}

/// Caller-supplied description of a delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    pub outcome: AttemptOutcome,
    pub location: Option<String>,
    pub signature: Option<String>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub updated_by: UpdatedBy,
}

impl AttemptReport {
    pub fn new(outcome: AttemptOutcome, updated_by: UpdatedBy) -> Self {
        Self {
            outcome,
            location: None,
            signature: None,
            photo_url: None,
            notes: None,
            updated_by,
        }
    }

    pub fn at_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub attempt_number: u32,
    pub attempted_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    pub signature: Option<String>,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: u8,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationState {
    pub last_sent: Option<DateTime<Utc>>,
    /// Once true, never reset.
    pub delay_notification_sent: bool,
}

/// Payload for creating a delivery. Assembled by the service from the order, the artisan
/// and the caller's shipping data.
#[derive(Debug, Clone)]
pub struct DeliveryCreate {
    pub order_ref: String,
    pub courier: CourierInfo,
    pub sender: SenderInfo,
    pub recipient: Recipient,
    pub package: PackageDetails,
    pub estimated_delivery: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Full state of one shipment.
///
/// Deserializing goes through [`DeliveryRecordRepr`] and rejects documents that break the
/// timeline rules above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DeliveryRecordRepr")]
pub struct DeliveryRecord {
    tracking_number: TrackingNumber,
    pub order_ref: String,
    pub courier: CourierInfo,
    pub sender: SenderInfo,
    pub recipient: Recipient,
    pub package: PackageDetails,
    timeline: Vec<StatusEvent>,
    pub estimated_delivery: DateTime<Utc>,
    actual_delivery: Option<DateTime<Utc>>,
    pub attempts: Vec<DeliveryAttempt>,
    pub issues: Vec<DeliveryIssue>,
    feedback: Option<Feedback>,
    pub notifications: NotificationState,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

static UNRECORDED: StatusEvent = StatusEvent {
    status: DeliveryStatus::LabelCreated,
    timestamp: DateTime::<Utc>::MIN_UTC,
    location: None,
    description: None,
    updated_by: UpdatedBy::System,
};

/// Wire form of [`DeliveryRecord`], checked before it becomes one.
#[derive(Deserialize)]
struct DeliveryRecordRepr {
    tracking_number: TrackingNumber,
    order_ref: String,
    courier: CourierInfo,
    sender: SenderInfo,
    recipient: Recipient,
    package: PackageDetails,
    timeline: Vec<StatusEvent>,
    estimated_delivery: DateTime<Utc>,
    actual_delivery: Option<DateTime<Utc>>,
    attempts: Vec<DeliveryAttempt>,
    issues: Vec<DeliveryIssue>,
    feedback: Option<Feedback>,
    notifications: NotificationState,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DeliveryRecordRepr> for DeliveryRecord {
    type Error = DeliveryError;

    fn try_from(repr: DeliveryRecordRepr) -> Result<Self, Self::Error> {
        let tn = &repr.tracking_number;
        let Some(latest) = repr.timeline.last() else {
            return Err(DeliveryError::validation(format!("delivery {tn} has an empty timeline")));
        };
        if repr
            .timeline
            .windows(2)
            .any(|w| w[1].timestamp < w[0].timestamp)
        {
            return Err(DeliveryError::validation(format!(
                "delivery {tn} has an unordered timeline"
            )));
        }
        if repr.actual_delivery.is_some() != (latest.status == DeliveryStatus::Delivered) {
            return Err(DeliveryError::validation(format!(
                "delivery {tn} has actual_delivery inconsistent with status {}",
                latest.status
            )));
        }
        Ok(Self {
            tracking_number: repr.tracking_number,
            order_ref: repr.order_ref,
            courier: repr.courier,
            sender: repr.sender,
            recipient: repr.recipient,
            package: repr.package,
            timeline: repr.timeline,
            estimated_delivery: repr.estimated_delivery,
            actual_delivery: repr.actual_delivery,
            attempts: repr.attempts,
            issues: repr.issues,
            feedback: repr.feedback,
            notifications: repr.notifications,
            is_active: repr.is_active,
            created_at: repr.created_at,
            updated_at: repr.updated_at,
        })
    }
}

impl DeliveryRecord {
    /// Builds a record whose timeline starts with a single `label_created` event.
    pub fn new(tracking_number: TrackingNumber, params: DeliveryCreate) -> Self {
        let initial = StatusEvent::new(
            DeliveryStatus::LabelCreated,
            params.created_at,
            UpdatedBy::System,
        )
        .described(format!("Shipping label created with {}", params.courier.display_name));
        Self {
            tracking_number,
            order_ref: params.order_ref,
            courier: params.courier,
            sender: params.sender,
            recipient: params.recipient,
            package: params.package,
            timeline: vec![initial],
            estimated_delivery: params.estimated_delivery,
            actual_delivery: None,
            attempts: Vec::new(),
            issues: Vec::new(),
            feedback: None,
            notifications: NotificationState::default(),
            is_active: true,
            created_at: params.created_at,
            updated_at: params.created_at,
        }
    }

    /// Assigned at creation and never changed.
    pub fn tracking_number(&self) -> &TrackingNumber {
        &self.tracking_number
    }

    pub fn timeline(&self) -> &[StatusEvent] {
        &self.timeline
    }

    /// Timeline sorted newest first, for display.
    pub fn timeline_newest_first(&self) -> Vec<StatusEvent> {
        self.timeline.iter().rev().cloned().collect()
    }

    pub fn latest_event(&self) -> &StatusEvent {
        // Both constructors guarantee a non-empty timeline and nothing removes from it.
        self.timeline.last().unwrap_or(&UNRECORDED)
    }

    pub fn current_status(&self) -> DeliveryStatus {
        self.latest_event().status
    }

    pub fn actual_delivery(&self) -> Option<DateTime<Utc>> {
        self.actual_delivery
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn progress_percentage(&self) -> u8 {
        self.current_status().progress_percentage()
    }

    pub fn is_terminal(&self) -> bool {
        self.current_status().is_terminal()
    }

    /// Past its estimate and neither delivered nor cancelled.
    pub fn is_delayed(&self, now: DateTime<Utc>) -> bool {
        self.estimated_delivery < now && self.current_status().can_be_delayed()
    }

    /// No event recorded within `window`.
    pub fn is_stale(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        now - self.latest_event().timestamp >= window
    }

    /// Eligible for the reconciliation sweep.
    pub fn needs_reconciliation(&self) -> bool {
        self.is_active && !self.is_terminal()
    }

    pub fn tracking_url(&self) -> String {
        self.courier
            .tracking_url_template
            .replace("{trackingNumber}", self.tracking_number.as_str())
    }

    /// Appends `event` to the timeline.
    ///
    /// Returns `Ok(None)` when a courier event is not newer than the latest event and is
    /// dropped. Manual events are stamped no earlier than the latest event so the timeline
    /// stays ordered.
    pub fn append_event(
        &mut self,
        mut event: StatusEvent,
        origin: EventOrigin,
        policy: TransitionPolicy,
    ) -> Result<Option<StatusChange>, DeliveryError> {
        let latest = self.latest_event();
        match origin {
            EventOrigin::Courier if event.timestamp <= latest.timestamp => return Ok(None),
            EventOrigin::Courier => {}
            EventOrigin::Manual => event.timestamp = event.timestamp.max(latest.timestamp),
        }

        let from = latest.status;
        let to = event.status;
        policy.check(from, to)?;

        if to == DeliveryStatus::Delivered {
            if from != DeliveryStatus::Delivered {
                self.actual_delivery = Some(event.timestamp);
            }
        } else {
            self.actual_delivery = None;
        }
        self.updated_at = self.updated_at.max(event.timestamp);
        self.timeline.push(event);
        Ok(Some(StatusChange { from, to }))
    }

    /// Records an attempt and, for delivered or failed outcomes, the matching status event.
    pub fn record_attempt(
        &mut self,
        report: AttemptReport,
        at: DateTime<Utc>,
        policy: TransitionPolicy,
    ) -> Result<(u32, Option<StatusChange>), DeliveryError> {
        let attempt_number = self.attempts.len() as u32 + 1;
        let change = match report.outcome.implied_status() {
            Some(status) => {
                let mut event = StatusEvent::new(status, at, report.updated_by);
                event.location = report.location.clone();
                event.description = Some(match &report.outcome {
                    AttemptOutcome::Failed { reason } => {
                        format!("Delivery attempt {attempt_number} failed: {reason}")
                    }
                    _ => format!("Delivered on attempt {attempt_number}"),
                });
                self.append_event(event, EventOrigin::Manual, policy)?
            }
            None => None,
        };
        self.attempts.push(DeliveryAttempt {
            attempt_number,
            attempted_at: at,
            outcome: report.outcome,
            signature: report.signature,
            photo_url: report.photo_url,
            notes: report.notes,
        });
        self.updated_at = self.updated_at.max(at);
        Ok((attempt_number, change))
    }

    /// Adds an issue and returns its id. Issues on terminal deliveries are accepted and flagged.
    pub fn report_issue(&mut self, report: IssueReport, at: DateTime<Utc>) -> DeliveryIssue {
        let raised_while = self.current_status();
        let issue = DeliveryIssue {
            id: format!("ISS-{:03}", self.issues.len() + 1),
            kind: report.kind,
            description: report.description,
            reported_by: report.reported_by,
            reported_at: at,
            status: IssueStatus::Open,
            raised_while,
            raised_on_terminal: raised_while.is_terminal(),
            resolution: None,
            resolved_at: None,
        };
        self.issues.push(issue.clone());
        self.updated_at = self.updated_at.max(at);
        issue
    }

    pub fn advance_issue(
        &mut self,
        issue_id: &str,
        status: IssueStatus,
        resolution: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<DeliveryIssue, DeliveryError> {
        let issue = self
            .issues
            .iter_mut()
            .find(|issue| issue.id == issue_id)
            .ok_or_else(|| DeliveryError::not_found("Issue", issue_id))?;
        issue.advance(status, resolution, at)?;
        let snapshot = issue.clone();
        self.updated_at = self.updated_at.max(at);
        Ok(snapshot)
    }

    /// Stores the customer's one-time feedback. The rating is validated by the caller.
    pub fn submit_feedback(
        &mut self,
        rating: u8,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), DeliveryError> {
        let status = self.current_status();
        if status != DeliveryStatus::Delivered {
            return Err(DeliveryError::conflict(format!(
                "feedback requires a delivered shipment; {} is {status}",
                self.tracking_number
            )));
        }
        if self.feedback.is_some() {
            return Err(DeliveryError::conflict(format!(
                "feedback already submitted for {}",
                self.tracking_number
            )));
        }
        self.feedback = Some(Feedback {
            rating,
            comment,
            submitted_at: at,
        });
        self.updated_at = self.updated_at.max(at);
        Ok(())
    }

    /// Sets the delay flag if an alert is due. Returns true when the caller should send it.
    pub fn claim_delay_notification(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_active || self.notifications.delay_notification_sent || !self.is_delayed(now) {
            return false;
        }
        self.notifications.delay_notification_sent = true;
        true
    }

    pub fn record_notification_sent(&mut self, at: DateTime<Utc>) {
        self.notifications.last_sent = Some(at);
    }

    /// Returns false if the record was already inactive.
    pub fn deactivate(&mut self, at: DateTime<Utc>) -> bool {
        let was_active = std::mem::replace(&mut self.is_active, false);
        if was_active {
            self.updated_at = self.updated_at.max(at);
        }
        was_active
    }
}
