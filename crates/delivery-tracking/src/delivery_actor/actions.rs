//! Custom actions for the Delivery actor.
//!
//! Every mutation of a [`DeliveryRecord`](crate::model::DeliveryRecord) after creation is one
//! of these actions. The actor applies them one at a time, so a status append can never
//! interleave with another write to the same record.

use crate::model::{
    AttemptReport, DeliveryIssue, EventOrigin, IssueReport, IssueStatus, StatusChange, StatusEvent,
};

#[derive(Debug, Clone)]
pub enum DeliveryAction {
    /// Appends a timeline event, subject to the transition policy.
    AppendStatus {
        event: StatusEvent,
        origin: EventOrigin,
    },
    /// Records a delivery attempt and, for delivered or failed outcomes, the status event.
    RecordAttempt(AttemptReport),
    ReportIssue(IssueReport),
    AdvanceIssue {
        issue_id: String,
        status: IssueStatus,
        resolution: Option<String>,
    },
    /// Rating is validated by the service before the action is sent.
    SubmitFeedback {
        rating: u8,
        comment: Option<String>,
    },
    /// Sets `delay_notification_sent` if the record is delayed and has not been alerted yet.
    ClaimDelayNotification,
    RecordNotificationSent,
    Deactivate,
}

/// Results from DeliveryActions - variants match 1:1 with DeliveryAction
#[derive(Debug, Clone)]
pub enum DeliveryActionResult {
    /// `None` when a courier event was older than the timeline and dropped.
    AppendStatus(Option<StatusChange>),
    RecordAttempt {
        attempt_number: u32,
        change: Option<StatusChange>,
    },
    ReportIssue(DeliveryIssue),
    AdvanceIssue(DeliveryIssue),
    SubmitFeedback(()),
    /// True when the caller won the claim and must send the alert.
    ClaimDelayNotification(bool),
    RecordNotificationSent(()),
    /// False if the record was already inactive.
    Deactivate(bool),
}
