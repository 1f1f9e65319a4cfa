//! Problems reported against a delivery.

use crate::error::DeliveryError;
use crate::model::{DeliveryStatus, UpdatedBy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Damaged,
    Lost,
    Delayed,
    WrongAddress,
    NotReceived,
    Other,
}

impl IssueKind {
    pub fn label(self) -> &'static str {
        match self {
            IssueKind::Damaged => "Package damaged",
            IssueKind::Lost => "Package lost",
            IssueKind::Delayed => "Delivery delayed",
            IssueKind::WrongAddress => "Wrong address",
            IssueKind::NotReceived => "Package not received",
            IssueKind::Other => "Other issue",
        }
    }
}

/// Issue lifecycle. Issues only move forward: open, investigating, resolved, closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    Investigating,
    Resolved,
    Closed,
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssueStatus::Open => "open",
            IssueStatus::Investigating => "investigating",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Closed => "closed",
        })
    }
}

/// Caller-supplied description of a new issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueReport {
    pub kind: IssueKind,
    pub description: String,
    pub reported_by: UpdatedBy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryIssue {
    pub id: String,
    pub kind: IssueKind,
    pub description: String,
    pub reported_by: UpdatedBy,
    pub reported_at: DateTime<Utc>,
    pub status: IssueStatus,
    /// Delivery status when the issue was raised.
    pub raised_while: DeliveryStatus,
    /// Set when the delivery was already terminal at report time.
    pub raised_on_terminal: bool,
    pub resolution: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl DeliveryIssue {
    /// Moves the issue to `next`, which must be strictly later in the lifecycle.
    pub fn advance(
        &mut self,
        next: IssueStatus,
        resolution: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), DeliveryError> {
        if next <= self.status {
            return Err(DeliveryError::validation(format!(
                "issue {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        if resolution.is_some() {
            self.resolution = resolution;
        }
        if next >= IssueStatus::Resolved && self.resolved_at.is_none() {
            self.resolved_at = Some(at);
        }
        Ok(())
    }
}
