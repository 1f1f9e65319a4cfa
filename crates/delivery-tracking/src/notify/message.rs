use crate::model::{DeliveryStatus, IssueKind, IssueStatus, TrackingNumber};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Customer email and recipient phone.
    Customer,
    /// The sending artisan's email.
    Artisan,
}

/// Every message the delivery service sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Shipped {
        tracking_number: TrackingNumber,
        customer_name: String,
        courier: String,
        tracking_url: String,
        estimated_delivery: DateTime<Utc>,
    },
    StatusChanged {
        tracking_number: TrackingNumber,
        status: DeliveryStatus,
        location: Option<String>,
        tracking_url: String,
    },
    Delivered {
        tracking_number: TrackingNumber,
        delivered_at: DateTime<Utc>,
    },
    DeliveryFailed {
        tracking_number: TrackingNumber,
        reason: Option<String>,
        tracking_url: String,
    },
    Delayed {
        tracking_number: TrackingNumber,
        status: DeliveryStatus,
        estimated_delivery: DateTime<Utc>,
        tracking_url: String,
    },
    IssueReported {
        tracking_number: TrackingNumber,
        issue_id: String,
        kind: IssueKind,
        description: String,
    },
    IssueUpdated {
        tracking_number: TrackingNumber,
        issue_id: String,
        status: IssueStatus,
        resolution: Option<String>,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Shipped { .. } => "shipped",
            Notification::StatusChanged { .. } => "status_changed",
            Notification::Delivered { .. } => "delivered",
            Notification::DeliveryFailed { .. } => "delivery_failed",
            Notification::Delayed { .. } => "delayed",
            Notification::IssueReported { .. } => "issue_reported",
            Notification::IssueUpdated { .. } => "issue_updated",
        }
    }

    pub fn audience(&self) -> Audience {
        match self {
            Notification::IssueReported { .. } | Notification::IssueUpdated { .. } => Audience::Artisan,
            _ => Audience::Customer,
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Notification::Shipped { tracking_number, .. } => {
                format!("Your order has shipped ({tracking_number})")
            }
            Notification::StatusChanged { tracking_number, status, .. } => {
                format!("{}: {tracking_number}", status.label())
            }
            Notification::Delivered { tracking_number, .. } => {
                format!("Delivered: {tracking_number}")
            }
            Notification::DeliveryFailed { tracking_number, .. } => {
                format!("Delivery attempt failed: {tracking_number}")
            }
            Notification::Delayed { tracking_number, .. } => {
                format!("Your delivery is running late ({tracking_number})")
            }
            Notification::IssueReported { tracking_number, issue_id, .. } => {
                format!("Issue {issue_id} reported on {tracking_number}")
            }
            Notification::IssueUpdated { tracking_number, issue_id, status, .. } => {
                format!("Issue {issue_id} on {tracking_number} is now {status}")
            }
        }
    }

    pub fn body_html(&self) -> String {
        let body = match self {
            Notification::Shipped {
                customer_name,
                courier,
                tracking_url,
                estimated_delivery,
                ..
            } => format!(
                "<p>Hi {},</p><p>Your order is on its way with {}. Expected by {}.</p>{}",
                escape(customer_name),
                escape(courier),
                estimated_delivery.format("%d %b %Y"),
                track_link(tracking_url)
            ),
            Notification::StatusChanged {
                status,
                location,
                tracking_url,
                ..
            } => format!(
                "<p>Status: <strong>{}</strong>{}</p>{}",
                status.label(),
                location
                    .as_deref()
                    .map(|l| format!(" at {}", escape(l)))
                    .unwrap_or_default(),
                track_link(tracking_url)
            ),
            Notification::Delivered { delivered_at, .. } => format!(
                "<p>Your package was delivered on {}. We would love your feedback.</p>",
                delivered_at.format("%d %b %Y %H:%M UTC")
            ),
            Notification::DeliveryFailed {
                reason,
                tracking_url,
                ..
            } => format!(
                "<p>The courier could not deliver your package{}. Another attempt will follow.</p>{}",
                reason
                    .as_deref()
                    .map(|r| format!(": {}", escape(r)))
                    .unwrap_or_default(),
                track_link(tracking_url)
            ),
            Notification::Delayed {
                status,
                estimated_delivery,
                tracking_url,
                ..
            } => format!(
                "<p>Your package was expected by {} and is still {}. We are following up with the courier.</p>{}",
                estimated_delivery.format("%d %b %Y"),
                status.label().to_lowercase(),
                track_link(tracking_url)
            ),
            Notification::IssueReported {
                issue_id,
                kind,
                description,
                ..
            } => format!(
                "<p>{} ({issue_id})</p><blockquote>{}</blockquote>",
                kind.label(),
                escape(description)
            ),
            Notification::IssueUpdated {
                issue_id,
                status,
                resolution,
                ..
            } => format!(
                "<p>Issue {issue_id} is now {status}.</p>{}",
                resolution
                    .as_deref()
                    .map(|r| format!("<p>Resolution: {}</p>", escape(r)))
                    .unwrap_or_default()
            ),
        };
        format!("<html><body>{body}</body></html>")
    }

    pub fn sms_text(&self) -> String {
        match self {
            Notification::Shipped { tracking_number, tracking_url, .. } => {
                format!("Your order has shipped. Track {tracking_number}: {tracking_url}")
            }
            Notification::StatusChanged { tracking_number, status, .. } => {
                format!("{tracking_number}: {}", status.label())
            }
            Notification::Delivered { tracking_number, .. } => {
                format!("{tracking_number} has been delivered.")
            }
            Notification::DeliveryFailed { tracking_number, .. } => {
                format!("Delivery attempt for {tracking_number} failed. We will retry.")
            }
            Notification::Delayed { tracking_number, .. } => {
                format!("{tracking_number} is running late. Sorry for the wait.")
            }
            other => other.subject(),
        }
    }
}

fn track_link(url: &str) -> String {
    format!("<p><a href=\"{0}\">{0}</a></p>", escape(url))
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_messages_go_to_the_artisan() {
        let tn = TrackingNumber::parse("AM00123456007").unwrap();
        let note = Notification::IssueReported {
            tracking_number: tn.clone(),
            issue_id: "ISS-001".into(),
            kind: IssueKind::Damaged,
            description: "Lid <cracked>".into(),
        };
        assert_eq!(note.audience(), Audience::Artisan);
        assert_eq!(note.subject(), "Issue ISS-001 reported on AM00123456007");
        assert!(note.body_html().contains("Lid &lt;cracked&gt;"));

        let delivered = Notification::Delivered {
            tracking_number: tn,
            delivered_at: Utc::now(),
        };
        assert_eq!(delivered.audience(), Audience::Customer);
        assert_eq!(delivered.kind(), "delivered");
    }
}
