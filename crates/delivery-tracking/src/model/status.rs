//! Delivery status vocabulary and the transition table.

use crate::error::DeliveryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a shipment is in its journey. The current status of a delivery is always the status
/// of its latest timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    LabelCreated,
    PickupScheduled,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    FailedDelivery,
    ReturnedToSender,
    Cancelled,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 9] = [
        DeliveryStatus::LabelCreated,
        DeliveryStatus::PickupScheduled,
        DeliveryStatus::PickedUp,
        DeliveryStatus::InTransit,
        DeliveryStatus::OutForDelivery,
        DeliveryStatus::Delivered,
        DeliveryStatus::FailedDelivery,
        DeliveryStatus::ReturnedToSender,
        DeliveryStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::LabelCreated => "label_created",
            DeliveryStatus::PickupScheduled => "pickup_scheduled",
            DeliveryStatus::PickedUp => "picked_up",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::OutForDelivery => "out_for_delivery",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::FailedDelivery => "failed_delivery",
            DeliveryStatus::ReturnedToSender => "returned_to_sender",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }

    /// Human-readable label for messages.
    pub fn label(self) -> &'static str {
        match self {
            DeliveryStatus::LabelCreated => "Label created",
            DeliveryStatus::PickupScheduled => "Pickup scheduled",
            DeliveryStatus::PickedUp => "Picked up",
            DeliveryStatus::InTransit => "In transit",
            DeliveryStatus::OutForDelivery => "Out for delivery",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::FailedDelivery => "Delivery failed",
            DeliveryStatus::ReturnedToSender => "Returned to sender",
            DeliveryStatus::Cancelled => "Cancelled",
        }
    }

    /// Fixed progress table.
    ///
    /// Not monotonic along every path: a failed attempt shows less progress than
    /// `out_for_delivery`, and a return or cancellation drops to zero.
    pub fn progress_percentage(self) -> u8 {
        match self {
            DeliveryStatus::LabelCreated => 10,
            DeliveryStatus::PickupScheduled => 20,
            DeliveryStatus::PickedUp => 30,
            DeliveryStatus::InTransit => 60,
            DeliveryStatus::OutForDelivery => 80,
            DeliveryStatus::Delivered => 100,
            DeliveryStatus::FailedDelivery => 70,
            DeliveryStatus::ReturnedToSender | DeliveryStatus::Cancelled => 0,
        }
    }

    /// Terminal deliveries are never reconciled or alerted on again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeliveryStatus::Delivered | DeliveryStatus::Cancelled | DeliveryStatus::ReturnedToSender
        )
    }

    /// Statuses the customer hears about when they are reached.
    pub fn notifies_customer(self) -> bool {
        matches!(
            self,
            DeliveryStatus::PickedUp
                | DeliveryStatus::InTransit
                | DeliveryStatus::OutForDelivery
                | DeliveryStatus::Delivered
                | DeliveryStatus::FailedDelivery
        )
    }

    /// Statuses that can still run late. A delivered or cancelled shipment is never delayed.
    pub fn can_be_delayed(self) -> bool {
        !matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }

    /// Allowed successors under [`TransitionPolicy::Strict`].
    pub fn successors(self) -> &'static [DeliveryStatus] {
        use DeliveryStatus::*;
        match self {
            LabelCreated => &[PickupScheduled, PickedUp, InTransit, Cancelled],
            PickupScheduled => &[PickupScheduled, PickedUp, Cancelled],
            PickedUp => &[InTransit, OutForDelivery, ReturnedToSender, Cancelled],
            InTransit => &[InTransit, OutForDelivery, Delivered, FailedDelivery, ReturnedToSender],
            OutForDelivery => &[OutForDelivery, InTransit, Delivered, FailedDelivery],
            FailedDelivery => &[OutForDelivery, InTransit, Delivered, ReturnedToSender],
            Delivered | Cancelled | ReturnedToSender => &[],
        }
    }

    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        self.successors().contains(&next)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = DeliveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        DeliveryStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| DeliveryError::validation(format!("unknown delivery status '{s}'")))
    }
}

/// Who recorded a timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatedBy {
    System,
    Courier,
    Artisan,
    Customer,
}

/// How strictly new timeline statuses are checked against the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Only transitions in [`DeliveryStatus::successors`] are accepted.
    #[default]
    Strict,
    /// Any status may follow any other.
    Permissive,
}

impl TransitionPolicy {
    pub fn check(self, from: DeliveryStatus, to: DeliveryStatus) -> Result<(), DeliveryError> {
        if self == TransitionPolicy::Permissive {
            return Ok(());
        }
        if from.is_terminal() {
            return Err(DeliveryError::conflict(format!(
                "delivery is already {from}; cannot move to {to}"
            )));
        }
        if !from.can_transition_to(to) {
            return Err(DeliveryError::validation(format!(
                "illegal status transition {from} -> {to}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snake_case_and_labels() {
        assert_eq!("out_for_delivery".parse::<DeliveryStatus>().unwrap(), DeliveryStatus::OutForDelivery);
        assert_eq!("Returned to sender".parse::<DeliveryStatus>().unwrap(), DeliveryStatus::ReturnedToSender);
        assert!(matches!(
            "teleported".parse::<DeliveryStatus>(),
            Err(DeliveryError::Validation(_))
        ));
    }

    #[test]
    fn terminal_statuses_have_no_successors() {
        for status in DeliveryStatus::ALL {
            assert_eq!(status.is_terminal(), status.successors().is_empty(), "{status}");
        }
    }

    #[test]
    fn strict_policy_rejects_skips_and_terminal_moves() {
        let strict = TransitionPolicy::Strict;
        assert!(strict.check(DeliveryStatus::InTransit, DeliveryStatus::Delivered).is_ok());
        assert!(matches!(
            strict.check(DeliveryStatus::LabelCreated, DeliveryStatus::Delivered),
            Err(DeliveryError::Validation(_))
        ));
        assert!(matches!(
            strict.check(DeliveryStatus::Delivered, DeliveryStatus::InTransit),
            Err(DeliveryError::Conflict(_))
        ));
        assert!(TransitionPolicy::Permissive
            .check(DeliveryStatus::LabelCreated, DeliveryStatus::Delivered)
            .is_ok());
    }

    #[test]
    fn progress_drops_on_failure_paths() {
        assert!(DeliveryStatus::FailedDelivery.progress_percentage() < DeliveryStatus::OutForDelivery.progress_percentage());
        assert_eq!(DeliveryStatus::ReturnedToSender.progress_percentage(), 0);
    }
}
