//! # Delivery Service
//!
//! The only component that changes deliveries. Each operation reads collaborators (orders,
//! artisans, couriers) outside the actor, sends a single action to the delivery actor, and
//! then runs the side effects of that action: order write-backs and notifications.
//!
//! Side effects are best effort. Once the delivery actor has accepted a change, a failed
//! notification or order write-back is logged and the operation still succeeds.
//!
//! All operations return `Result<_, DeliveryError>`; [`respond`] turns that into the
//! `{success, data | error}` shape the routing layer expects.

mod create;
mod query;
mod response;

pub use create::ShippingData;
pub use query::{
    compute_stats, paginate, CourierSummary, DateRange, DeliveryFilters, DeliveryStats,
    DeliverySummary, OrderSummary, Page, SenderSummary, SortDirection, SortKey, StatusStat,
    TrackingView, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use response::{respond, ApiError, ApiResponse};

use crate::clients::{ActorClient, ArtisanClient, DeliveryClient, OrderClient};
use crate::config::DeliveryConfig;
use crate::courier::CourierRegistry;
use crate::error::DeliveryError;
use crate::model::{
    AttemptReport, DeliveryIssue, DeliveryRecord, DeliveryStatus, EventOrigin, IssueReport,
    IssueStatus, StatusChange, StatusEvent, TrackingNumber, UpdatedBy,
};
use crate::notify::{Audience, Notification, NotificationDispatcher};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Outcome of pulling courier updates for one delivery.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// Courier events appended to the timeline.
    pub applied: usize,
    /// The courier did not answer in time; treated as no update.
    pub timed_out: bool,
    pub record: DeliveryRecord,
}

#[derive(Clone)]
pub struct DeliveryService {
    deliveries: DeliveryClient,
    orders: OrderClient,
    artisans: ArtisanClient,
    couriers: Arc<CourierRegistry>,
    notifier: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    config: Arc<DeliveryConfig>,
}

impl DeliveryService {
    pub fn new(
        deliveries: DeliveryClient,
        orders: OrderClient,
        artisans: ArtisanClient,
        couriers: Arc<CourierRegistry>,
        notifier: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        config: Arc<DeliveryConfig>,
    ) -> Self {
        Self {
            deliveries,
            orders,
            artisans,
            couriers,
            notifier,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Creates the delivery for a shipped order.
    ///
    /// Validates the courier and package, resolves the order's artisan as sender, computes the
    /// estimate, and seeds the timeline with `label_created`. Then marks the order shipped and
    /// sends the customer a "shipped" notice.
    #[instrument(skip(self, data), fields(courier = %data.courier_name))]
    pub async fn create_delivery(
        &self,
        order_ref: &str,
        data: ShippingData,
    ) -> Result<DeliveryRecord, DeliveryError> {
        let courier = self.couriers.resolve(&data.courier_name)?.config.clone();
        let order = self.orders.fetch(order_ref).await?;
        let Some(artisan_ref) = order.primary_artisan() else {
            return Err(DeliveryError::validation(format!(
                "order {order_ref} has no items to ship"
            )));
        };
        if !order.status.is_shippable() {
            return Err(DeliveryError::conflict(format!(
                "order {order_ref} is {} and cannot be shipped",
                order.status
            )));
        }
        let artisan = self.artisans.fetch(artisan_ref).await?;

        let now = self.clock.utc();
        let params = create::build_delivery(&order, &artisan, &courier, data, &self.config.estimate, now)?;
        let tracking_number = self.deliveries.create(params).await?;
        let record = self.deliveries.fetch(&tracking_number).await?;
        info!(%tracking_number, order_ref, estimated = %record.estimated_delivery, "Delivery created");

        if let Err(e) = self
            .orders
            .mark_shipped(order.order_ref.clone(), tracking_number.clone(), now)
            .await
        {
            warn!(%tracking_number, order_ref, error = %e, "Failed to mark order shipped");
        }

        let notice = Notification::Shipped {
            tracking_number,
            customer_name: record.recipient.name.clone(),
            courier: record.courier.display_name.clone(),
            tracking_url: record.tracking_url(),
            estimated_delivery: record.estimated_delivery,
        };
        self.notify(&record, notice).await;
        Ok(record)
    }

    /// Appends a manually reported status to the timeline.
    ///
    /// The event is stamped with the current time, or the latest event's time if that is
    /// later. Customer-facing statuses trigger a notification; `delivered` also marks the
    /// order delivered.
    #[instrument(skip(self, location, description))]
    pub async fn update_delivery_status(
        &self,
        tracking_number: &TrackingNumber,
        status: DeliveryStatus,
        location: Option<String>,
        description: Option<String>,
        updated_by: UpdatedBy,
    ) -> Result<DeliveryRecord, DeliveryError> {
        let event = StatusEvent {
            status,
            timestamp: self.clock.utc(),
            location,
            description,
            updated_by,
        };
        let (change, record) = self
            .deliveries
            .append_status(tracking_number, event, EventOrigin::Manual)
            .await?;
        if let Some(change) = change {
            info!(%tracking_number, from = %change.from, to = %change.to, "Status updated");
            self.after_status_change(&record, change, EventOrigin::Manual)
                .await;
        }
        Ok(record)
    }

    /// Tracking view for a shipment. A stale, non-terminal delivery is refreshed from its
    /// courier first; a courier failure only means the view shows what is already known.
    #[instrument(skip(self))]
    pub async fn track_delivery(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<TrackingView, DeliveryError> {
        let mut record = self.deliveries.fetch(tracking_number).await?;
        let now = self.clock.utc();
        if record.needs_reconciliation()
            && record.is_stale(now, self.config.scheduler.staleness())
        {
            match self.refresh_from_courier(tracking_number).await {
                Ok(outcome) => record = outcome.record,
                Err(e @ DeliveryError::Store(_)) => return Err(e),
                Err(e) => warn!(%tracking_number, error = %e, "On-demand courier refresh failed"),
            }
        }

        let order = match self.orders.fetch(&record.order_ref).await {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(%tracking_number, order_ref = %record.order_ref, error = %e, "Order lookup failed");
                None
            }
        };
        Ok(TrackingView::build(&record, order.as_ref(), self.clock.utc()))
    }

    /// Deliveries sent by an artisan, filtered, sorted and paged.
    #[instrument(skip(self, filters))]
    pub async fn get_artisan_deliveries(
        &self,
        artisan_ref: &str,
        filters: &DeliveryFilters,
    ) -> Result<Page<DeliverySummary>, DeliveryError> {
        let records = self.artisan_records(artisan_ref).await?;
        paginate(records, filters, self.clock.utc())
    }

    /// Per-status counts and values, delivery rate and delays for an artisan's active
    /// deliveries created within `range`. Deactivated records are left out, as in listings.
    #[instrument(skip(self))]
    pub async fn get_delivery_stats(
        &self,
        artisan_ref: &str,
        range: DateRange,
    ) -> Result<DeliveryStats, DeliveryError> {
        range.validate()?;
        let records = self.artisan_records(artisan_ref).await?;
        let in_range = records
            .iter()
            .filter(|r| r.is_active && range.contains(r.created_at));
        Ok(compute_stats(in_range, self.clock.utc()))
    }

    /// Records a problem and tells the artisan. Issues on terminal deliveries are accepted
    /// and flagged.
    #[instrument(skip(self, report), fields(kind = ?report.kind))]
    pub async fn report_delivery_issue(
        &self,
        tracking_number: &TrackingNumber,
        report: IssueReport,
    ) -> Result<String, DeliveryError> {
        if report.description.trim().is_empty() {
            return Err(DeliveryError::validation("issue description is required"));
        }
        let (issue, record) = self.deliveries.report_issue(tracking_number, report).await?;
        if issue.raised_on_terminal {
            warn!(%tracking_number, issue_id = %issue.id, status = %issue.raised_while, "Issue raised on terminal delivery");
        } else {
            info!(%tracking_number, issue_id = %issue.id, "Issue reported");
        }
        let notice = Notification::IssueReported {
            tracking_number: tracking_number.clone(),
            issue_id: issue.id.clone(),
            kind: issue.kind,
            description: issue.description.clone(),
        };
        self.notify(&record, notice).await;
        Ok(issue.id)
    }

    /// Moves an issue forward (open, investigating, resolved, closed) and tells the artisan.
    #[instrument(skip(self, resolution))]
    pub async fn update_issue_status(
        &self,
        tracking_number: &TrackingNumber,
        issue_id: &str,
        status: IssueStatus,
        resolution: Option<String>,
    ) -> Result<DeliveryIssue, DeliveryError> {
        let (issue, record) = self
            .deliveries
            .advance_issue(tracking_number, issue_id.to_string(), status, resolution)
            .await?;
        let notice = Notification::IssueUpdated {
            tracking_number: tracking_number.clone(),
            issue_id: issue.id.clone(),
            status: issue.status,
            resolution: issue.resolution.clone(),
        };
        self.notify(&record, notice).await;
        Ok(issue)
    }

    /// Records a delivery attempt and returns its number. Delivered and failed outcomes also
    /// move the status, with the same side effects as [`Self::update_delivery_status`].
    #[instrument(skip(self, report))]
    pub async fn add_delivery_attempt(
        &self,
        tracking_number: &TrackingNumber,
        report: AttemptReport,
    ) -> Result<u32, DeliveryError> {
        let (attempt_number, change, record) = self
            .deliveries
            .record_attempt(tracking_number, report)
            .await?;
        info!(%tracking_number, attempt_number, "Delivery attempt recorded");
        if let Some(change) = change {
            self.after_status_change(&record, change, EventOrigin::Manual)
                .await;
        }
        Ok(attempt_number)
    }

    /// Stores the customer's rating (1 to 5). Only once, and only after delivery.
    #[instrument(skip(self, comment))]
    pub async fn submit_feedback(
        &self,
        tracking_number: &TrackingNumber,
        rating: u8,
        comment: Option<String>,
    ) -> Result<(), DeliveryError> {
        if !(1..=5).contains(&rating) {
            return Err(DeliveryError::validation(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
        let comment = comment.filter(|c| !c.trim().is_empty());
        self.deliveries
            .submit_feedback(tracking_number, rating, comment)
            .await?;
        info!(%tracking_number, rating, "Feedback submitted");
        Ok(())
    }

    /// Soft-deactivates a delivery. Inactive deliveries are kept for audit but skipped by the
    /// reconciliation sweep and refuse further status changes.
    #[instrument(skip(self))]
    pub async fn deactivate_delivery(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<DeliveryRecord, DeliveryError> {
        let (was_active, record) = self.deliveries.deactivate(tracking_number).await?;
        if was_active {
            info!(%tracking_number, "Delivery deactivated");
        }
        Ok(record)
    }

    /// Pulls courier updates for one delivery with the configured courier timeout.
    pub async fn refresh_from_courier(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<RefreshOutcome, DeliveryError> {
        self.refresh_with_timeout(tracking_number, self.config.scheduler.courier_timeout())
            .await
    }

    /// Pulls courier updates and applies the ones newer than the timeline.
    ///
    /// A timeout is not an error: the outcome reports `timed_out` and nothing changes.
    /// Courier events the transition policy rejects are skipped.
    #[instrument(skip(self))]
    pub async fn refresh_with_timeout(
        &self,
        tracking_number: &TrackingNumber,
        timeout: Duration,
    ) -> Result<RefreshOutcome, DeliveryError> {
        let mut record = self.deliveries.fetch(tracking_number).await?;
        let mut outcome = RefreshOutcome {
            applied: 0,
            timed_out: false,
            record: record.clone(),
        };
        if !record.needs_reconciliation() {
            return Ok(outcome);
        }

        let courier = record.courier.name;
        let adapter = self.couriers.get(courier)?.adapter.clone();
        let events = match tokio::time::timeout(timeout, adapter.fetch_updates(tracking_number)).await {
            Ok(Ok(events)) => events,
            Ok(Err(e)) => return Err(DeliveryError::external(format!("courier:{courier}"), e)),
            Err(_) => {
                warn!(%tracking_number, %courier, ?timeout, "Courier fetch timed out");
                outcome.timed_out = true;
                return Ok(outcome);
            }
        };
        debug!(%tracking_number, fetched = events.len(), "Courier events fetched");

        for event in events {
            match self
                .deliveries
                .append_status(tracking_number, event, EventOrigin::Courier)
                .await
            {
                Ok((Some(change), updated)) => {
                    outcome.applied += 1;
                    self.after_status_change(&updated, change, EventOrigin::Courier)
                        .await;
                    record = updated;
                }
                Ok((None, _)) => {}
                Err(e @ (DeliveryError::Validation(_) | DeliveryError::Conflict(_))) => {
                    warn!(%tracking_number, error = %e, "Skipping courier event");
                }
                Err(e) => return Err(e),
            }
        }
        if outcome.applied > 0 {
            info!(%tracking_number, applied = outcome.applied, status = %record.current_status(), "Courier updates applied");
        }
        outcome.record = record;
        Ok(outcome)
    }

    /// Sends the delay notice if the delivery is late and has never been alerted.
    ///
    /// The flag is claimed inside the delivery actor before sending, so concurrent callers
    /// cannot both send it. Returns true if this call sent it.
    #[instrument(skip(self))]
    pub async fn send_delay_alert_if_due(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<bool, DeliveryError> {
        let (claimed, record) = self
            .deliveries
            .claim_delay_notification(tracking_number)
            .await?;
        if !claimed {
            return Ok(false);
        }
        info!(%tracking_number, estimated = %record.estimated_delivery, "Delivery delayed");
        let notice = Notification::Delayed {
            tracking_number: tracking_number.clone(),
            status: record.current_status(),
            estimated_delivery: record.estimated_delivery,
            tracking_url: record.tracking_url(),
        };
        self.notify(&record, notice).await;
        Ok(true)
    }

    /// Active, non-terminal deliveries: the reconciliation sweep's work list.
    pub async fn reconciliation_candidates(&self) -> Result<Vec<DeliveryRecord>, DeliveryError> {
        self.deliveries
            .list(|record: &DeliveryRecord| record.needs_reconciliation())
            .await
    }

    async fn artisan_records(&self, artisan_ref: &str) -> Result<Vec<DeliveryRecord>, DeliveryError> {
        let wanted = artisan_ref.to_string();
        self.deliveries
            .list(move |record: &DeliveryRecord| record.sender.artisan_ref == wanted)
            .await
    }

    async fn after_status_change(
        &self,
        record: &DeliveryRecord,
        change: StatusChange,
        origin: EventOrigin,
    ) {
        let tracking_number = record.tracking_number();
        if change.to == DeliveryStatus::Delivered && change.from != DeliveryStatus::Delivered {
            let at = record.actual_delivery().unwrap_or_else(|| self.clock.utc());
            if let Err(e) = self.orders.mark_delivered(record.order_ref.clone(), at).await {
                warn!(%tracking_number, order_ref = %record.order_ref, error = %e, "Failed to mark order delivered");
            }
        }

        // Repeated courier scans of the same status are not news to the customer, and a
        // delivery is announced once whoever records it again.
        let repeated = change.from == change.to
            && (origin == EventOrigin::Courier || change.to == DeliveryStatus::Delivered);
        if !change.to.notifies_customer() || repeated {
            return;
        }
        let latest = record.latest_event();
        let notice = match change.to {
            DeliveryStatus::Delivered => Notification::Delivered {
                tracking_number: tracking_number.clone(),
                delivered_at: record.actual_delivery().unwrap_or(latest.timestamp),
            },
            DeliveryStatus::FailedDelivery => Notification::DeliveryFailed {
                tracking_number: tracking_number.clone(),
                reason: latest.description.clone(),
                tracking_url: record.tracking_url(),
            },
            status => Notification::StatusChanged {
                tracking_number: tracking_number.clone(),
                status,
                location: latest.location.clone(),
                tracking_url: record.tracking_url(),
            },
        };
        self.notify(record, notice).await;
    }

    /// Sends `notification` on every channel its audience has. Returns true if any succeeded.
    async fn notify(&self, record: &DeliveryRecord, notification: Notification) -> bool {
        let tracking_number = record.tracking_number();
        let kind = notification.kind();
        let subject = notification.subject();
        let mut sent = false;

        let (email, phone) = match notification.audience() {
            Audience::Customer => (
                record.recipient.email.as_deref(),
                record.recipient.phone.as_deref(),
            ),
            Audience::Artisan => (Some(record.sender.email.as_str()), None),
        };
        if let Some(to) = email {
            match self
                .notifier
                .send_email(to, &subject, &notification.body_html())
                .await
            {
                Ok(()) => sent = true,
                Err(e) => warn!(%tracking_number, kind, channel = "email", error = %e, "Notification failed"),
            }
        }
        if let Some(to) = phone {
            match self.notifier.send_sms(to, &notification.sms_text()).await {
                Ok(()) => sent = true,
                Err(e) => warn!(%tracking_number, kind, channel = "sms", error = %e, "Notification failed"),
            }
        }

        if sent {
            debug!(%tracking_number, kind, "Notification sent");
            if let Err(e) = self.deliveries.record_notification_sent(tracking_number).await {
                warn!(%tracking_number, error = %e, "Failed to record notification time");
            }
        }
        sent
    }
}
