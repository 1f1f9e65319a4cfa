//! Read views: tracking pages, artisan listings and statistics.
//!
//! Everything here is a pure function over record snapshots. Derived values such as progress
//! and delay are computed on read and never stored.

use crate::error::DeliveryError;
use crate::model::{
    DeliveryRecord, DeliveryStatus, Feedback, Order, OrderStatus, PackageDetails, Recipient,
    StatusEvent, TrackingNumber,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Inclusive creation-time window. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at <= to)
    }

    pub(crate) fn validate(&self) -> Result<(), DeliveryError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(DeliveryError::validation(
                "date range start is after its end",
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    EstimatedDelivery,
    Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Listing options for an artisan's deliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryFilters {
    pub status: Option<DeliveryStatus>,
    pub created: DateRange,
    pub sort_by: SortKey,
    pub direction: SortDirection,
    /// 1-based.
    pub page: usize,
    /// Clamped to [`MAX_PAGE_SIZE`].
    pub limit: usize,
    pub include_inactive: bool,
}

impl Default for DeliveryFilters {
    fn default() -> Self {
        Self {
            status: None,
            created: DateRange::default(),
            sort_by: SortKey::default(),
            direction: SortDirection::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            include_inactive: false,
        }
    }
}

impl DeliveryFilters {
    pub fn matches(&self, record: &DeliveryRecord) -> bool {
        (self.include_inactive || record.is_active)
            && self.status.map_or(true, |status| record.current_status() == status)
            && self.created.contains(record.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// One row of an artisan's delivery listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliverySummary {
    pub tracking_number: TrackingNumber,
    pub order_ref: String,
    pub courier: String,
    pub current_status: DeliveryStatus,
    pub progress_percentage: u8,
    pub recipient_name: String,
    pub recipient_city: String,
    pub estimated_delivery: DateTime<Utc>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub is_delayed: bool,
    pub open_issues: usize,
    pub created_at: DateTime<Utc>,
}

impl DeliverySummary {
    pub fn of(record: &DeliveryRecord, now: DateTime<Utc>) -> Self {
        Self {
            tracking_number: record.tracking_number().clone(),
            order_ref: record.order_ref.clone(),
            courier: record.courier.display_name.clone(),
            current_status: record.current_status(),
            progress_percentage: record.progress_percentage(),
            recipient_name: record.recipient.name.clone(),
            recipient_city: record.recipient.address.city.clone(),
            estimated_delivery: record.estimated_delivery,
            actual_delivery: record.actual_delivery(),
            is_delayed: record.is_delayed(now),
            open_issues: record
                .issues
                .iter()
                .filter(|issue| issue.resolved_at.is_none())
                .count(),
            created_at: record.created_at,
        }
    }
}

/// Filters, sorts and pages `records`.
pub fn paginate(
    records: Vec<DeliveryRecord>,
    filters: &DeliveryFilters,
    now: DateTime<Utc>,
) -> Result<Page<DeliverySummary>, DeliveryError> {
    if filters.page == 0 {
        return Err(DeliveryError::validation("page numbers start at 1"));
    }
    if filters.limit == 0 {
        return Err(DeliveryError::validation("limit must be positive"));
    }
    filters.created.validate()?;
    let limit = filters.limit.min(MAX_PAGE_SIZE);

    let mut matched: Vec<DeliveryRecord> =
        records.into_iter().filter(|r| filters.matches(r)).collect();
    matched.sort_by(|a, b| {
        let ordering = compare(a, b, filters.sort_by)
            .then_with(|| a.tracking_number().cmp(b.tracking_number()));
        match filters.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    let total = matched.len();
    let items = matched
        .iter()
        .skip((filters.page - 1).saturating_mul(limit))
        .take(limit)
        .map(|record| DeliverySummary::of(record, now))
        .collect();
    Ok(Page {
        items,
        total,
        page: filters.page,
        limit,
        total_pages: total.div_ceil(limit),
    })
}

fn compare(a: &DeliveryRecord, b: &DeliveryRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::EstimatedDelivery => a.estimated_delivery.cmp(&b.estimated_delivery),
        SortKey::Status => a.current_status().cmp(&b.current_status()),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusStat {
    pub count: usize,
    /// Sum of declared package values.
    pub total_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeliveryStats {
    pub by_status: BTreeMap<DeliveryStatus, StatusStat>,
    pub total: usize,
    pub delivered: usize,
    /// Percentage of deliveries that reached `delivered`, two decimals. Zero when empty.
    pub delivery_rate: f64,
    /// Deliveries currently past their estimate.
    pub delayed: usize,
}

pub fn compute_stats<'a>(
    records: impl IntoIterator<Item = &'a DeliveryRecord>,
    now: DateTime<Utc>,
) -> DeliveryStats {
    let mut stats = DeliveryStats::default();
    for record in records {
        let status = record.current_status();
        let entry = stats.by_status.entry(status).or_default();
        entry.count += 1;
        entry.total_value += record.package.declared_value;
        stats.total += 1;
        if status == DeliveryStatus::Delivered {
            stats.delivered += 1;
        }
        if record.is_delayed(now) {
            stats.delayed += 1;
        }
    }
    if stats.total > 0 {
        let rate = stats.delivered as f64 * 100.0 / stats.total as f64;
        stats.delivery_rate = (rate * 100.0).round() / 100.0;
    }
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourierSummary {
    pub name: String,
    pub contact_phone: Option<String>,
    pub tracking_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub order_ref: String,
    pub status: OrderStatus,
    pub item_count: u32,
    pub total: f64,
    pub shipping_cost: f64,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            order_ref: order.order_ref.clone(),
            status: order.status,
            item_count: order.item_count(),
            total: order.total,
            shipping_cost: order.shipping_cost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderSummary {
    pub artisan_ref: String,
    pub name: String,
    pub city: String,
}

/// What a customer sees when tracking a shipment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingView {
    pub tracking_number: TrackingNumber,
    pub current_status: DeliveryStatus,
    pub status_label: &'static str,
    pub progress_percentage: u8,
    pub estimated_delivery: DateTime<Utc>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub is_delayed: bool,
    /// Newest first.
    pub timeline: Vec<StatusEvent>,
    pub courier: CourierSummary,
    pub package: PackageDetails,
    pub recipient: Recipient,
    /// `None` if the order could not be loaded.
    pub order: Option<OrderSummary>,
    pub sender: SenderSummary,
    pub feedback: Option<Feedback>,
}

impl TrackingView {
    pub fn build(record: &DeliveryRecord, order: Option<&Order>, now: DateTime<Utc>) -> Self {
        let status = record.current_status();
        Self {
            tracking_number: record.tracking_number().clone(),
            current_status: status,
            status_label: status.label(),
            progress_percentage: record.progress_percentage(),
            estimated_delivery: record.estimated_delivery,
            actual_delivery: record.actual_delivery(),
            is_delayed: record.is_delayed(now),
            timeline: record.timeline_newest_first(),
            courier: CourierSummary {
                name: record.courier.display_name.clone(),
                contact_phone: record.courier.contact_phone.clone(),
                tracking_url: record.tracking_url(),
            },
            package: record.package.clone(),
            recipient: record.recipient.clone(),
            order: order.map(OrderSummary::from),
            sender: SenderSummary {
                artisan_ref: record.sender.artisan_ref.clone(),
                name: record.sender.name.clone(),
                city: record.sender.pickup_address.city.clone(),
            },
            feedback: record.feedback().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::delivery::tests::{sample_record_with, t0};
    use crate::model::{EventOrigin, TransitionPolicy, UpdatedBy};
    use chrono::TimeDelta;

    fn record_at(offset_hours: i64, suffix: u16, value: f64) -> DeliveryRecord {
        let mut record = sample_record_with(suffix);
        record.created_at = t0() + TimeDelta::hours(offset_hours);
        record.package.declared_value = value;
        record
    }

    fn deliver(record: &mut DeliveryRecord) {
        record
            .append_event(
                StatusEvent::new(DeliveryStatus::Delivered, record.created_at, UpdatedBy::Courier),
                EventOrigin::Manual,
                TransitionPolicy::Permissive,
            )
            .unwrap();
    }

    #[test]
    fn pages_newest_first_by_default() {
        let records: Vec<_> = (0..5).map(|i| record_at(i, i as u16, 100.0)).collect();
        let filters = DeliveryFilters {
            limit: 2,
            page: 2,
            ..DeliveryFilters::default()
        };
        let page = paginate(records, &filters, t0()).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        let created: Vec<_> = page.items.iter().map(|s| s.created_at).collect();
        assert_eq!(created, vec![t0() + TimeDelta::hours(2), t0() + TimeDelta::hours(1)]);
    }

    #[test]
    fn filters_by_status_and_window_and_clamps_limit() {
        let mut delivered = record_at(0, 1, 100.0);
        deliver(&mut delivered);
        let records = vec![delivered, record_at(1, 2, 100.0), record_at(48, 3, 100.0)];

        let filters = DeliveryFilters {
            status: Some(DeliveryStatus::LabelCreated),
            created: DateRange {
                from: Some(t0()),
                to: Some(t0() + TimeDelta::hours(24)),
            },
            limit: 500,
            ..DeliveryFilters::default()
        };
        let page = paginate(records, &filters, t0()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(page.items[0].created_at, t0() + TimeDelta::hours(1));
    }

    #[test]
    fn rejects_bad_paging_and_inverted_ranges() {
        let zero_page = DeliveryFilters {
            page: 0,
            ..DeliveryFilters::default()
        };
        assert!(matches!(
            paginate(vec![], &zero_page, t0()),
            Err(DeliveryError::Validation(_))
        ));
        let inverted = DeliveryFilters {
            created: DateRange {
                from: Some(t0()),
                to: Some(t0() - TimeDelta::days(1)),
            },
            ..DeliveryFilters::default()
        };
        assert!(paginate(vec![], &inverted, t0()).is_err());
    }

    #[test]
    fn stats_count_value_rate_and_delays() {
        let mut a = record_at(0, 1, 1000.0);
        deliver(&mut a);
        let b = record_at(0, 2, 250.5);
        let c = record_at(0, 3, 249.5);
        let late = t0() + TimeDelta::days(10);

        let stats = compute_stats([&a, &b, &c], late);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.delivery_rate, 33.33);
        assert_eq!(stats.delayed, 2);
        let pending = stats.by_status[&DeliveryStatus::LabelCreated];
        assert_eq!(pending.count, 2);
        assert_eq!(pending.total_value, 500.0);

        assert_eq!(compute_stats(Vec::<&DeliveryRecord>::new(), late).delivery_rate, 0.0);
    }
}
