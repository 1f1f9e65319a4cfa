mod support;

use chrono::TimeDelta;
use delivery_tracking::config::SchedulerConfig;
use delivery_tracking::courier::CourierError;
use delivery_tracking::model::{DeliveryStatus, TrackingNumber, UpdatedBy};
use delivery_tracking::scheduler::{ReconciliationScheduler, SweepReport};
use delivery_tracking::DeliveryConfig;
use std::time::Duration;
use support::{courier_event, t0, Harness, Script};

async fn ship_many(h: &Harness, n: usize) -> Vec<TrackingNumber> {
    let mut tracking_numbers = Vec::with_capacity(n);
    for _ in 0..n {
        let (_, order_ref) = h.place_order().await;
        tracking_numbers.push(h.ship(&order_ref).await.tracking_number().clone());
    }
    tracking_numbers
}

fn scheduler(h: &Harness) -> ReconciliationScheduler {
    ReconciliationScheduler::new(h.service().clone(), h.service().config().scheduler.clone())
}

#[tokio::test]
async fn sweep_skips_terminal_records() {
    let h = Harness::start();
    let tns = ship_many(&h, 4).await;
    let service = h.service();
    for status in [DeliveryStatus::InTransit, DeliveryStatus::Delivered] {
        service
            .update_delivery_status(&tns[0], status, None, None, UpdatedBy::Courier)
            .await
            .unwrap();
    }
    service
        .update_delivery_status(&tns[1], DeliveryStatus::Cancelled, None, None, UpdatedBy::Artisan)
        .await
        .unwrap();
    let delivered_before = h.system.delivery_client.fetch(&tns[0]).await.unwrap();

    h.clock.advance(TimeDelta::hours(5));
    h.courier.set_default(Script::Events(vec![courier_event(
        DeliveryStatus::InTransit,
        t0() + TimeDelta::hours(5),
    )]));
    let report = scheduler(&h).sweep().await.unwrap();

    assert_eq!(
        report,
        SweepReport {
            examined: 2,
            refreshed: 2,
            events_applied: 2,
            ..SweepReport::default()
        }
    );
    assert_eq!(h.courier.calls(), 2);
    assert_eq!(h.system.delivery_client.fetch(&tns[0]).await.unwrap(), delivered_before);
    for tn in &tns[2..] {
        let record = h.system.delivery_client.fetch(tn).await.unwrap();
        assert_eq!(record.current_status(), DeliveryStatus::InTransit);
    }
    h.shutdown().await;
}

#[tokio::test]
async fn fresh_records_are_not_fetched() {
    let h = Harness::start();
    ship_many(&h, 2).await;
    h.clock.advance(TimeDelta::hours(3));

    let report = scheduler(&h).sweep().await.unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.refreshed, 0);
    assert_eq!(h.courier.calls(), 0);
    h.shutdown().await;
}

#[tokio::test]
async fn one_failing_record_does_not_stop_the_sweep() {
    let h = Harness::start();
    let tns = ship_many(&h, 3).await;
    h.clock.advance(TimeDelta::hours(5));
    h.courier.set_default(Script::Events(vec![courier_event(
        DeliveryStatus::PickedUp,
        t0() + TimeDelta::hours(5),
    )]));
    h.courier
        .set_for(&tns[1], Script::Fail(CourierError::rate_limited("slow down")));

    let report = scheduler(&h).sweep().await.unwrap();

    assert_eq!(report.examined, 3);
    assert_eq!(report.failures, 1);
    assert_eq!(report.refreshed, 2);
    let failed = h.system.delivery_client.fetch(&tns[1]).await.unwrap();
    assert_eq!(failed.current_status(), DeliveryStatus::LabelCreated);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn courier_timeout_counts_as_no_update() {
    let config = DeliveryConfig {
        scheduler: SchedulerConfig {
            courier_timeout_secs: 1,
            ..SchedulerConfig::default()
        },
        ..DeliveryConfig::default()
    };
    let h = Harness::with_config(config);
    let tns = ship_many(&h, 2).await;
    h.clock.advance(TimeDelta::hours(5));
    h.courier.set_for(&tns[0], Script::Hang);

    let report = scheduler(&h).sweep().await.unwrap();

    assert_eq!(report.courier_timeouts, 1);
    assert_eq!(report.refreshed, 1);
    assert_eq!(report.failures, 0);
    let record = h.system.delivery_client.fetch(&tns[0]).await.unwrap();
    assert_eq!(record.timeline().len(), 1);
    h.shutdown().await;
}

#[tokio::test]
async fn delay_alerts_fire_once_across_sweeps() {
    let h = Harness::start();
    let tns = ship_many(&h, 3).await;
    h.service()
        .update_delivery_status(&tns[0], DeliveryStatus::Cancelled, None, None, UpdatedBy::Artisan)
        .await
        .unwrap();
    h.clock.advance(TimeDelta::days(5));

    let sweeper = scheduler(&h);
    let first = sweeper.sweep().await.unwrap();
    let second = sweeper.sweep().await.unwrap();

    assert_eq!(first.delay_alerts, 2);
    assert_eq!(second.delay_alerts, 0);
    let late_emails = h
        .dispatcher
        .emails()
        .into_iter()
        .filter(|s| s.text.contains("running late"))
        .count();
    assert_eq!(late_emails, 2);
    for tn in &tns[1..] {
        let record = h.system.delivery_client.fetch(tn).await.unwrap();
        assert!(record.notifications.delay_notification_sent);
    }
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn started_scheduler_sweeps_on_its_interval() {
    let config = DeliveryConfig {
        scheduler: SchedulerConfig {
            interval_secs: 60,
            ..SchedulerConfig::default()
        },
        ..DeliveryConfig::default()
    };
    let mut h = Harness::with_config(config);
    ship_many(&h, 1).await;
    h.clock.advance(TimeDelta::hours(5));

    assert!(h.system.start_scheduler());
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.courier.calls(), 0);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(h.courier.calls(), 1);

    h.shutdown().await;
}

#[tokio::test]
async fn disabled_scheduler_does_not_start() {
    let config = DeliveryConfig {
        scheduler: SchedulerConfig {
            enabled: false,
            ..SchedulerConfig::default()
        },
        ..DeliveryConfig::default()
    };
    let mut h = Harness::with_config(config);
    assert!(!h.system.start_scheduler());
    h.shutdown().await;
}
