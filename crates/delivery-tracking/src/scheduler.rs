//! # Reconciliation Scheduler
//!
//! A background task that, on a fixed interval, walks every active non-terminal delivery,
//! refreshes the stale ones from their courier and raises delay alerts.
//!
//! Records are processed in parallel, at most `max_concurrency` at a time, so a large backlog
//! cannot flood courier APIs. A failing record is logged and counted; it never aborts the
//! sweep for the others.
//!
//! Only one scheduler should run against a given store. Running several instances would need
//! a distributed lock or leader election, which this crate does not provide.

use crate::config::SchedulerConfig;
use crate::error::DeliveryError;
use crate::model::DeliveryRecord;
use crate::service::DeliveryService;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn, Instrument};

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Active, non-terminal records considered.
    pub examined: usize,
    /// Stale records whose courier answered.
    pub refreshed: usize,
    pub events_applied: usize,
    pub delay_alerts: usize,
    pub courier_timeouts: usize,
    pub failures: usize,
}

#[derive(Debug, Default)]
struct RecordOutcome {
    refreshed: bool,
    timed_out: bool,
    events_applied: usize,
    delay_alert: bool,
}

impl SweepReport {
    fn absorb(&mut self, outcome: Result<RecordOutcome, DeliveryError>) {
        match outcome {
            Ok(outcome) => {
                self.refreshed += usize::from(outcome.refreshed);
                self.courier_timeouts += usize::from(outcome.timed_out);
                self.events_applied += outcome.events_applied;
                self.delay_alerts += usize::from(outcome.delay_alert);
            }
            Err(_) => self.failures += 1,
        }
    }
}

pub struct ReconciliationScheduler {
    service: DeliveryService,
    config: SchedulerConfig,
    permits: Arc<Semaphore>,
}

impl ReconciliationScheduler {
    pub fn new(service: DeliveryService, config: SchedulerConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        Self {
            service,
            config,
            permits,
        }
    }

    /// Runs one sweep to completion.
    ///
    /// Only a failure to list candidates is returned as an error; per-record failures are
    /// counted in the report.
    pub async fn sweep(&self) -> Result<SweepReport, DeliveryError> {
        let candidates = self.service.reconciliation_candidates().await?;
        let mut report = SweepReport {
            examined: candidates.len(),
            ..SweepReport::default()
        };
        debug!(candidates = report.examined, "Starting reconciliation sweep");

        let mut workers = JoinSet::new();
        for record in candidates {
            let service = self.service.clone();
            let permits = Arc::clone(&self.permits);
            let staleness = self.config.staleness();
            let span = tracing::info_span!("reconcile", tracking_number = %record.tracking_number());
            workers.spawn(
                async move {
                    // Never closed.
                    let _permit = permits.acquire_owned().await.ok();
                    let tracking_number = record.tracking_number().clone();
                    let outcome = reconcile(&service, record, staleness).await;
                    if let Err(e) = &outcome {
                        warn!(%tracking_number, error = %e, "Reconciliation failed");
                    }
                    outcome
                }
                .instrument(span),
            );
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => report.absorb(outcome),
                Err(e) => {
                    error!(error = %e, "Reconciliation task panicked");
                    report.failures += 1;
                }
            }
        }

        info!(
            examined = report.examined,
            refreshed = report.refreshed,
            events_applied = report.events_applied,
            delay_alerts = report.delay_alerts,
            courier_timeouts = report.courier_timeouts,
            failures = report.failures,
            "Reconciliation sweep complete"
        );
        Ok(report)
    }

    /// Spawns the periodic sweep. The first sweep runs one interval after start.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let interval = self.config.interval();
        let task = tokio::spawn(async move {
            info!(?interval, "Reconciliation scheduler started");
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            timer.tick().await;

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        if let Err(e) = self.sweep().await {
                            error!(error = %e, "Reconciliation sweep could not start");
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Reconciliation scheduler stopped");
        });
        SchedulerHandle { shutdown, task }
    }
}

/// Refreshes one record if stale, then raises its delay alert if due.
async fn reconcile(
    service: &DeliveryService,
    mut record: DeliveryRecord,
    staleness: chrono::TimeDelta,
) -> Result<RecordOutcome, DeliveryError> {
    let mut outcome = RecordOutcome::default();
    let tracking_number = record.tracking_number().clone();

    if record.is_stale(service.clock().utc(), staleness) {
        let refresh = service.refresh_from_courier(&tracking_number).await?;
        outcome.timed_out = refresh.timed_out;
        outcome.refreshed = !refresh.timed_out;
        outcome.events_applied = refresh.applied;
        record = refresh.record;
    }

    if record.is_active
        && !record.notifications.delay_notification_sent
        && record.is_delayed(service.clock().utc())
    {
        outcome.delay_alert = service.send_delay_alert_if_due(&tracking_number).await?;
    }
    Ok(outcome)
}

/// Handle to a running scheduler.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the scheduler and waits for it to exit. A sweep in progress finishes first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Reconciliation scheduler task failed");
        }
    }
}
