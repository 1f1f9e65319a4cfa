use crate::clients::{ArtisanClient, DeliveryClient, OrderClient};
use crate::config::DeliveryConfig;
use crate::courier::CourierRegistry;
use crate::delivery_actor::DeliveryContext;
use crate::notify::NotificationDispatcher;
use crate::scheduler::{ReconciliationScheduler, SchedulerHandle};
use crate::service::DeliveryService;
use mockable::Clock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Runtime owner of the delivery subsystem.
///
/// Spawns the delivery, order and artisan actors, wires the [`DeliveryService`] over their
/// clients, and optionally runs the [`ReconciliationScheduler`].
pub struct DeliverySystem {
    pub service: DeliveryService,

    pub delivery_client: DeliveryClient,

    /// Orders are created here by the marketplace before they ship.
    pub order_client: OrderClient,

    pub artisan_client: ArtisanClient,

    config: Arc<DeliveryConfig>,
    scheduler: Option<SchedulerHandle>,
    handles: Vec<JoinHandle<()>>,
}

impl DeliverySystem {
    /// Creates all actors and starts them. The scheduler is not started; see
    /// [`Self::start_scheduler`].
    pub fn new(
        config: DeliveryConfig,
        clock: Arc<dyn Clock>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        registry: CourierRegistry,
    ) -> Self {
        let buffer_size = config.actor_buffer_size.max(1);

        let (delivery_actor, delivery_client) =
            crate::delivery_actor::new(buffer_size, Arc::clone(&clock));
        let (order_actor, order_client) = crate::order_actor::new(buffer_size);
        let (artisan_actor, artisan_client) = crate::artisan_actor::new(buffer_size);

        let delivery_context = DeliveryContext {
            policy: config.transition_policy,
            clock: Arc::clone(&clock),
        };
        let delivery_handle = tokio::spawn(delivery_actor.run(delivery_context));
        let order_handle = tokio::spawn(order_actor.run(()));
        let artisan_handle = tokio::spawn(artisan_actor.run(()));

        let config = Arc::new(config);
        let service = DeliveryService::new(
            delivery_client.clone(),
            order_client.clone(),
            artisan_client.clone(),
            Arc::new(registry),
            dispatcher,
            clock,
            Arc::clone(&config),
        );
        info!(policy = ?config.transition_policy, "Delivery system started");

        Self {
            service,
            delivery_client,
            order_client,
            artisan_client,
            config,
            scheduler: None,
            handles: vec![delivery_handle, order_handle, artisan_handle],
        }
    }

    /// Starts the reconciliation sweep unless it is disabled or already running.
    /// Returns whether a scheduler is running afterwards.
    pub fn start_scheduler(&mut self) -> bool {
        if self.scheduler.is_some() {
            return true;
        }
        if !self.config.scheduler.enabled {
            info!("Reconciliation scheduler disabled by configuration");
            return false;
        }
        let scheduler =
            ReconciliationScheduler::new(self.service.clone(), self.config.scheduler.clone());
        self.scheduler = Some(scheduler.start());
        true
    }

    /// Stops the scheduler, closes every actor channel and waits for the actors to exit.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down delivery system...");

        if let Some(scheduler) = self.scheduler {
            scheduler.stop().await;
        }

        drop(self.service);
        drop(self.delivery_client);
        drop(self.order_client);
        drop(self.artisan_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Delivery system shutdown complete.");
        Ok(())
    }
}
