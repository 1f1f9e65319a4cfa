//! # System Lifecycle
//!
//! Starting, wiring and stopping the delivery subsystem.
//!
//! ## Wiring
//!
//! Three store actors run as independent tokio tasks:
//!
//! - the **delivery** actor, whose context carries the transition policy and the clock,
//! - the **order** and **artisan** actors, which need no context.
//!
//! The [`DeliveryService`](crate::service::DeliveryService) holds clients to all three plus
//! the courier registry and the notification dispatcher. Actors never call each other;
//! every cross-store step goes through the service, outside any actor.
//!
//! ```rust,ignore
//! let system = DeliverySystem::new(config, clock, dispatcher, registry);
//! system.start_scheduler();
//!
//! let record = system.service.create_delivery(&order_ref, shipping).await?;
//! system.service.update_delivery_status(record.tracking_number(), status, None, None, by).await?;
//!
//! system.shutdown().await?;
//! ```
//!
//! ## Shutdown
//!
//! 1. **Stop the scheduler** - it holds a clone of the service, and with it of every client
//! 2. **Drop all clients** - closes the sender side of each actor channel
//! 3. **Await the actors** - each drains its queue and exits when its channel closes
//!
//! Clients cloned elsewhere keep their actor alive, so drop them before calling
//! [`DeliverySystem::shutdown`].

pub mod delivery_system;

pub use delivery_system::*;
