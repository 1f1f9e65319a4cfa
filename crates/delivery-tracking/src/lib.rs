//! # Delivery Tracking
//!
//! Shipment tracking for a handmade-goods marketplace: one delivery per shipped order, an
//! append-only status timeline, courier reconciliation and customer notifications.
//!
//! - **[model]**: Pure data ([`DeliveryRecord`](model::DeliveryRecord), orders, artisans) and
//!   the status state machine.
//! - **[delivery_actor]**, **[order_actor]**, **[artisan_actor]**: Resource actors owning each
//!   store, reached through the typed wrappers in **[clients]**.
//! - **[service]**: [`DeliveryService`](service::DeliveryService), the only component that
//!   changes deliveries.
//! - **[courier]**: Carrier table and the adapters that fetch tracking scans.
//! - **[notify]**: Email/SMS messages and the dispatcher capability.
//! - **[scheduler]**: The periodic reconciliation sweep.
//! - **[lifecycle]**: [`DeliverySystem`](lifecycle::DeliverySystem), which starts and stops
//!   everything.
//!
//! See [`actor_framework::mock`] for utilities to test clients without spawning full actors.

pub mod artisan_actor;
pub mod clients;
pub mod config;
pub mod courier;
pub mod delivery_actor;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod order_actor;
pub mod scheduler;
pub mod service;

pub use config::DeliveryConfig;
pub use error::{DeliveryError, ErrorKind};
pub use lifecycle::DeliverySystem;
pub use service::DeliveryService;
