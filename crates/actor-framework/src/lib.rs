//! # Actor Framework
//!
//! Building blocks for resource-oriented actors on Tokio: each resource type gets one
//! [`ResourceActor`] that owns its store and handles create, read, update, list and custom
//! action requests one at a time.
//!
//! ## Why actors here
//!
//! - **Isolated state**: the store lives inside a single task, so no locks guard it.
//! - **Serialized writes**: two writers racing on the same entity are queued on the channel,
//!   and a read-modify-write inside a hook can never interleave with another.
//! - **Late binding**: dependencies are injected through `run(context)`, not `new()`.
//!
//! The flip side is that anything slow done *inside* a hook stalls every other request to
//! that actor. Keep network calls in the caller and send the actor only the results.
//!
//! ## Quick Start
//!
//! ```rust
//! use actor_framework::{ActorEntity, ResourceActor};
//! use async_trait::async_trait;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! #[derive(Clone, Debug)]
//! struct Crate { id: String, items: u32 }
//! #[derive(Debug)] struct CrateCreate { items: u32 }
//! #[derive(Debug)] enum CrateAction { Add(u32) }
//! #[derive(Debug, thiserror::Error)] #[error("crate error")] struct CrateError;
//!
//! #[async_trait]
//! impl ActorEntity for Crate {
//!     type Id = String;
//!     type Create = CrateCreate;
//!     type Update = ();
//!     type Action = CrateAction;
//!     type ActionResult = u32;
//!     type Context = ();
//!     type Error = CrateError;
//!
//!     fn from_create_params(id: String, params: CrateCreate) -> Result<Self, Self::Error> {
//!         Ok(Self { id, items: params.items })
//!     }
//!     async fn on_update(&mut self, _: (), _: &()) -> Result<(), Self::Error> { Ok(()) }
//!     async fn handle_action(&mut self, action: CrateAction, _: &()) -> Result<u32, Self::Error> {
//!         match action {
//!             CrateAction::Add(n) => { self.items += n; Ok(self.items) }
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let counter = AtomicU32::new(1);
//!     let (actor, client) = ResourceActor::<Crate>::new(10, move || {
//!         format!("crate_{}", counter.fetch_add(1, Ordering::SeqCst))
//!     });
//!     tokio::spawn(actor.run(()));
//!
//!     let id = client.create(CrateCreate { items: 2 }).await.unwrap();
//!     let (total, snapshot) = client.perform_action(id, CrateAction::Add(3)).await.unwrap();
//!     assert_eq!(total, 5);
//!     assert_eq!(snapshot.items, 5);
//! }
//! ```
//!
//! ## Testing
//!
//! See [`mock`] for a scripted [`MockClient`](mock::MockClient) that answers requests
//! without spawning an actor.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod tracing;

pub use actor::{IdGenerator, ResourceActor};
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{Filter, ResourceRequest, Response};
