//! # ActorEntity Trait
//!
//! The contract every resource must satisfy to be owned by a [`ResourceActor`](crate::ResourceActor).
//! Associated types pin down the id, the create/update payloads, the custom action vocabulary,
//! the injected context and the error type, so a request for one resource can never be routed
//! to another at compile time.
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_create`] runs after construction and before the entity becomes visible.
//! - [`ActorEntity::unique_key`] lets an entity claim a secondary key that must stay unique
//!   across the store (for example "one delivery per order").
//!
//! Both default to doing nothing.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any resource entity must implement to be managed by `ResourceActor`.
///
/// # Async & Context
/// Hooks are `async` so they may call other actors. The `Context` associated type is handed to
/// every hook by [`ResourceActor::run`](crate::ResourceActor::run), which lets dependencies be
/// bound after the actor is constructed.
///
/// # Ids
/// Ids are not derived from a counter inside the actor. The actor is built with an id
/// generator closure (see [`ResourceActor::new`](crate::ResourceActor::new)) so each resource
/// can mint ids in its own format.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    type Update: Send + Sync + Debug;

    /// Enum representing resource-specific operations.
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies or policy) injected into the actor.
    /// Use `()` if nothing is needed.
    type Context: Send + Sync;

    /// The error type for this entity.
    ///
    /// One error enum per actor rather than one per action. Callers recover it from
    /// [`FrameworkError::EntityError`](crate::FrameworkError::EntityError) by downcasting.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the id and payload.
    /// This is called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Secondary key that must be unique across the store, if any.
    fn unique_key(&self) -> Option<String> {
        None
    }

    // --- Lifecycle Hooks (Async) ---

    /// Called after the entity is constructed and before it is stored.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received.
    async fn on_update(
        &mut self,
        update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    // --- Action Handler (Async) ---

    /// Handle a custom resource-specific action.
    ///
    /// When this returns `Err` the actor restores the entity to its state before the call,
    /// so a failed action never leaves a half-applied mutation behind.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
