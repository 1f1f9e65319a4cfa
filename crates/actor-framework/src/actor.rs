//! # Generic Actor Server
//!
//! `ResourceActor` owns the store for one entity type and applies every request to it
//! sequentially. That sequencing is the only concurrency control the store needs: two
//! writers racing on the same entity are simply queued behind each other on the channel.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How many times `Create` asks the id generator for a fresh id before giving up.
const MAX_ID_ATTEMPTS: u32 = 16;

/// Boxed id generator handed to [`ResourceActor::new`].
pub type IdGenerator<Id> = Box<dyn Fn() -> Id + Send + Sync>;

/// The generic actor that manages a collection of entities.
///
/// # Architecture Note
/// This struct is the server half of the actor. It owns the entity map, the unique-key index
/// and the receiving end of the channel, and is consumed by [`ResourceActor::run`].
///
/// ## Operations
///
/// * **Create**: asks the id generator for an id that is not in use (retrying on collision),
///   builds the entity, runs `on_create`, checks the unique key, then stores it.
/// * **Get**: returns a clone of the entity, or `None`.
/// * **Update**: runs `on_update`; on error the entity is rolled back.
/// * **List**: returns clones of every entity matching the filter.
/// * **Action**: runs `handle_action`; on error the entity is rolled back. On success the
///   caller receives both the action result and the entity as it now stands.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    unique_keys: HashMap<String, T::Id>,
    next_id: IdGenerator<T::Id>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// * `buffer_size` - capacity of the request channel; callers wait when it is full.
    /// * `next_id` - id generator. It may return an id already in use; the actor retries.
    pub fn new(
        buffer_size: usize,
        next_id: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            unique_keys: HashMap::new(),
            next_id: Box::new(next_id),
        };
        (actor, ResourceClient::new(sender))
    }

    fn allocate_id(&self) -> Result<T::Id, FrameworkError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = (self.next_id)();
            if !self.store.contains_key(&id) {
                return Ok(id);
            }
            debug!(%id, "Generated id already in use, retrying");
        }
        Err(FrameworkError::IdExhausted(MAX_ID_ATTEMPTS))
    }

    async fn create(
        &mut self,
        params: T::Create,
        context: &T::Context,
    ) -> Result<T::Id, FrameworkError> {
        let id = self.allocate_id()?;
        let mut item = T::from_create_params(id.clone(), params)
            .map_err(|e| FrameworkError::EntityError(Box::new(e)))?;
        item.on_create(context)
            .await
            .map_err(|e| FrameworkError::EntityError(Box::new(e)))?;

        if let Some(key) = item.unique_key() {
            if self.unique_keys.contains_key(&key) {
                return Err(FrameworkError::DuplicateKey(key));
            }
            self.unique_keys.insert(key, id.clone());
        }
        self.store.insert(id.clone(), item);
        Ok(id)
    }

    /// Runs the actor's event loop, processing messages until every client is dropped.
    ///
    /// # Context Injection
    /// `context` is handed to every entity hook. It is supplied here rather than in `new()`
    /// so actors can depend on clients of actors created after them.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let result = self.create(params, &context).await;
                    match &result {
                        Ok(id) => info!(entity_type, %id, size = self.store.len(), "Created"),
                        Err(e) => warn!(entity_type, error = %e, "Create failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    debug!(entity_type, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { filter, respond_to } => {
                    let items: Vec<T> = self
                        .store
                        .values()
                        .filter(|item| filter(*item))
                        .cloned()
                        .collect();
                    debug!(entity_type, matched = items.len(), size = self.store.len(), "List");
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update { id, update, respond_to } => {
                    debug!(entity_type, %id, ?update, "Update");
                    let Some(item) = self.store.get_mut(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let before = item.clone();
                    match item.on_update(update, &context).await {
                        Ok(()) => {
                            info!(entity_type, %id, "Updated");
                            let _ = respond_to.send(Ok(item.clone()));
                        }
                        Err(e) => {
                            *item = before;
                            warn!(entity_type, %id, error = %e, "Update failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let Some(item) = self.store.get_mut(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let before = item.clone();
                    match item.handle_action(action, &context).await {
                        Ok(result) => {
                            info!(entity_type, %id, "Action ok");
                            let _ = respond_to.send(Ok((result, item.clone())));
                        }
                        Err(e) => {
                            *item = before;
                            warn!(entity_type, %id, error = %e, "Action failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}
