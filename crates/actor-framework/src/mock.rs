//! # Mock Framework
//!
//! Test doubles that speak the same channel protocol as a real [`ResourceActor`](crate::ResourceActor).
//!
//! | | `MockClient` | Real actor |
//! |---|---|---|
//! | **State** | Scripted responses | Real store |
//! | **Use case** | Logic *around* a client (services, wrappers) | The entity itself, whole system |
//! | **Error injection** | `return_err` | Requires reaching the failing state |
//!
//! Two styles are available:
//!
//! - [`MockClient`]: queue expectations up front, run the code under test, then `verify()`.
//! - [`create_mock_client`] plus the `expect_*` helpers: drive the receiver by hand and answer
//!   each request yourself, which is handy when the response depends on the request payload.
//!
//! Expectations are matched strictly in order. A request that does not match the next queued
//! expectation panics the mock task, and the client sees `ActorDropped`.

use crate::{ActorEntity, FrameworkError, ResourceClient, ResourceRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

enum Expectation<T: ActorEntity> {
    Get {
        response: Result<Option<T>, FrameworkError>,
    },
    Create {
        response: Result<T::Id, FrameworkError>,
    },
    Update {
        response: Result<T, FrameworkError>,
    },
    List {
        response: Result<Vec<T>, FrameworkError>,
    },
    Action {
        response: Result<(T::ActionResult, T), FrameworkError>,
    },
}

impl<T: ActorEntity> Expectation<T> {
    fn name(&self) -> &'static str {
        match self {
            Expectation::Get { .. } => "Get",
            Expectation::Create { .. } => "Create",
            Expectation::Update { .. } => "Update",
            Expectation::List { .. } => "List",
            Expectation::Action { .. } => "Action",
        }
    }
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock client with expectation tracking.
///
/// ```ignore
/// let mut mock = MockClient::<Order>::new();
/// mock.expect_get().return_ok(Some(order));
/// let client = OrderClient::new(mock.client());
/// // exercise code that uses `client`...
/// mock.verify();
/// ```
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Queue<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let queue = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = queue.lock().expect("mock queue poisoned").pop_front();
                match (request, expectation) {
                    (ResourceRequest::Get { respond_to, .. }, Some(Expectation::Get { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Create { respond_to, .. }, Some(Expectation::Create { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Update { respond_to, .. }, Some(Expectation::Update { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::List { respond_to, .. }, Some(Expectation::List { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Action { respond_to, .. }, Some(Expectation::Action { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (request, expectation) => {
                        panic!(
                            "Unexpected request {:?}; next expectation was {}",
                            request,
                            expectation.as_ref().map_or("nothing", Expectation::name)
                        );
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns a client wired to this mock.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Expects a `get` request.
    pub fn expect_get(&mut self) -> ExpectationBuilder<T, Option<T>> {
        self.builder(|response| Expectation::Get { response })
    }

    /// Expects a `create` request.
    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T::Id> {
        self.builder(|response| Expectation::Create { response })
    }

    /// Expects an `update` request.
    pub fn expect_update(&mut self) -> ExpectationBuilder<T, T> {
        self.builder(|response| Expectation::Update { response })
    }

    /// Expects a `list` request. The filter is not evaluated; the scripted items are returned.
    pub fn expect_list(&mut self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(|response| Expectation::List { response })
    }

    /// Expects an `action` request.
    pub fn expect_action(&mut self) -> ExpectationBuilder<T, (T::ActionResult, T)> {
        self.builder(|response| Expectation::Action { response })
    }

    fn builder<R>(
        &mut self,
        wrap: fn(Result<R, FrameworkError>) -> Expectation<T>,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            expectations: self.expectations.clone(),
            wrap,
        }
    }

    /// Panics unless every queued expectation has been consumed.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().expect("mock queue poisoned").len();
        assert!(
            remaining == 0,
            "Not all expectations were met. {remaining} remaining"
        );
    }
}

/// Completes an expectation with the response the mock should send back.
pub struct ExpectationBuilder<T: ActorEntity, R> {
    expectations: Queue<T>,
    wrap: fn(Result<R, FrameworkError>) -> Expectation<T>,
}

impl<T: ActorEntity, R> ExpectationBuilder<T, R> {
    /// Answers the request with `Ok(value)`.
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    /// Answers the request with `Err(error)`.
    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<R, FrameworkError>) {
        self.expectations
            .lock()
            .expect("mock queue poisoned")
            .push_back((self.wrap)(response));
    }
}

// =============================================================================
// MANUAL HELPERS
// =============================================================================

/// Creates a client whose requests land on the returned receiver.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Responder for a request that expects `R` back.
pub type Responder<R> = oneshot::Sender<Result<R, FrameworkError>>;

/// Waits for the next request and returns it if it is a `Get`.
pub async fn expect_get<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Responder<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Waits for the next request and returns it if it is a `Create`.
pub async fn expect_create<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Create, Responder<T::Id>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Waits for the next request and returns it if it is an `Action`.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Responder<(T::ActionResult, T)>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Clone, Debug, PartialEq)]
    struct Parcel {
        id: String,
        weight_grams: u32,
    }

    #[derive(Debug)]
    struct ParcelCreate {
        weight_grams: u32,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("parcel error")]
    struct ParcelError;

    #[async_trait]
    impl ActorEntity for Parcel {
        type Id = String;
        type Create = ParcelCreate;
        type Update = ();
        type Action = ();
        type ActionResult = ();
        type Context = ();
        type Error = ParcelError;

        fn from_create_params(id: String, params: ParcelCreate) -> Result<Self, Self::Error> {
            Ok(Self {
                id,
                weight_grams: params.weight_grams,
            })
        }

        async fn on_update(&mut self, _: (), _: &()) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn handle_action(&mut self, _: (), _: &()) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn manual_helpers_capture_the_payload() {
        let (client, mut receiver) = create_mock_client::<Parcel>(10);

        let task = tokio::spawn(async move { client.create(ParcelCreate { weight_grams: 750 }).await });

        let (params, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(params.weight_grams, 750);
        responder.send(Ok("parcel_1".to_string())).unwrap();

        assert_eq!(task.await.unwrap().unwrap(), "parcel_1");
    }

    #[tokio::test]
    async fn scripted_expectations_are_served_in_order() {
        let mut mock = MockClient::<Parcel>::new();
        let parcel = Parcel {
            id: "parcel_1".into(),
            weight_grams: 750,
        };
        mock.expect_create().return_ok("parcel_1".to_string());
        mock.expect_list().return_ok(vec![parcel.clone()]);
        mock.expect_get().return_err(FrameworkError::ActorClosed);

        let client = mock.client();
        let id = client.create(ParcelCreate { weight_grams: 750 }).await.unwrap();
        assert_eq!(id, "parcel_1");
        let listed = client.list(|p| p.weight_grams > 100).await.unwrap();
        assert_eq!(listed, vec![parcel]);
        let err = client.get(id).await.unwrap_err();
        assert!(err.is_unavailable());

        mock.verify();
    }
}
