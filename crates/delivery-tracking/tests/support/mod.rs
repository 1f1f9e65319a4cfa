//! Shared fixtures for the integration tests: a hand-driven clock, a scripted courier and a
//! dispatcher that records what it was asked to send.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use delivery_tracking::courier::{
    CourierAdapter, CourierConfig, CourierError, CourierName, CourierRegistry,
};
use delivery_tracking::model::{
    Address, ArtisanCreate, Customer, DeliveryRecord, DeliveryStatus, OrderCreate, OrderItem,
    PackageDetails, StatusEvent, TrackingNumber, UpdatedBy,
};
use delivery_tracking::notify::{NotificationDispatcher, NotifyError};
use delivery_tracking::service::{DeliveryService, ShippingData};
use delivery_tracking::{DeliveryConfig, DeliverySystem};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.0.lock().expect("clock mutex");
        *now += by;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock mutex")
    }
}

#[derive(Debug, Clone)]
pub enum Script {
    Events(Vec<StatusEvent>),
    Fail(CourierError),
    /// Never answers within any sane timeout.
    Hang,
}

/// Courier whose answers are set by the test, per tracking number or as a default.
pub struct FakeCourier {
    default: Mutex<Script>,
    overrides: Mutex<HashMap<TrackingNumber, Script>>,
    calls: AtomicUsize,
}

impl FakeCourier {
    pub fn new() -> Self {
        Self {
            default: Mutex::new(Script::Events(Vec::new())),
            overrides: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_default(&self, script: Script) {
        *self.default.lock().expect("script mutex") = script;
    }

    pub fn set_for(&self, tracking_number: &TrackingNumber, script: Script) {
        self.overrides
            .lock()
            .expect("script mutex")
            .insert(tracking_number.clone(), script);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CourierAdapter for FakeCourier {
    async fn fetch_updates(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Vec<StatusEvent>, CourierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .overrides
            .lock()
            .expect("script mutex")
            .get(tracking_number)
            .cloned()
            .unwrap_or_else(|| self.default.lock().expect("script mutex").clone());
        match script {
            Script::Events(events) => Ok(events),
            Script::Fail(e) => Err(e),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                Ok(Vec::new())
            }
        }
    }
}

pub fn courier_event(status: DeliveryStatus, at: DateTime<Utc>) -> StatusEvent {
    StatusEvent::new(status, at, UpdatedBy::Courier).at_location("Hub")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub channel: &'static str,
    pub to: String,
    /// Email subject, or the SMS text.
    pub text: String,
}

#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Sent>>,
    fail_all: AtomicBool,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().expect("sent mutex").clone()
    }

    pub fn emails(&self) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| s.channel == "email")
            .collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.sent()
            .iter()
            .filter(|s| s.text.contains(needle))
            .count()
    }

    pub fn clear(&self) {
        self.sent.lock().expect("sent mutex").clear();
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    fn push(&self, channel: &'static str, to: &str, text: &str) -> Result<(), NotifyError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(NotifyError::Provider("provider down".into()));
        }
        self.sent.lock().expect("sent mutex").push(Sent {
            channel,
            to: to.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send_email(&self, to: &str, subject: &str, _body_html: &str) -> Result<(), NotifyError> {
        self.push("email", to, subject)
    }

    async fn send_sms(&self, to: &str, message: &str) -> Result<(), NotifyError> {
        self.push("sms", to, message)
    }
}

/// A running system with every carrier backed by one [`FakeCourier`].
pub struct Harness {
    pub system: DeliverySystem,
    pub clock: Arc<MutableClock>,
    pub courier: Arc<FakeCourier>,
    pub dispatcher: Arc<RecordingDispatcher>,
}

impl Harness {
    pub fn start() -> Self {
        Self::with_config(DeliveryConfig::default())
    }

    pub fn with_config(config: DeliveryConfig) -> Self {
        let clock = Arc::new(MutableClock::new(t0()));
        let courier = Arc::new(FakeCourier::new());
        let dispatcher = Arc::new(RecordingDispatcher::default());

        let mut registry = CourierRegistry::new();
        for name in CourierName::ALL {
            registry.register(CourierConfig::builtin(name), courier.clone());
        }
        let system = DeliverySystem::new(config, clock.clone(), dispatcher.clone(), registry);
        Self {
            system,
            clock,
            courier,
            dispatcher,
        }
    }

    pub fn service(&self) -> &DeliveryService {
        &self.system.service
    }

    /// Registers an artisan and places a one-item order from them.
    pub async fn place_order(&self) -> (String, String) {
        let artisan_ref = self
            .system
            .artisan_client
            .create_artisan(ArtisanCreate {
                name: "Meera Pottery".into(),
                email: "meera@example.com".into(),
                phone: "+91 90000 00001".into(),
                address: Address::new("12 Lake Road", "Jaipur", "Rajasthan", "302001"),
            })
            .await
            .expect("create artisan");
        let order_ref = self.place_order_from(&artisan_ref).await;
        (artisan_ref, order_ref)
    }

    pub async fn place_order_from(&self, artisan_ref: &str) -> String {
        self.system
            .order_client
            .create_order(OrderCreate {
                customer: Customer {
                    name: "Arjun".into(),
                    email: "arjun@example.com".into(),
                    phone: Some("+91 90000 00002".into()),
                },
                items: vec![OrderItem {
                    product_name: "Terracotta lamp".into(),
                    quantity: 2,
                    unit_price: 750.0,
                    artisan_ref: artisan_ref.to_string(),
                }],
                shipping_address: Address::new("4 Park Street", "Kolkata", "West Bengal", "700016"),
                shipping_cost: 80.0,
                placed_at: self.clock.utc(),
            })
            .await
            .expect("create order")
    }

    pub async fn ship(&self, order_ref: &str) -> DeliveryRecord {
        self.service()
            .create_delivery(order_ref, ShippingData::new("delhivery", package(1500.0)))
            .await
            .expect("create delivery")
    }

    pub async fn shutdown(self) {
        self.system.shutdown().await.expect("clean shutdown");
    }
}

pub fn package(declared_value: f64) -> PackageDetails {
    PackageDetails {
        weight_kg: 1.5,
        dimensions: None,
        declared_value,
        is_fragile: false,
        requires_signature: false,
    }
}
