mod support;

use actor_framework::mock::MockClient;
use actor_framework::FrameworkError;
use chrono::TimeDelta;
use delivery_tracking::clients::{ArtisanClient, DeliveryClient, OrderClient};
use delivery_tracking::config::DeliveryConfig;
use delivery_tracking::courier::{CourierConfig, CourierName, CourierRegistry};
use delivery_tracking::delivery_actor::DeliveryContext;
use delivery_tracking::model::{
    Address, Artisan, CourierInfo, Customer, DeliveryCreate, DeliveryStatus, EventOrigin, Order,
    OrderItem, OrderStatus, Recipient, SenderInfo, StatusEvent, TransitionPolicy, UpdatedBy,
};
use delivery_tracking::service::{DeliveryService, ShippingData};
use delivery_tracking::DeliveryError;
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use support::{package, t0, MutableClock, RecordingDispatcher};

fn params(order_ref: &str) -> DeliveryCreate {
    let address = Address::new("12 Lake Road", "Jaipur", "Rajasthan", "302001");
    DeliveryCreate {
        order_ref: order_ref.to_string(),
        courier: CourierInfo {
            name: CourierName::Dtdc,
            display_name: "DTDC".into(),
            contact_phone: None,
            contact_email: None,
            tracking_url_template: "https://track.example/{trackingNumber}".into(),
        },
        sender: SenderInfo {
            artisan_ref: "ART-0001".into(),
            name: "Meera Pottery".into(),
            email: "meera@example.com".into(),
            phone: "+91 90000 00001".into(),
            pickup_address: address.clone(),
            pickup_at: None,
        },
        recipient: Recipient {
            name: "Arjun".into(),
            phone: None,
            email: Some("arjun@example.com".into()),
            address,
            special_instructions: None,
        },
        package: package(500.0),
        estimated_delivery: t0() + TimeDelta::days(4),
        created_at: t0(),
    }
}

fn start_actor(clock: Arc<MutableClock>) -> (DeliveryClient, tokio::task::JoinHandle<()>) {
    let (actor, client) = delivery_tracking::delivery_actor::new(8, clock.clone());
    let handle = tokio::spawn(actor.run(DeliveryContext {
        policy: TransitionPolicy::Strict,
        clock,
    }));
    (client, handle)
}

/// Tracking numbers stay unique even when every create sees the same instant.
#[tokio::test]
async fn tracking_numbers_are_unique_under_a_frozen_clock() {
    let clock = Arc::new(MutableClock::new(t0()));
    let (client, handle) = start_actor(clock);

    let mut seen = HashSet::new();
    for n in 0..60 {
        let tn = client.create(params(&format!("ORD-{n:06}"))).await.unwrap();
        assert!(tn.as_str().starts_with("AM"));
        assert!(seen.insert(tn));
    }

    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn one_delivery_per_order() {
    let clock = Arc::new(MutableClock::new(t0()));
    let (client, handle) = start_actor(clock);

    client.create(params("ORD-000001")).await.unwrap();
    let duplicate = client.create(params("ORD-000001")).await;
    assert!(matches!(duplicate, Err(DeliveryError::Conflict(_))));

    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn rejected_append_leaves_record_untouched() {
    let clock = Arc::new(MutableClock::new(t0()));
    let (client, handle) = start_actor(clock.clone());
    let tn = client.create(params("ORD-000001")).await.unwrap();
    let before = client.fetch(&tn).await.unwrap();

    clock.advance(TimeDelta::hours(1));
    let illegal = StatusEvent::new(DeliveryStatus::Delivered, clock.utc(), UpdatedBy::Artisan);
    let result = client.append_status(&tn, illegal, EventOrigin::Manual).await;

    assert!(matches!(result, Err(DeliveryError::Validation(_))));
    assert_eq!(client.fetch(&tn).await.unwrap(), before);

    drop(client);
    handle.await.unwrap();
}

/// Concurrent writers to one record are applied one at a time; none is lost.
#[tokio::test]
async fn concurrent_appends_are_serialized() {
    let clock = Arc::new(MutableClock::new(t0()));
    let (client, handle) = start_actor(clock.clone());
    let tn = client.create(params("ORD-000001")).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let client = client.clone();
        let tn = tn.clone();
        let at = t0() + TimeDelta::minutes(20 - i);
        tasks.push(tokio::spawn(async move {
            let event = StatusEvent::new(DeliveryStatus::InTransit, at, UpdatedBy::Courier);
            client.append_status(&tn, event, EventOrigin::Manual).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let record = client.fetch(&tn).await.unwrap();
    assert_eq!(record.timeline().len(), 21);
    assert!(record
        .timeline()
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));

    drop(client);
    handle.await.unwrap();
}

/// Real delivery actor with mocked order and artisan stores: a failed order write-back must
/// not undo or fail the delivery.
#[tokio::test]
async fn order_write_back_failure_is_not_fatal() {
    let clock = Arc::new(MutableClock::new(t0()));
    let (delivery_client, handle) = start_actor(clock.clone());

    let mut order_mock = MockClient::<Order>::new();
    let mut artisan_mock = MockClient::<Artisan>::new();
    order_mock.expect_get().return_ok(Some(Order {
        order_ref: "ORD-000001".into(),
        customer: Customer {
            name: "Arjun".into(),
            email: "arjun@example.com".into(),
            phone: None,
        },
        items: vec![OrderItem {
            product_name: "Brass bell".into(),
            quantity: 1,
            unit_price: 400.0,
            artisan_ref: "ART-0001".into(),
        }],
        shipping_address: Address::new("4 Park Street", "Kolkata", "West Bengal", "700016"),
        total: 480.0,
        shipping_cost: 80.0,
        status: OrderStatus::Confirmed,
        tracking_number: None,
        placed_at: t0(),
        shipped_at: None,
        delivered_at: None,
    }));
    order_mock.expect_action().return_err(FrameworkError::ActorClosed);
    artisan_mock.expect_get().return_ok(Some(Artisan {
        artisan_ref: "ART-0001".into(),
        name: "Meera Pottery".into(),
        email: "meera@example.com".into(),
        phone: "+91 90000 00001".into(),
        address: Address::new("12 Lake Road", "Jaipur", "Rajasthan", "302001"),
    }));

    let mut registry = CourierRegistry::new();
    registry.register(
        CourierConfig::builtin(CourierName::BlueDart),
        Arc::new(support::FakeCourier::new()),
    );
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = DeliveryService::new(
        delivery_client.clone(),
        OrderClient::new(order_mock.client()),
        ArtisanClient::new(artisan_mock.client()),
        Arc::new(registry),
        dispatcher.clone(),
        clock,
        Arc::new(DeliveryConfig::default()),
    );

    let record = service
        .create_delivery("ORD-000001", ShippingData::new("bluedart", package(400.0)))
        .await
        .unwrap();
    assert_eq!(record.order_ref, "ORD-000001");
    assert_eq!(dispatcher.emails().len(), 1);
    order_mock.verify();
    artisan_mock.verify();

    drop(service);
    drop(delivery_client);
    handle.await.unwrap();
}
