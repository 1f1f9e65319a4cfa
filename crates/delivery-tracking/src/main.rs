//! # Delivery Tracking demo
//!
//! Walks one order from shipment to feedback:
//! 1.  Starting the [`DeliverySystem`] (optionally from a TOML config given as the first
//!     argument).
//! 2.  Registering an artisan and placing an order.
//! 3.  Creating the delivery, moving it through the courier statuses and collecting feedback.
//!
//! ```bash
//! RUST_LOG=info cargo run -p delivery-tracking -- delivery.toml
//! ```

use actor_framework::tracing::setup_tracing;
use chrono::Utc;
use delivery_tracking::courier::CourierRegistry;
use delivery_tracking::model::{
    Address, ArtisanCreate, AttemptOutcome, AttemptReport, Customer, DeliveryStatus, IssueKind,
    IssueReport, OrderCreate, OrderItem, PackageDetails, UpdatedBy,
};
use delivery_tracking::notify::TracingDispatcher;
use delivery_tracking::service::{respond, DateRange, ShippingData};
use delivery_tracking::{DeliveryConfig, DeliverySystem};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => DeliveryConfig::from_file(&path).map_err(|e| e.to_string())?,
        None => DeliveryConfig::default(),
    };
    config.validate().map_err(|e| e.to_string())?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let registry = CourierRegistry::from_configs(
        &config.couriers,
        Arc::clone(&clock),
        config.scheduler.courier_timeout(),
    )
    .map_err(|e| e.to_string())?;

    info!("Starting delivery tracking demo");
    let mut system = DeliverySystem::new(config, clock, Arc::new(TracingDispatcher), registry);
    system.start_scheduler();

    let artisan_ref = system
        .artisan_client
        .create_artisan(ArtisanCreate {
            name: "Meera Blue Pottery".to_string(),
            email: "meera@example.com".to_string(),
            phone: "+91 90000 00001".to_string(),
            address: Address::new("12 Lake Road", "Jaipur", "Rajasthan", "302001"),
        })
        .await
        .map_err(|e| e.to_string())?;

    let order_ref = system
        .order_client
        .create_order(OrderCreate {
            customer: Customer {
                name: "Kavya Rao".to_string(),
                email: "kavya@example.com".to_string(),
                phone: Some("+91 98000 00000".to_string()),
            },
            items: vec![OrderItem {
                product_name: "Blue glazed vase".to_string(),
                quantity: 1,
                unit_price: 1800.0,
                artisan_ref: artisan_ref.clone(),
            }],
            shipping_address: Address::new("4 Park Street", "Kolkata", "West Bengal", "700016"),
            shipping_cost: 120.0,
            placed_at: Utc::now(),
        })
        .await
        .map_err(|e| e.to_string())?;
    info!(%artisan_ref, %order_ref, "Order placed");

    let service = system.service.clone();
    let span = tracing::info_span!("delivery_flow", %order_ref);
    let flow = async {
        let shipping = ShippingData::new(
            "Blue Dart",
            PackageDetails {
                weight_kg: 1.4,
                dimensions: None,
                declared_value: 1800.0,
                is_fragile: true,
                requires_signature: true,
            },
        );
        let record = service.create_delivery(&order_ref, shipping).await?;
        let tn = record.tracking_number().clone();

        for (status, location) in [
            (DeliveryStatus::PickedUp, "Jaipur hub"),
            (DeliveryStatus::InTransit, "Delhi sorting centre"),
            (DeliveryStatus::OutForDelivery, "Kolkata"),
        ] {
            service
                .update_delivery_status(&tn, status, Some(location.to_string()), None, UpdatedBy::Courier)
                .await?;
        }

        let attempt = AttemptReport::new(AttemptOutcome::Delivered, UpdatedBy::Courier)
            .with_signature("K. Rao");
        service.add_delivery_attempt(&tn, attempt).await?;
        service
            .submit_feedback(&tn, 5, Some("Packed beautifully".to_string()))
            .await?;
        service
            .report_delivery_issue(
                &tn,
                IssueReport {
                    kind: IssueKind::Other,
                    description: "Invoice missing from the parcel".to_string(),
                    reported_by: UpdatedBy::Customer,
                },
            )
            .await?;

        let view = service.track_delivery(&tn).await?;
        info!(
            tracking_number = %view.tracking_number,
            status = %view.current_status,
            progress = view.progress_percentage,
            "Tracking view"
        );
        service
            .get_delivery_stats(&artisan_ref, DateRange::default())
            .await
    }
    .instrument(span);

    match respond(flow.await) {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(json) => info!("Artisan stats:\n{json}"),
            Err(e) => error!(error = %e, "Could not render stats"),
        },
        Err(e) => error!(error = %e, "Delivery store unavailable"),
    }

    drop(service);
    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
