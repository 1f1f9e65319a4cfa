//! Assembling a new delivery from the order, its artisan and the caller's shipping data.

use crate::config::EstimateConfig;
use crate::courier::CourierConfig;
use crate::error::DeliveryError;
use crate::model::{
    Address, Artisan, CourierInfo, DeliveryCreate, Order, PackageDetails, Recipient, SenderInfo,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller input for `create_delivery`. Unset recipient fields default to the order's customer
/// and shipping address; an unset pickup address defaults to the artisan's address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingData {
    pub courier_name: String,
    pub package: PackageDetails,
    #[serde(default)]
    pub pickup_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pickup_address: Option<Address>,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub recipient_phone: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<Address>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

impl ShippingData {
    pub fn new(courier_name: impl Into<String>, package: PackageDetails) -> Self {
        Self {
            courier_name: courier_name.into(),
            package,
            pickup_at: None,
            pickup_address: None,
            recipient_name: None,
            recipient_phone: None,
            delivery_address: None,
            special_instructions: None,
        }
    }
}

fn validate_package(package: &PackageDetails) -> Result<(), DeliveryError> {
    if !(package.weight_kg.is_finite() && package.weight_kg > 0.0) {
        return Err(DeliveryError::validation("package weight must be positive"));
    }
    if !(package.declared_value.is_finite() && package.declared_value >= 0.0) {
        return Err(DeliveryError::validation("declared value must not be negative"));
    }
    if let Some(d) = &package.dimensions {
        if [d.length_cm, d.width_cm, d.height_cm]
            .into_iter()
            .any(|side| !(side.is_finite() && side > 0.0))
        {
            return Err(DeliveryError::validation("package dimensions must be positive"));
        }
    }
    Ok(())
}

/// Builds creation params and the delivery estimate.
pub(crate) fn build_delivery(
    order: &Order,
    artisan: &Artisan,
    courier: &CourierConfig,
    data: ShippingData,
    estimate: &EstimateConfig,
    now: DateTime<Utc>,
) -> Result<DeliveryCreate, DeliveryError> {
    validate_package(&data.package)?;
    let address = data
        .delivery_address
        .unwrap_or_else(|| order.shipping_address.clone());
    if address.pincode.trim().is_empty() {
        return Err(DeliveryError::validation("delivery pincode is required"));
    }
    let estimated_delivery = now
        .checked_add_signed(estimate.lead_time(data.package.is_fragile, &address.pincode)?)
        .ok_or_else(|| DeliveryError::validation("delivery estimate is out of range"))?;

    Ok(DeliveryCreate {
        order_ref: order.order_ref.clone(),
        courier: CourierInfo {
            name: courier.name,
            display_name: courier.display_name.clone(),
            contact_phone: courier.contact_phone.clone(),
            contact_email: courier.contact_email.clone(),
            tracking_url_template: courier.tracking_url_template.clone(),
        },
        sender: SenderInfo {
            artisan_ref: artisan.artisan_ref.clone(),
            name: artisan.name.clone(),
            email: artisan.email.clone(),
            phone: artisan.phone.clone(),
            pickup_address: data.pickup_address.unwrap_or_else(|| artisan.address.clone()),
            pickup_at: data.pickup_at,
        },
        recipient: Recipient {
            name: data
                .recipient_name
                .unwrap_or_else(|| order.customer.name.clone()),
            phone: data.recipient_phone.or_else(|| order.customer.phone.clone()),
            email: Some(order.customer.email.clone()),
            address,
            special_instructions: data.special_instructions,
        },
        package: data.package,
        estimated_delivery,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::courier::CourierName;
    use crate::model::{Customer, OrderItem, OrderStatus};
    use chrono::{TimeDelta, TimeZone};

    fn order(pincode: &str) -> Order {
        Order {
            order_ref: "ORD-000007".into(),
            customer: Customer {
                name: "Kavya".into(),
                email: "kavya@example.com".into(),
                phone: Some("+91 98000 00000".into()),
            },
            items: vec![OrderItem {
                product_name: "Terracotta vase".into(),
                quantity: 1,
                unit_price: 1200.0,
                artisan_ref: "ART-0001".into(),
            }],
            shipping_address: Address::new("4 Park Street", "Patna", "Bihar", pincode),
            total: 1300.0,
            shipping_cost: 100.0,
            status: OrderStatus::Placed,
            tracking_number: None,
            placed_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            shipped_at: None,
            delivered_at: None,
        }
    }

    fn artisan() -> Artisan {
        Artisan {
            artisan_ref: "ART-0001".into(),
            name: "Meera Pottery".into(),
            email: "meera@example.com".into(),
            phone: "+91 90000 00001".into(),
            address: Address::new("12 Lake Road", "Jaipur", "Rajasthan", "302001"),
        }
    }

    fn package(is_fragile: bool) -> PackageDetails {
        PackageDetails {
            weight_kg: 2.0,
            dimensions: None,
            declared_value: 1200.0,
            is_fragile,
            requires_signature: false,
        }
    }

    #[test]
    fn fragile_remote_package_gets_seven_days() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let params = build_delivery(
            &order("800001"),
            &artisan(),
            &CourierConfig::builtin(CourierName::IndiaPost),
            ShippingData::new("india post", package(true)),
            &EstimateConfig::default(),
            now,
        )
        .unwrap();
        assert_eq!(params.estimated_delivery, now + TimeDelta::days(7));
        assert_eq!(params.recipient.name, "Kavya");
        assert_eq!(params.recipient.email.as_deref(), Some("kavya@example.com"));
        assert_eq!(params.sender.pickup_address.city, "Jaipur");
    }

    #[test]
    fn rejects_weightless_packages() {
        let mut bad = package(false);
        bad.weight_kg = 0.0;
        let result = build_delivery(
            &order("302001"),
            &artisan(),
            &CourierConfig::builtin(CourierName::Dtdc),
            ShippingData::new("dtdc", bad),
            &EstimateConfig::default(),
            Utc::now(),
        );
        assert!(matches!(result, Err(DeliveryError::Validation(_))));
    }

    #[test]
    fn out_of_range_estimate_is_an_error_not_a_panic() {
        let estimate = EstimateConfig {
            base_days: crate::config::MAX_ESTIMATE_DAYS,
            ..EstimateConfig::default()
        };
        let result = build_delivery(
            &order("302001"),
            &artisan(),
            &CourierConfig::builtin(CourierName::Dtdc),
            ShippingData::new("dtdc", package(false)),
            &estimate,
            DateTime::<Utc>::MAX_UTC - TimeDelta::days(1),
        );
        assert!(matches!(result, Err(DeliveryError::Validation(_))));
    }
}
