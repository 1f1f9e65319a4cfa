//! Public shipment identifiers.

use crate::error::DeliveryError;
use chrono::{DateTime, Utc};
use mockable::Clock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const PREFIX: &str = "AM";

/// Tracking number: `AM` + last 8 digits of the creation epoch millis + 3-digit random suffix.
///
/// Assigned once by the delivery store when the record is created and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Builds the tracking number for a creation instant and a random suffix in `0..1000`.
    pub fn generate(created_at: DateTime<Utc>, suffix: u16) -> Self {
        let millis = created_at.timestamp_millis().rem_euclid(100_000_000);
        Self(format!("{PREFIX}{millis:08}{:03}", suffix % 1000))
    }

    /// Parses a caller-supplied tracking number, checking only the overall shape.
    pub fn parse(raw: &str) -> Result<Self, DeliveryError> {
        let raw = raw.trim();
        let digits = raw.strip_prefix(PREFIX).unwrap_or_default();
        if digits.len() != 11 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DeliveryError::validation(format!("malformed tracking number '{raw}'")));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Id generator for the delivery store: reads the clock and draws a fresh random suffix.
pub fn tracking_number_generator(
    clock: Arc<dyn Clock>,
) -> impl Fn() -> TrackingNumber + Send + Sync + 'static {
    move || TrackingNumber::generate(clock.utc(), rand::rng().random_range(0..1000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_is_prefix_eight_digits_and_padded_suffix() {
        // 1_700_000_123_456 ms -> last eight digits 00123456
        let at = Utc.timestamp_millis_opt(1_700_000_123_456).unwrap();
        assert_eq!(TrackingNumber::generate(at, 7).as_str(), "AM00123456007");
        assert_eq!(TrackingNumber::generate(at, 999).as_str(), "AM00123456999");
    }

    #[test]
    fn parse_checks_shape() {
        assert!(TrackingNumber::parse("AM00123456007").is_ok());
        assert!(TrackingNumber::parse("XX00123456007").is_err());
        assert!(TrackingNumber::parse("AM0012345600").is_err());
        assert!(TrackingNumber::parse("AM0012345600x").is_err());
    }
}
