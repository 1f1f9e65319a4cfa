use super::{
    CourierAdapter, CourierConfig, CourierName, HttpCourierAdapter, SyntheticCourierAdapter,
};
use crate::config::ConfigError;
use crate::error::DeliveryError;
use crate::model::TrackingNumber;
use mockable::Clock;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Config and adapter for one carrier.
#[derive(Clone)]
pub struct CourierEntry {
    pub config: CourierConfig,
    pub adapter: Arc<dyn CourierAdapter>,
}

/// Resolves carrier names to their settings and tracking adapters.
#[derive(Clone, Default)]
pub struct CourierRegistry {
    entries: HashMap<CourierName, CourierEntry>,
}

impl CourierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every supported carrier with built-in settings and the synthetic adapter.
    pub fn with_synthetic_adapters(clock: Arc<dyn Clock>) -> Self {
        let synthetic: Arc<dyn CourierAdapter> = Arc::new(SyntheticCourierAdapter::new(clock));
        let mut registry = Self::new();
        for name in CourierName::ALL {
            registry.register(CourierConfig::builtin(name), synthetic.clone());
        }
        registry
    }

    /// Built-in carriers overlaid with `configs`. A carrier with an `api_endpoint` gets an
    /// HTTP adapter; the rest keep the synthetic one.
    pub fn from_configs(
        configs: &[CourierConfig],
        clock: Arc<dyn Clock>,
        request_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let synthetic: Arc<dyn CourierAdapter> = Arc::new(SyntheticCourierAdapter::new(clock.clone()));
        let mut registry = Self::with_synthetic_adapters(clock);
        for config in configs {
            if !config.tracking_url_template.contains("{trackingNumber}") {
                return Err(ConfigError::Invalid(format!(
                    "tracking URL template for {} lacks {{trackingNumber}}",
                    config.name
                )));
            }
            let adapter: Arc<dyn CourierAdapter> = match &config.api_endpoint {
                Some(endpoint) => {
                    let endpoint = Url::parse(endpoint).map_err(|e| {
                        ConfigError::Invalid(format!("api endpoint for {}: {e}", config.name))
                    })?;
                    let http =
                        HttpCourierAdapter::new(endpoint, config.api_key.clone(), request_timeout)
                            .map_err(|e| ConfigError::Invalid(format!("http client: {e}")))?;
                    Arc::new(http)
                }
                None => synthetic.clone(),
            };
            registry.register(config.clone(), adapter);
        }
        Ok(registry)
    }

    /// Adds or replaces a carrier.
    pub fn register(&mut self, config: CourierConfig, adapter: Arc<dyn CourierAdapter>) {
        self.entries
            .insert(config.name, CourierEntry { config, adapter });
    }

    pub fn get(&self, name: CourierName) -> Result<&CourierEntry, DeliveryError> {
        self.entries
            .get(&name)
            .ok_or_else(|| DeliveryError::validation(format!("courier {name} is not configured")))
    }

    /// Parses a caller-supplied carrier name and looks it up.
    pub fn resolve(&self, raw: &str) -> Result<&CourierEntry, DeliveryError> {
        if raw.trim().is_empty() {
            return Err(DeliveryError::validation("courier name is required"));
        }
        self.get(raw.parse()?)
    }

    pub fn tracking_url(
        &self,
        name: CourierName,
        tracking_number: &TrackingNumber,
    ) -> Result<String, DeliveryError> {
        Ok(self.get(name)?.config.tracking_url(tracking_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;

    #[test]
    fn resolves_known_and_rejects_unknown() {
        let registry = CourierRegistry::with_synthetic_adapters(Arc::new(DefaultClock));
        let entry = registry.resolve("Blue Dart").unwrap();
        assert_eq!(entry.config.name, CourierName::BlueDart);
        assert!(matches!(registry.resolve(""), Err(DeliveryError::Validation(_))));
        assert!(matches!(registry.resolve("Owl Post"), Err(DeliveryError::Validation(_))));
        assert!(matches!(
            CourierRegistry::new().get(CourierName::Dtdc),
            Err(DeliveryError::Validation(_))
        ));
    }

    #[test]
    fn overrides_replace_builtins() {
        let mut config = CourierConfig::builtin(CourierName::Dtdc);
        config.tracking_url_template = "https://dtdc.example/t/{trackingNumber}".into();
        config.api_endpoint = Some("https://api.dtdc.example/track".into());
        let registry =
            CourierRegistry::from_configs(&[config], Arc::new(DefaultClock), Duration::from_secs(3))
                .unwrap();
        let tn = TrackingNumber::parse("AM00123456007").unwrap();
        assert_eq!(
            registry.tracking_url(CourierName::Dtdc, &tn).unwrap(),
            "https://dtdc.example/t/AM00123456007"
        );
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let mut config = CourierConfig::builtin(CourierName::Xpressbees);
        config.tracking_url_template = "https://xb.example/track".into();
        let result =
            CourierRegistry::from_configs(&[config], Arc::new(DefaultClock), Duration::from_secs(3));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
