use serde::{Deserialize, Serialize};

/// Postal address shared by orders, artisans and delivery parties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
}

impl Address {
    pub fn new(
        line1: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        pincode: impl Into<String>,
    ) -> Self {
        Self {
            line1: line1.into(),
            line2: None,
            city: city.into(),
            state: state.into(),
            pincode: pincode.into(),
            country: "India".to_string(),
        }
    }

    /// Single-line rendering used in messages and logs.
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref() {
            parts.push(line2);
        }
        parts.extend([self.city.as_str(), self.state.as_str(), self.pincode.as_str()]);
        parts.join(", ")
    }
}
