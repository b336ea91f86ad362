//! Terms-of-service consent record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Acknowledgment sent to the consent log when a device accepts the terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    /// Random identifier generated for this browser profile.
    pub device_id: String,
    /// When the terms were accepted (ISO-8601, UTC).
    pub timestamp: DateTime<Utc>,
}

impl ConsentRecord {
    /// Create a record for the given device at the given instant.
    #[must_use]
    pub fn new(device_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_wire_format() {
        let at = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();
        let record = ConsentRecord::new("k3j2h4g5", at);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["deviceId"], "k3j2h4g5");
        assert_eq!(value["timestamp"], "2025-03-31T12:00:00Z");
    }
}
