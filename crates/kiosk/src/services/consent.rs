//! Terms-of-service acceptance.
//!
//! Acceptance is optimistic: the consent log is informed, but the device is
//! treated as having accepted whether or not that call succeeds.

use async_trait::async_trait;
use chrono::Utc;
use print_counter_core::ConsentRecord;
use rand::Rng;
use tracing::{info, instrument, warn};

use crate::services::gallery::{Ack, GalleryClient, GalleryError};

/// Length of generated device identifiers.
const DEVICE_ID_LENGTH: usize = 24;

/// Remote log of terms acceptance.
#[async_trait]
pub trait ConsentLog: Send + Sync {
    /// Record that a device accepted the terms.
    async fn record(&self, record: &ConsentRecord) -> Result<Ack, GalleryError>;
}

#[async_trait]
impl ConsentLog for GalleryClient {
    async fn record(&self, record: &ConsentRecord) -> Result<Ack, GalleryError> {
        self.log_consent(record).await
    }
}

/// Generate a random opaque device identifier.
#[must_use]
pub fn generate_device_id() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(DEVICE_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Accept the terms under a fresh device id.
///
/// Returns the record to remember on the device. A failed consent log call is
/// logged and otherwise ignored.
#[instrument(skip_all)]
pub async fn accept_terms<L>(log: &L) -> ConsentRecord
where
    L: ConsentLog + ?Sized,
{
    let record = ConsentRecord::new(generate_device_id(), Utc::now());

    match log.record(&record).await {
        Ok(ack) => info!(device_id = %record.device_id, ack = %ack, "Consent logged"),
        Err(e) => warn!(device_id = %record.device_id, error = %e, "Consent logging failed"),
    }

    record
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FakeLog {
        fail: bool,
        records: Mutex<Vec<ConsentRecord>>,
    }

    impl FakeLog {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                records: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ConsentLog for FakeLog {
        async fn record(&self, record: &ConsentRecord) -> Result<Ack, GalleryError> {
            self.records.lock().unwrap().push(record.clone());
            if self.fail {
                return Err(GalleryError::Api {
                    status: 500,
                    message: "down".to_string(),
                });
            }
            Ok(serde_json::json!({ "message": "Consent logged" }))
        }
    }

    #[test]
    fn test_device_id_shape() {
        let id = generate_device_id();
        assert_eq!(id.len(), DEVICE_ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, generate_device_id());
    }

    #[tokio::test]
    async fn test_accept_sends_record() {
        let log = FakeLog::new(false);

        let record = accept_terms(&log).await;

        assert_eq!(record.device_id.len(), DEVICE_ID_LENGTH);
        assert_eq!(log.records.lock().unwrap().as_slice(), &[record]);
    }

    #[tokio::test]
    async fn test_accept_is_optimistic_when_log_fails() {
        let log = FakeLog::new(true);

        let record = accept_terms(&log).await;

        assert_eq!(log.records.lock().unwrap().as_slice(), &[record]);
    }
}
