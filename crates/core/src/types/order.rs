//! The order snapshot and payment types.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::customer::CustomerName;
use super::image::{ImageId, Selection};

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Paid in cash at the counter when the prints are collected.
    Cash,
    /// Paid up front through PayPal.
    Paypal,
}

impl PaymentMethod {
    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Paypal => "paypal",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable record of one checkout attempt.
///
/// The same value is the body sent to the order service, the body sent to the
/// print service, and the receipt shown on the confirmation screen. Field
/// names on the wire match the order service:
///
/// ```json
/// {"name":"Ana","selectedImages":["a.jpg"],"paymentMethod":"cash","orderID":null}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Name the order is placed under.
    pub name: String,
    /// Images in selection order.
    #[serde(rename = "selectedImages")]
    pub selected_images: Vec<ImageId>,
    /// Chosen payment method.
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethod,
    /// Provider order ID for PayPal payments, `null` for cash.
    #[serde(rename = "orderID")]
    pub payment_reference: Option<String>,
}

impl OrderSnapshot {
    /// Snapshot the current basket.
    #[must_use]
    pub fn new(
        name: &CustomerName,
        selection: &Selection,
        payment_method: PaymentMethod,
        payment_reference: Option<String>,
    ) -> Self {
        Self {
            name: name.as_str().to_owned(),
            selected_images: selection.as_slice().to_vec(),
            payment_method,
            payment_reference,
        }
    }

    /// Number of images in the order.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.selected_images.len()
    }
}

/// Status string returned by the payment provider's capture endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureStatus(String);

impl CaptureStatus {
    /// The only status that counts as a successful capture.
    pub const COMPLETED: &'static str = "COMPLETED";

    /// Wrap a status string as returned by the provider.
    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// `true` only for exactly `"COMPLETED"`.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.0 == Self::COMPLETED
    }

    /// Returns the raw status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn basket() -> (CustomerName, Selection) {
        let mut selection = Selection::default();
        selection.toggle("a.jpg".into());
        selection.toggle("b.jpg".into());
        (CustomerName::parse("Ana").unwrap(), selection)
    }

    #[test]
    fn test_cash_snapshot_wire_format() {
        let (name, selection) = basket();
        let snapshot = OrderSnapshot::new(&name, &selection, PaymentMethod::Cash, None);

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "Ana",
                "selectedImages": ["a.jpg", "b.jpg"],
                "paymentMethod": "cash",
                "orderID": null,
            })
        );
    }

    #[test]
    fn test_paypal_snapshot_carries_reference() {
        let (name, selection) = basket();
        let snapshot = OrderSnapshot::new(
            &name,
            &selection,
            PaymentMethod::Paypal,
            Some("5O190127TN364715T".to_string()),
        );

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["paymentMethod"], "paypal");
        assert_eq!(value["orderID"], "5O190127TN364715T");
        assert_eq!(snapshot.image_count(), 2);
    }

    #[test]
    fn test_snapshot_parses_legacy_body() {
        let snapshot: OrderSnapshot = serde_json::from_str(
            r#"{"name":"Ana","selectedImages":["a.jpg"],"paymentMethod":"cash","orderID":null}"#,
        )
        .unwrap();
        assert_eq!(snapshot.name, "Ana");
        assert_eq!(snapshot.payment_reference, None);
    }

    #[test]
    fn test_capture_status_only_exact_completed() {
        assert!(CaptureStatus::new("COMPLETED").is_completed());
        assert!(!CaptureStatus::new("PENDING").is_completed());
        assert!(!CaptureStatus::new("completed").is_completed());
        assert!(!CaptureStatus::new("COMPLETED ").is_completed());
        assert!(!CaptureStatus::new("").is_completed());
    }

    #[test]
    fn test_payment_method_display() {
        assert_eq!(PaymentMethod::Cash.to_string(), "cash");
        assert_eq!(PaymentMethod::Paypal.to_string(), "paypal");
    }
}
