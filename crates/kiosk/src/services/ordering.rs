//! Order submission flow.
//!
//! Drives [`CheckoutPhase`] through the two checkout paths:
//!
//! ```text
//! cash:   guard ─► snapshot to mailbox ─► submit order ─► spawn print ─► reset basket
//! paypal: guard ─► create ─► (customer approves) ─► capture == COMPLETED ─► cash path from "snapshot"
//! ```
//!
//! The print request is spawned and never awaited on the request path; its
//! failure is logged and does not fail the order. Capture always precedes
//! order submission, and a capture with any status other than `COMPLETED`
//! never reaches the order service.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use print_counter_core::{
    CaptureStatus, CheckoutEvent, CheckoutPhase, CustomerName, OrderSnapshot, PaymentMethod,
    Price, TransitionError, basket_total,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tower_sessions::session::Error as SessionError;
use tracing::{Instrument, info, instrument, warn};

use crate::error::add_breadcrumb;
use crate::models::{Basket, CapturedPayment, KioskSession};
use crate::services::gallery::{Ack, GalleryError};

/// Records orders and drives the counter printer.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Persist the order. Must succeed for the checkout to complete.
    async fn submit_order(&self, snapshot: &OrderSnapshot) -> Result<Ack, GalleryError>;

    /// Send the order to the printer. Best effort.
    async fn dispatch_print(&self, snapshot: &OrderSnapshot) -> Result<Ack, GalleryError>;
}

/// Two-phase payment provider (create, then capture).
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a provider order for the given total.
    async fn create_order(&self, total: Price) -> Result<PaymentToken, GalleryError>;

    /// Capture a previously created and approved provider order.
    async fn capture_order(&self, order_id: &str) -> Result<CaptureStatus, GalleryError>;
}

/// Provider order ID returned by the create step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentToken(String);

impl PaymentToken {
    /// Wrap a provider order ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the provider order ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Why a checkout attempt did not complete.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing selected; no request was sent.
    #[error("no images selected")]
    EmptySelection,

    /// No valid name in the basket; no request was sent.
    #[error("no customer name")]
    MissingCustomer,

    /// Capture requested for an order this session did not create.
    #[error("no pending payment matches this order")]
    NoPendingPayment,

    /// Order service failed or rejected the order.
    #[error("order submission failed: {0}")]
    OrderSubmission(#[source] GalleryError),

    /// Payment create or capture failed in transport.
    #[error("payment request failed: {0}")]
    Payment(#[source] GalleryError),

    /// Capture returned a status other than `COMPLETED`.
    #[error("payment not completed (status {0})")]
    PaymentNotCompleted(CaptureStatus),

    /// Session store failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The flow attempted an illegal phase change.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl CheckoutError {
    /// Message shown to the customer in the blocking alert.
    #[must_use]
    pub const fn alert_message(&self) -> &'static str {
        match self {
            Self::EmptySelection => "Please select images before continuing.",
            Self::MissingCustomer => "Please enter your name before continuing.",
            Self::OrderSubmission(_) => {
                "An error occurred while sending your order. Please try again."
            }
            Self::PaymentNotCompleted(_) => "The payment was not completed.",
            Self::NoPendingPayment | Self::Payment(_) => {
                "An error occurred during payment. Please try again."
            }
            Self::Session(_) | Self::Transition(_) => "Something went wrong. Please try again.",
        }
    }

    /// Whether sending the same request again may succeed without the
    /// customer doing anything else.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::OrderSubmission(_))
    }

    /// HTTP status for responses carrying this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::EmptySelection | Self::MissingCustomer => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NoPendingPayment => StatusCode::CONFLICT,
            Self::PaymentNotCompleted(_) => StatusCode::PAYMENT_REQUIRED,
            Self::OrderSubmission(_) | Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Transition(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result of the best-effort print request.
#[derive(Debug, Clone, PartialEq)]
pub enum PrintOutcome {
    /// Print service acknowledged the job.
    Dispatched(Ack),
    /// Print request failed; the order still stands.
    Failed(String),
}

/// A successfully submitted order.
#[derive(Debug)]
pub struct PlacedOrder {
    /// What was sent to the order service.
    pub snapshot: OrderSnapshot,
    /// The in-flight print request. Dropping it does not cancel the print.
    pub print: JoinHandle<PrintOutcome>,
}

/// Checkout driver shared by the cash form and the PayPal endpoints.
#[derive(Clone)]
pub struct OrderFlow {
    orders: Arc<dyn OrderService>,
    payments: Arc<dyn PaymentProvider>,
    unit_price: Price,
}

impl OrderFlow {
    /// Create a flow over the given services.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderService>,
        payments: Arc<dyn PaymentProvider>,
        unit_price: Price,
    ) -> Self {
        Self {
            orders,
            payments,
            unit_price,
        }
    }

    /// Price of one image.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.unit_price
    }

    /// Total for the basket as it is right now.
    #[must_use]
    pub fn total(&self, basket: &Basket) -> Price {
        basket_total(self.unit_price, basket.selection.len())
    }

    /// Place an order from the current basket.
    ///
    /// Used directly by the cash path; the PayPal path reaches the same
    /// submission through [`Self::complete_payment`].
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptySelection`] / [`CheckoutError::MissingCustomer`]
    ///   before any request is sent
    /// - [`CheckoutError::OrderSubmission`] if the order service fails; the
    ///   basket is left intact so the customer can try again
    #[instrument(skip(self, session))]
    pub async fn place_order(
        &self,
        session: &KioskSession,
        method: PaymentMethod,
        payment_reference: Option<String>,
    ) -> Result<PlacedOrder, CheckoutError> {
        let basket = session.basket().await?;
        let customer = guard_basket(&basket)?;

        let phase = CheckoutPhase::Idle.advance(CheckoutEvent::Submit)?;
        self.submit(session, phase, &basket, &customer, method, payment_reference)
            .await
    }

    /// Create a provider order for the basket total (payment phase 1).
    ///
    /// The returned token is remembered in the session; only that token can be
    /// captured later.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptySelection`] / [`CheckoutError::MissingCustomer`]
    /// without contacting the provider, or [`CheckoutError::Payment`] if the
    /// create request fails.
    #[instrument(skip(self, session))]
    pub async fn begin_payment(&self, session: &KioskSession) -> Result<PaymentToken, CheckoutError> {
        let basket = session.basket().await?;
        guard_basket(&basket)?;

        let total = self.total(&basket);
        let token = self
            .payments
            .create_order(total)
            .await
            .map_err(|e| {
                warn!(error = %e, "Payment create failed");
                CheckoutError::Payment(e)
            })?;

        let phase = CheckoutPhase::Idle.advance(CheckoutEvent::PaymentCreated)?;
        session.set_pending_payment(&token).await?;
        info!(phase = %phase, order_id = token.as_str(), total = %total, "Payment created");

        Ok(token)
    }

    /// Capture an approved provider order, then place the order (payment phase 2).
    ///
    /// A successful capture is remembered until the order is placed. If the
    /// order service fails, calling this again with the same `order_id`
    /// re-submits the order without capturing a second time, as long as the
    /// basket total still matches what was paid.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NoPendingPayment`] if `order_id` was neither created
    ///   nor captured by this session; nothing is captured
    /// - [`CheckoutError::Payment`] / [`CheckoutError::PaymentNotCompleted`] if
    ///   capture fails; the order service is never called
    /// - any error of [`Self::place_order`] after a successful capture
    #[instrument(skip(self, session))]
    pub async fn complete_payment(
        &self,
        session: &KioskSession,
        order_id: &str,
    ) -> Result<PlacedOrder, CheckoutError> {
        let basket = session.basket().await?;

        let phase = match session.captured_payment().await? {
            Some(paid) if paid.token.as_str() == order_id => {
                let total = self.total(&basket);
                if paid.total != total {
                    tracing::error!(
                        order_id,
                        paid = %paid.total,
                        total = %total,
                        "Basket changed after payment was captured"
                    );
                    return Err(CheckoutError::NoPendingPayment);
                }
                info!(order_id, "Payment already captured, re-submitting order");
                CheckoutPhase::PaymentPending.advance(CheckoutEvent::PaymentCaptured)?
            }
            _ => self.capture(session, &basket, order_id).await?,
        };

        let customer = guard_basket(&basket).inspect_err(|e| {
            // Money was taken but the basket is gone; staff need the reference.
            tracing::error!(order_id, error = %e, "Captured payment has no basket to order");
        })?;

        self.submit(
            session,
            phase,
            &basket,
            &customer,
            PaymentMethod::Paypal,
            Some(order_id.to_string()),
        )
        .await
    }

    /// Capture the pending provider order and remember that it was paid.
    async fn capture(
        &self,
        session: &KioskSession,
        basket: &Basket,
        order_id: &str,
    ) -> Result<CheckoutPhase, CheckoutError> {
        let pending = session.take_pending_payment().await?;
        let Some(token) = pending.filter(|token| token.as_str() == order_id) else {
            warn!(order_id, "Capture requested without a matching pending payment");
            return Err(CheckoutError::NoPendingPayment);
        };

        let phase = CheckoutPhase::PaymentPending;
        let status = match self.payments.capture_order(order_id).await {
            Ok(status) => status,
            Err(e) => {
                let phase = phase.advance(CheckoutEvent::PaymentRejected)?;
                warn!(phase = %phase, error = %e, "Payment capture failed");
                return Err(CheckoutError::Payment(e));
            }
        };

        if !status.is_completed() {
            let phase = phase.advance(CheckoutEvent::PaymentRejected)?;
            warn!(phase = %phase, status = %status, "Payment capture not completed");
            return Err(CheckoutError::PaymentNotCompleted(status));
        }

        let phase = phase.advance(CheckoutEvent::PaymentCaptured)?;
        add_breadcrumb("checkout", "Payment captured", Some(&[("order_id", order_id)]));
        session
            .set_captured_payment(&CapturedPayment {
                token,
                total: self.total(basket),
            })
            .await?;

        Ok(phase)
    }

    /// Shared tail of both paths, entered in `Submitting`.
    async fn submit(
        &self,
        session: &KioskSession,
        phase: CheckoutPhase,
        basket: &Basket,
        customer: &CustomerName,
        method: PaymentMethod,
        payment_reference: Option<String>,
    ) -> Result<PlacedOrder, CheckoutError> {
        let snapshot = OrderSnapshot::new(customer, &basket.selection, method, payment_reference);

        // Write before send: the attempted order survives a crash mid-request.
        session.mailbox().post(&snapshot).await?;

        let ack = match self.orders.submit_order(&snapshot).await {
            Ok(ack) => ack,
            Err(e) => {
                let failed = phase.advance(CheckoutEvent::OrderRejected)?;
                warn!(phase = %failed, error = %e, "Order submission failed");
                let idle = failed.advance(CheckoutEvent::Acknowledged)?;
                tracing::debug!(phase = %idle, "Basket kept for retry");
                return Err(CheckoutError::OrderSubmission(e));
            }
        };

        let phase = phase.advance(CheckoutEvent::OrderAccepted)?;
        info!(
            phase = %phase,
            customer = %customer,
            images = snapshot.image_count(),
            method = %method,
            ack = %ack,
            "Order accepted"
        );

        let print = self.spawn_print(snapshot.clone());
        let phase = phase.advance(CheckoutEvent::PrintDispatched)?;

        session.reset().await?;
        info!(phase = %phase, "Checkout completed");
        add_breadcrumb("checkout", "Order placed", Some(&[("method", method.as_str())]));

        Ok(PlacedOrder { snapshot, print })
    }

    /// Fire-and-forget print request.
    fn spawn_print(&self, snapshot: OrderSnapshot) -> JoinHandle<PrintOutcome> {
        let orders = Arc::clone(&self.orders);

        tokio::spawn(
            async move {
                match orders.dispatch_print(&snapshot).await {
                    Ok(ack) => {
                        info!(ack = %ack, "Print dispatched");
                        PrintOutcome::Dispatched(ack)
                    }
                    Err(e) => {
                        warn!(error = %e, "Print dispatch failed, order stands");
                        PrintOutcome::Failed(e.to_string())
                    }
                }
            }
            .in_current_span(),
        )
    }
}

/// Basket preconditions shared by every path.
fn guard_basket(basket: &Basket) -> Result<CustomerName, CheckoutError> {
    if basket.selection.is_empty() {
        return Err(CheckoutError::EmptySelection);
    }
    basket
        .customer()
        .map_err(|_| CheckoutError::MissingCustomer)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::models::session::tests::{memory_session, persisted_has, stored_session};
    use crate::models::session_keys;
    use print_counter_core::CurrencyCode;

    /// Records every upstream call in order.
    #[derive(Default)]
    struct FakeGallery {
        calls: Mutex<Vec<String>>,
        fail_order: bool,
        fail_print: bool,
        fail_capture: bool,
        capture_status: Option<&'static str>,
        snapshots: Mutex<Vec<OrderSnapshot>>,
    }

    impl FakeGallery {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn unavailable() -> GalleryError {
            GalleryError::Api {
                status: 503,
                message: "unavailable".to_string(),
            }
        }
    }

    #[async_trait]
    impl OrderService for FakeGallery {
        async fn submit_order(&self, snapshot: &OrderSnapshot) -> Result<Ack, GalleryError> {
            self.record("order");
            self.snapshots.lock().unwrap().push(snapshot.clone());
            if self.fail_order {
                return Err(Self::unavailable());
            }
            Ok(serde_json::json!({ "message": "saved" }))
        }

        async fn dispatch_print(&self, _snapshot: &OrderSnapshot) -> Result<Ack, GalleryError> {
            self.record("print");
            if self.fail_print {
                return Err(Self::unavailable());
            }
            Ok(serde_json::json!({ "message": "printing" }))
        }
    }

    #[async_trait]
    impl PaymentProvider for FakeGallery {
        async fn create_order(&self, total: Price) -> Result<PaymentToken, GalleryError> {
            self.record(format!("create:{}", total.amount));
            Ok(PaymentToken::new("PAY-1"))
        }

        async fn capture_order(&self, order_id: &str) -> Result<CaptureStatus, GalleryError> {
            self.record(format!("capture:{order_id}"));
            if self.fail_capture {
                return Err(Self::unavailable());
            }
            Ok(CaptureStatus::new(self.capture_status.unwrap_or("COMPLETED")))
        }
    }

    fn flow(gallery: &Arc<FakeGallery>) -> OrderFlow {
        OrderFlow::new(
            Arc::clone(gallery) as Arc<dyn OrderService>,
            Arc::clone(gallery) as Arc<dyn PaymentProvider>,
            Price::new(Decimal::from(2), CurrencyCode::EUR),
        )
    }

    async fn session_with(images: &[&str], name: &str) -> KioskSession {
        let session = memory_session();
        for image in images {
            session.toggle_image((*image).into()).await.unwrap();
        }
        session.set_name(name).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_cash_order_then_print_then_reset() {
        let gallery = Arc::new(FakeGallery::default());
        let session = session_with(&["a.jpg", "b.jpg"], "Ana").await;

        let placed = flow(&gallery)
            .place_order(&session, PaymentMethod::Cash, None)
            .await
            .unwrap();
        let outcome = placed.print.await.unwrap();

        assert_eq!(gallery.calls(), vec!["order", "print"]);
        assert!(matches!(outcome, PrintOutcome::Dispatched(_)));
        assert_eq!(
            serde_json::to_value(&placed.snapshot).unwrap(),
            serde_json::json!({
                "name": "Ana",
                "selectedImages": ["a.jpg", "b.jpg"],
                "paymentMethod": "cash",
                "orderID": null,
            })
        );
        assert_eq!(session.basket().await.unwrap(), Basket::default());
        assert_eq!(
            session.mailbox().take().await.unwrap(),
            Some(placed.snapshot)
        );
    }

    #[tokio::test]
    async fn test_print_failure_does_not_fail_order() {
        let gallery = Arc::new(FakeGallery {
            fail_print: true,
            ..Default::default()
        });
        let session = session_with(&["a.jpg"], "Ana").await;

        let placed = flow(&gallery)
            .place_order(&session, PaymentMethod::Cash, None)
            .await
            .unwrap();

        assert!(matches!(placed.print.await.unwrap(), PrintOutcome::Failed(_)));
        assert!(session.basket().await.unwrap().selection.is_empty());
        assert!(session.mailbox().take().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_selection_sends_nothing() {
        let gallery = Arc::new(FakeGallery::default());
        let session = session_with(&[], "Ana").await;

        let err = flow(&gallery)
            .place_order(&session, PaymentMethod::Cash, None)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptySelection));
        assert!(gallery.calls().is_empty());
        assert!(session.mailbox().take().await.unwrap().is_none());
        assert_eq!(err.alert_message(), "Please select images before continuing.");
    }

    #[tokio::test]
    async fn test_missing_name_sends_nothing() {
        let gallery = Arc::new(FakeGallery::default());
        let session = session_with(&["a.jpg"], "   ").await;

        let err = flow(&gallery)
            .place_order(&session, PaymentMethod::Cash, None)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::MissingCustomer));
        assert!(gallery.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_order_keeps_basket_for_retry() {
        let gallery = Arc::new(FakeGallery {
            fail_order: true,
            ..Default::default()
        });
        let session = session_with(&["a.jpg"], "Ana").await;

        let err = flow(&gallery)
            .place_order(&session, PaymentMethod::Cash, None)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::OrderSubmission(_)));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        // No print for a failed order
        assert_eq!(gallery.calls(), vec!["order"]);
        let basket = session.basket().await.unwrap();
        assert_eq!(basket.selection.len(), 1);
        assert_eq!(basket.name, "Ana");
        // Written before the send, so the attempt is still recoverable
        assert!(session.mailbox().take().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_snapshot_persisted_before_order_is_sent() {
        struct CheckingOrders {
            store: MemoryStore,
            session: KioskSession,
            persisted_when_sent: Mutex<Option<bool>>,
        }

        #[async_trait]
        impl OrderService for CheckingOrders {
            async fn submit_order(&self, _snapshot: &OrderSnapshot) -> Result<Ack, GalleryError> {
                let persisted =
                    persisted_has(&self.store, &self.session, session_keys::ORDER_SNAPSHOT).await;
                *self.persisted_when_sent.lock().unwrap() = Some(persisted);
                Ok(Ack::Null)
            }

            async fn dispatch_print(&self, _snapshot: &OrderSnapshot) -> Result<Ack, GalleryError> {
                Ok(Ack::Null)
            }
        }

        let store = MemoryStore::default();
        let session = stored_session(store.clone());
        session.toggle_image("a.jpg".into()).await.unwrap();
        session.set_name("Ana").await.unwrap();

        let orders = Arc::new(CheckingOrders {
            store,
            session: session.clone(),
            persisted_when_sent: Mutex::new(None),
        });
        let flow = OrderFlow::new(
            Arc::clone(&orders) as Arc<dyn OrderService>,
            Arc::new(FakeGallery::default()),
            Price::new(Decimal::from(2), CurrencyCode::EUR),
        );

        flow.place_order(&session, PaymentMethod::Cash, None)
            .await
            .unwrap();

        assert_eq!(*orders.persisted_when_sent.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_paypal_capture_precedes_order() {
        let gallery = Arc::new(FakeGallery::default());
        let session = session_with(&["a.jpg", "b.jpg"], "Ana").await;
        let flow = flow(&gallery);

        let token = flow.begin_payment(&session).await.unwrap();
        let placed = flow
            .complete_payment(&session, token.as_str())
            .await
            .unwrap();
        placed.print.await.unwrap();

        assert_eq!(
            gallery.calls(),
            vec!["create:4", "capture:PAY-1", "order", "print"]
        );
        assert_eq!(placed.snapshot.payment_method, PaymentMethod::Paypal);
        assert_eq!(placed.snapshot.payment_reference.as_deref(), Some("PAY-1"));
        assert!(session.basket().await.unwrap().selection.is_empty());
    }

    #[tokio::test]
    async fn test_pending_capture_never_submits_order() {
        let gallery = Arc::new(FakeGallery {
            capture_status: Some("PENDING"),
            ..Default::default()
        });
        let session = session_with(&["a.jpg"], "Ana").await;
        let flow = flow(&gallery);

        let token = flow.begin_payment(&session).await.unwrap();
        let err = flow
            .complete_payment(&session, token.as_str())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::PaymentNotCompleted(ref s) if s.as_str() == "PENDING"));
        assert_eq!(err.alert_message(), "The payment was not completed.");
        assert!(!gallery.calls().contains(&"order".to_string()));
        assert_eq!(session.basket().await.unwrap().selection.len(), 1);
    }

    #[tokio::test]
    async fn test_capture_transport_failure_never_submits_order() {
        let gallery = Arc::new(FakeGallery {
            fail_capture: true,
            ..Default::default()
        });
        let session = session_with(&["a.jpg"], "Ana").await;
        let flow = flow(&gallery);

        let token = flow.begin_payment(&session).await.unwrap();
        let err = flow
            .complete_payment(&session, token.as_str())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Payment(_)));
        assert_eq!(gallery.calls(), vec!["create:2", "capture:PAY-1"]);
    }

    #[tokio::test]
    async fn test_capture_without_create_is_rejected() {
        let gallery = Arc::new(FakeGallery::default());
        let session = session_with(&["a.jpg"], "Ana").await;

        let err = flow(&gallery)
            .complete_payment(&session, "PAY-1")
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::NoPendingPayment));
        assert!(gallery.calls().is_empty());
    }

    #[tokio::test]
    async fn test_capture_of_foreign_order_is_rejected() {
        let gallery = Arc::new(FakeGallery::default());
        let session = session_with(&["a.jpg"], "Ana").await;
        let flow = flow(&gallery);

        flow.begin_payment(&session).await.unwrap();
        let err = flow
            .complete_payment(&session, "SOMEONE-ELSE")
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::NoPendingPayment));
        assert_eq!(gallery.calls(), vec!["create:2"]);
    }

    #[tokio::test]
    async fn test_begin_payment_with_empty_basket_contacts_nobody() {
        let gallery = Arc::new(FakeGallery::default());
        let session = session_with(&[], "Ana").await;

        let err = flow(&gallery).begin_payment(&session).await.unwrap_err();

        assert!(matches!(err, CheckoutError::EmptySelection));
        assert!(gallery.calls().is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_failed_order_does_not_capture_again() {
        let gallery = Arc::new(FakeGallery {
            fail_order: true,
            ..Default::default()
        });
        let session = session_with(&["a.jpg"], "Ana").await;
        let flow = flow(&gallery);

        let token = flow.begin_payment(&session).await.unwrap();
        let err = flow
            .complete_payment(&session, token.as_str())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(session.captured_payment().await.unwrap().is_some());

        // Order service is back
        let gallery_ok = Arc::new(FakeGallery::default());
        let retry_flow = OrderFlow::new(
            Arc::clone(&gallery_ok) as Arc<dyn OrderService>,
            Arc::clone(&gallery) as Arc<dyn PaymentProvider>,
            flow.unit_price(),
        );
        let placed = retry_flow
            .complete_payment(&session, token.as_str())
            .await
            .unwrap();
        placed.print.await.unwrap();

        assert_eq!(gallery.calls(), vec!["create:2", "capture:PAY-1", "order"]);
        assert_eq!(gallery_ok.calls(), vec!["order", "print"]);
        assert_eq!(placed.snapshot.payment_reference.as_deref(), Some("PAY-1"));
        assert!(session.captured_payment().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_retry_refused_when_basket_changed_after_capture() {
        let gallery = Arc::new(FakeGallery {
            fail_order: true,
            ..Default::default()
        });
        let session = session_with(&["a.jpg"], "Ana").await;
        let flow = flow(&gallery);

        let token = flow.begin_payment(&session).await.unwrap();
        flow.complete_payment(&session, token.as_str())
            .await
            .unwrap_err();
        session.toggle_image("b.jpg".into()).await.unwrap();

        let err = flow
            .complete_payment(&session, token.as_str())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::NoPendingPayment));
        assert_eq!(gallery.calls(), vec!["create:2", "capture:PAY-1", "order"]);
    }

    #[tokio::test]
    async fn test_total_is_count_times_unit_price() {
        let gallery = Arc::new(FakeGallery::default());
        let flow = flow(&gallery);

        for count in 0..5 {
            let mut basket = Basket::default();
            for i in 0..count {
                basket.selection.toggle(format!("{i}.jpg").into());
            }
            assert_eq!(flow.total(&basket).amount, Decimal::from(2 * count));
        }
    }
}
