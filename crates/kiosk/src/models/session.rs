//! Session-related types.
//!
//! Everything the kiosk remembers about one customer visit lives in their
//! session: the basket, the order hand-off slot, and the PayPal order waiting
//! for capture or already paid. Terms acceptance outlives the session and is
//! kept in its own cookie (see [`super::consent`]).

use axum::{extract::FromRequestParts, http::request::Parts};
use print_counter_core::{CustomerName, ImageId, NameError, OrderSnapshot, Price, Selection};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use crate::services::ordering::PaymentToken;

/// Session keys.
pub mod keys {
    /// Key for the customer's basket (selection and name together).
    pub const BASKET: &str = "basket";

    /// Key for the order snapshot handed from checkout to confirmation.
    pub const ORDER_SNAPSHOT: &str = "order_snapshot";

    /// Key for the PayPal order created but not yet captured.
    pub const PENDING_PAYMENT: &str = "pending_payment";

    /// Key for the PayPal order captured but not yet turned into an order.
    pub const CAPTURED_PAYMENT: &str = "captured_payment";
}

/// Selection and name of the customer at the kiosk.
///
/// Stored under one key so that resetting the session clears both at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    /// Images picked in the gallery.
    pub selection: Selection,
    /// Name as typed on the form, untrimmed so the field can be re-filled.
    pub name: String,
}

impl Basket {
    /// The validated customer name.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] if no usable name was entered.
    pub fn customer(&self) -> Result<CustomerName, NameError> {
        CustomerName::parse(&self.name)
    }
}

/// A provider order whose money was taken but whose kiosk order is not placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedPayment {
    /// Provider order ID.
    pub token: PaymentToken,
    /// Basket total the customer paid.
    pub total: Price,
}

/// Typed view over the customer's session.
///
/// Works as an axum extractor wherever `SessionManagerLayer` is installed.
#[derive(Debug, Clone)]
pub struct KioskSession(Session);

impl KioskSession {
    /// Wrap an existing session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self(session)
    }

    /// The current basket, empty if none was stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn basket(&self) -> Result<Basket, SessionError> {
        Ok(self
            .0
            .get::<Basket>(keys::BASKET)
            .await?
            .unwrap_or_default())
    }

    /// Replace the stored basket.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save_basket(&self, basket: &Basket) -> Result<(), SessionError> {
        self.0.insert(keys::BASKET, basket).await
    }

    /// Toggle one image in the selection.
    ///
    /// Returns whether the image is selected afterwards and the new count.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn toggle_image(&self, id: ImageId) -> Result<(bool, usize), SessionError> {
        let mut basket = self.basket().await?;
        let selected = basket.selection.toggle(id);
        self.save_basket(&basket).await?;
        Ok((selected, basket.selection.len()))
    }

    /// Store the name exactly as typed.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_name(&self, name: &str) -> Result<(), SessionError> {
        let mut basket = self.basket().await?;
        name.clone_into(&mut basket.name);
        self.save_basket(&basket).await
    }

    /// Clear selection, name and any captured payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.0.remove::<Basket>(keys::BASKET).await?;
        self.0
            .remove::<CapturedPayment>(keys::CAPTURED_PAYMENT)
            .await
            .map(|_| ())
    }

    /// Remember the PayPal order waiting for capture.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_pending_payment(&self, token: &PaymentToken) -> Result<(), SessionError> {
        self.0.insert(keys::PENDING_PAYMENT, token).await
    }

    /// Remove and return the PayPal order waiting for capture.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn take_pending_payment(&self) -> Result<Option<PaymentToken>, SessionError> {
        self.0.remove::<PaymentToken>(keys::PENDING_PAYMENT).await
    }

    /// Remember a capture whose order still has to be placed.
    ///
    /// Written through to the store so a crash before the order is sent does
    /// not lose the record of the payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_captured_payment(&self, payment: &CapturedPayment) -> Result<(), SessionError> {
        self.0.insert(keys::CAPTURED_PAYMENT, payment).await?;
        self.0.save().await
    }

    /// The capture waiting for its order, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn captured_payment(&self) -> Result<Option<CapturedPayment>, SessionError> {
        self.0.get::<CapturedPayment>(keys::CAPTURED_PAYMENT).await
    }

    /// The order hand-off slot for this session.
    #[must_use]
    pub fn mailbox(&self) -> OrderMailbox {
        OrderMailbox(self.0.clone())
    }
}

impl<S> FromRequestParts<S> for KioskSession
where
    S: Send + Sync,
{
    type Rejection = <Session as FromRequestParts<S>>::Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Session::from_request_parts(parts, state).await.map(Self)
    }
}

/// Single-slot hand-off of the order snapshot from checkout to confirmation.
///
/// Checkout posts the snapshot before it sends the order; confirmation takes
/// it exactly once. A second `take` returns `None`.
#[derive(Debug, Clone)]
pub struct OrderMailbox(Session);

impl OrderMailbox {
    /// Put a snapshot in the slot, replacing any previous one.
    ///
    /// The session is saved to the store before returning, so the snapshot is
    /// durable before the caller sends anything upstream.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn post(&self, snapshot: &OrderSnapshot) -> Result<(), SessionError> {
        self.0.insert(keys::ORDER_SNAPSHOT, snapshot).await?;
        self.0.save().await
    }

    /// Read and clear the slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn take(&self) -> Result<Option<OrderSnapshot>, SessionError> {
        self.0.remove::<OrderSnapshot>(keys::ORDER_SNAPSHOT).await
    }
}
