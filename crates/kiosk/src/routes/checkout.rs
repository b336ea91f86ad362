//! Checkout route handlers.
//!
//! The checkout page summarizes the basket and offers the two payment paths:
//! a cash form handled here and the PayPal buttons backed by
//! [`crate::routes::paypal`]. Failures come back as a blocking alert on the
//! same page with the basket intact.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use print_counter_core::PaymentMethod;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::{Basket, KioskSession};
use crate::routes::ImageView;
use crate::services::CheckoutError;
use crate::state::AppState;

/// PayPal button settings for the page script.
#[derive(Debug, Clone)]
pub struct PaypalView {
    pub client_id: String,
    pub currency: &'static str,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub nonce: String,
    pub name: String,
    pub images: Vec<ImageView>,
    pub unit_price: String,
    pub total: String,
    pub paypal: Option<PaypalView>,
    pub alert: Option<&'static str>,
}

/// Page that opens the confirmation in a new window.
#[derive(Template, WebTemplate)]
#[template(path = "handoff.html")]
pub struct HandoffTemplate {
    pub nonce: String,
}

impl CheckoutTemplate {
    fn new(state: &AppState, basket: &Basket, nonce: String, alert: Option<&'static str>) -> Self {
        let config = state.config();
        let orders = state.orders();

        Self {
            nonce,
            name: basket
                .customer()
                .map(|c| c.to_string())
                .unwrap_or_default(),
            images: basket
                .selection
                .iter()
                .map(|id| ImageView::new(id, true))
                .collect(),
            unit_price: orders.unit_price().to_string(),
            total: orders.total(basket).to_string(),
            paypal: config.paypal.as_ref().map(|p| PaypalView {
                client_id: p.client_id.clone(),
                currency: orders.unit_price().currency_code.code(),
            }),
            alert,
        }
    }
}

/// Display the checkout page.
///
/// Without a usable name the customer is sent back to the form.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: KioskSession,
    CspNonce(nonce): CspNonce,
) -> Result<Response> {
    let basket = session.basket().await?;

    if basket.customer().is_err() {
        return Ok(Redirect::to("/form").into_response());
    }

    Ok(CheckoutTemplate::new(&state, &basket, nonce, None).into_response())
}

/// Place a cash order.
#[instrument(skip(state, session, nonce))]
pub async fn cash(
    State(state): State<AppState>,
    session: KioskSession,
    CspNonce(nonce): CspNonce,
) -> Result<Response> {
    match state
        .orders()
        .place_order(&session, PaymentMethod::Cash, None)
        .await
    {
        // The print task is detached; the confirmation does not wait for it.
        Ok(_placed) => {
            if state.config().features.confirmation_in_new_window {
                Ok(HandoffTemplate { nonce }.into_response())
            } else {
                Ok(Redirect::to("/confirmation").into_response())
            }
        }
        Err(CheckoutError::MissingCustomer) => Ok(Redirect::to("/form").into_response()),
        Err(e) => {
            report_checkout_error(&e);
            let basket = session.basket().await?;
            let page = CheckoutTemplate::new(&state, &basket, nonce, Some(e.alert_message()));
            Ok((e.status(), page).into_response())
        }
    }
}

/// Log a failed checkout, sending server-side faults to Sentry.
pub(crate) fn report_checkout_error(error: &CheckoutError) {
    match error {
        CheckoutError::Session(_) | CheckoutError::Transition(_) => {
            let event_id = sentry::capture_error(error);
            tracing::error!(error = %error, sentry_event_id = %event_id, "Checkout error");
        }
        _ => tracing::warn!(error = %error, "Checkout not completed"),
    }
}
