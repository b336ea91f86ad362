//! PayPal widget endpoints.
//!
//! The PayPal JS buttons call these two endpoints in order: create when the
//! customer clicks, capture once they approve in the PayPal popup. Both
//! answer JSON; failures carry an `error` text the page shows in an alert.
//! When the payment was captured but the order could not be sent, the error
//! also carries `retry: true` and the page may post the same capture again.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::models::KioskSession;
use crate::routes::checkout::report_checkout_error;
use crate::services::CheckoutError;
use crate::state::AppState;

/// Created provider order, handed to the PayPal SDK.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub id: String,
}

/// Capture request from the PayPal SDK `onApprove` callback.
#[derive(Debug, Deserialize)]
pub struct CaptureOrderRequest {
    #[serde(rename = "orderID")]
    pub order_id: String,
}

/// Where the page goes after a completed payment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOrderResponse {
    pub redirect: &'static str,
    pub new_window: bool,
}

/// Failure text for the page alert.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retry: bool,
}

fn error_response(error: &CheckoutError) -> Response {
    report_checkout_error(error);
    (
        error.status(),
        Json(ErrorResponse {
            error: error.alert_message(),
            retry: error.is_retryable(),
        }),
    )
        .into_response()
}

fn ensure_enabled(state: &AppState) -> Result<(), AppError> {
    if state.config().paypal.is_none() {
        return Err(AppError::NotFound("PayPal is not enabled".to_string()));
    }
    Ok(())
}

/// Payment phase 1: create a provider order for the basket total.
#[instrument(skip(state, session))]
pub async fn create_order(
    State(state): State<AppState>,
    session: KioskSession,
) -> Result<Response, AppError> {
    ensure_enabled(&state)?;

    match state.orders().begin_payment(&session).await {
        Ok(token) => Ok(Json(CreateOrderResponse {
            id: token.as_str().to_string(),
        })
        .into_response()),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Payment phase 2: capture, then place the order.
#[instrument(skip(state, session, request), fields(order_id = %request.order_id))]
pub async fn capture_order(
    State(state): State<AppState>,
    session: KioskSession,
    Json(request): Json<CaptureOrderRequest>,
) -> Result<Response, AppError> {
    ensure_enabled(&state)?;

    match state
        .orders()
        .complete_payment(&session, &request.order_id)
        .await
    {
        Ok(_placed) => Ok(Json(CaptureOrderResponse {
            redirect: "/confirmation",
            new_window: state.config().features.confirmation_in_new_window,
        })
        .into_response()),
        Err(e) => Ok(error_response(&e)),
    }
}
