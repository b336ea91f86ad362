//! Confirmation route handler.
//!
//! Shows the receipt handed over through the session mailbox. The slot is
//! cleared on read, so a reload or a second window shows an empty receipt.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use print_counter_core::{OrderSnapshot, PaymentMethod};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::KioskSession;
use crate::state::AppState;

/// Receipt display data.
#[derive(Debug, Clone)]
pub struct ReceiptView {
    pub name: String,
    pub images: Vec<String>,
    pub payment: &'static str,
    pub reference: Option<String>,
}

impl From<OrderSnapshot> for ReceiptView {
    fn from(snapshot: OrderSnapshot) -> Self {
        Self {
            name: snapshot.name,
            images: snapshot
                .selected_images
                .into_iter()
                .map(print_counter_core::ImageId::into_inner)
                .collect(),
            payment: match snapshot.payment_method {
                PaymentMethod::Cash => "Pay in cash at the counter",
                PaymentMethod::Paypal => "Paid with PayPal",
            },
            reference: snapshot.payment_reference,
        }
    }
}

/// Confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "confirmation.html")]
pub struct ConfirmationTemplate {
    pub nonce: String,
    pub receipt: Option<ReceiptView>,
    /// Seconds until the page returns to the gallery, 0 when disabled.
    pub auto_return_seconds: u64,
    pub intercept_back: bool,
}

/// Display the receipt, consuming the mailbox slot.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: KioskSession,
    CspNonce(nonce): CspNonce,
) -> Result<ConfirmationTemplate> {
    let receipt = session.mailbox().take().await?;
    if receipt.is_none() {
        tracing::debug!("Confirmation shown without a snapshot");
    }

    let features = &state.config().features;

    Ok(ConfirmationTemplate {
        nonce,
        receipt: receipt.map(ReceiptView::from),
        auto_return_seconds: features.auto_return.map_or(0, |d| d.as_secs()),
        intercept_back: features.intercept_back_navigation,
    })
}
