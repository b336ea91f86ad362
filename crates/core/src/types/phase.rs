//! Checkout phase machine.
//!
//! ```text
//!            Submit                OrderAccepted            PrintDispatched
//!   Idle ─────────────► Submitting ─────────────► PrintTriggering ─────────► Completed
//!    │                    ▲    │
//!    │ PaymentCreated     │    │ OrderRejected
//!    ▼                    │    ▼
//!   PaymentPending ───────┘   Failed ──Acknowledged──► Idle
//!    │   PaymentCaptured        ▲
//!    └──────────────────────────┘
//!          PaymentRejected
//! ```
//!
//! The machine only decides which transitions are legal. The kiosk's
//! ordering flow performs the I/O and feeds the outcome back as events.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Where a checkout attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    /// Basket displayed, nothing in flight.
    #[default]
    Idle,
    /// A provider payment exists and waits for capture.
    PaymentPending,
    /// Snapshot persisted, order request in flight.
    Submitting,
    /// Order accepted, print request being dispatched.
    PrintTriggering,
    /// Session cleared, customer sent to the confirmation screen.
    Completed,
    /// Order or payment failed; the user is shown an alert.
    Failed,
}

/// Outcome fed into [`CheckoutPhase::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutEvent {
    /// Customer confirmed a non-empty basket.
    Submit,
    /// Payment provider returned an order token.
    PaymentCreated,
    /// Capture came back `COMPLETED`.
    PaymentCaptured,
    /// Capture failed or returned any other status.
    PaymentRejected,
    /// Order service acknowledged the order.
    OrderAccepted,
    /// Order service failed or returned a non-success status.
    OrderRejected,
    /// Print request handed off; its outcome does not matter here.
    PrintDispatched,
    /// The failure alert was shown; control returns to the basket.
    Acknowledged,
}

/// An event that is not legal in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply {event:?} in phase {from}")]
pub struct TransitionError {
    /// Phase the event was applied to.
    pub from: CheckoutPhase,
    /// The rejected event.
    pub event: CheckoutEvent,
}

impl CheckoutPhase {
    /// Apply an event and return the next phase.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the event is not legal in this phase.
    /// `Completed` accepts no events.
    pub const fn advance(self, event: CheckoutEvent) -> Result<Self, TransitionError> {
        use CheckoutEvent as E;

        let next = match (self, event) {
            (Self::Idle, E::Submit) | (Self::PaymentPending, E::PaymentCaptured) => {
                Self::Submitting
            }
            (Self::Idle, E::PaymentCreated) => Self::PaymentPending,
            (Self::PaymentPending, E::PaymentRejected) | (Self::Submitting, E::OrderRejected) => {
                Self::Failed
            }
            (Self::Submitting, E::OrderAccepted) => Self::PrintTriggering,
            (Self::PrintTriggering, E::PrintDispatched) => Self::Completed,
            (Self::Failed, E::Acknowledged) => Self::Idle,
            (from, event) => return Err(TransitionError { from, event }),
        };

        Ok(next)
    }

    /// Returns `true` once the order has been placed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Snake-case name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PaymentPending => "payment_pending",
            Self::Submitting => "submitting",
            Self::PrintTriggering => "print_triggering",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
