//! Business logic services for the kiosk.
//!
//! # Services
//!
//! - `gallery` - REST client for the upstream image, order, print and payment service
//! - `ordering` - Checkout flow: order submission, print dispatch, two-phase payment
//! - `consent` - Terms-of-service acceptance

pub mod consent;
pub mod gallery;
pub mod ordering;

pub use gallery::{GalleryClient, GalleryError};
pub use ordering::{
    CheckoutError, OrderFlow, OrderService, PaymentProvider, PaymentToken, PlacedOrder,
    PrintOutcome,
};
