//! Core types for the print counter.
//!
//! This module provides type-safe wrappers for the ordering domain.

pub mod consent;
pub mod customer;
pub mod image;
pub mod order;
pub mod phase;
pub mod price;

pub use consent::ConsentRecord;
pub use customer::{CustomerName, NameError};
pub use image::{ImageId, Selection};
pub use order::{CaptureStatus, OrderSnapshot, PaymentMethod};
pub use phase::{CheckoutEvent, CheckoutPhase, TransitionError};
pub use price::{CurrencyCode, Price, basket_total};
