//! Print Counter Core - Shared domain types.
//!
//! This crate provides the types used by the kiosk and its tests:
//! - image identifiers and the ordered selection set
//! - the validated customer name
//! - prices and basket totals
//! - the order snapshot exchanged with the order and print services
//! - the checkout phase machine
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no sessions,
//! no HTTP clients. Everything here can be tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtypes, the order snapshot, and [`CheckoutPhase`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
