//! Domain models for the kiosk.
//!
//! Session-backed state shared by the four screens, plus the per-device
//! consent cookie. The durable domain types themselves live in
//! `print_counter_core`.

pub mod consent;
pub mod session;

pub use consent::{DeviceConsent, consent_cookie};
pub use session::{Basket, CapturedPayment, KioskSession, OrderMailbox, keys as session_keys};
