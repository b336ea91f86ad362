//! Print counter kiosk library.
//!
//! The kiosk is served as a binary, but everything it does lives here so the
//! integration tests can drive the same router against a fake gallery service.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
