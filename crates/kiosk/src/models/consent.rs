//! Per-device terms acceptance.
//!
//! Acceptance is recorded once per browser profile, so it lives in a
//! long-lived cookie of its own instead of the session, which expires after a
//! day of inactivity. The cookie value is the device id sent to the consent
//! log.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use crate::middleware::session::request_cookie;

/// Consent cookie name.
pub const CONSENT_COOKIE_NAME: &str = "pc_consent";

/// Consent cookie lifetime (5 years).
const CONSENT_MAX_AGE_DAYS: i64 = 5 * 365;

/// Terms acceptance of the requesting browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceConsent(Option<String>);

impl DeviceConsent {
    /// Whether the terms were accepted on this device.
    #[must_use]
    pub const fn accepted(&self) -> bool {
        self.0.is_some()
    }

    /// Device id recorded when the terms were accepted.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for DeviceConsent
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            request_cookie(&parts.headers, CONSENT_COOKIE_NAME).filter(|id| !id.is_empty()),
        ))
    }
}

/// Cookie marking this device as having accepted the terms.
#[must_use]
pub fn consent_cookie(device_id: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((CONSENT_COOKIE_NAME, device_id.to_owned()))
        .path("/")
        .max_age(Duration::days(CONSENT_MAX_AGE_DAYS))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}
