//! Security headers middleware.
//!
//! The kiosk runs full-screen on a counter terminal, so the policy is tight:
//! scripts only from this origin or carrying the request's nonce, and the
//! PayPal SDK origins as the single third-party exception.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Origins the PayPal JS SDK loads scripts, frames and API calls from.
const PAYPAL_ORIGINS: &str =
    "https://www.paypal.com https://www.sandbox.paypal.com https://www.paypalobjects.com";

/// Build the `Content-Security-Policy` value for one response.
#[must_use]
pub fn content_security_policy(nonce: Option<&CspNonce>) -> String {
    let script_src = match nonce {
        Some(nonce) if !nonce.value().is_empty() => {
            format!("'self' 'nonce-{}' {PAYPAL_ORIGINS}", nonce.value())
        }
        _ => format!("'self' {PAYPAL_ORIGINS}"),
    };

    format!(
        "default-src 'none'; \
         script-src {script_src}; \
         style-src 'self' 'unsafe-inline'; \
         img-src 'self' data: {PAYPAL_ORIGINS}; \
         connect-src 'self' {PAYPAL_ORIGINS}; \
         frame-src {PAYPAL_ORIGINS}; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: no-referrer`
/// - `Content-Security-Policy` from [`content_security_policy`]
/// - `Permissions-Policy` denying device features, `payment` left to PayPal
/// - `Cache-Control: no-store` unless the handler set its own
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` so the PayPal
///   popup and the confirmation window can talk back
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let nonce = request.extensions().get::<CspNonce>().cloned();
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    match HeaderValue::from_str(&content_security_policy(nonce.as_ref())) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => tracing::error!(error = %e, "Invalid CSP header value"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), \
             geolocation=(), \
             microphone=(), \
             usb=(), \
             payment=(self \"https://www.paypal.com\" \"https://www.sandbox.paypal.com\")",
        ),
    );

    // Image proxy responses set their own caching
    headers
        .entry(CACHE_CONTROL)
        .or_insert(HeaderValue::from_static("no-store, max-age=0"));

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );

    response
}
