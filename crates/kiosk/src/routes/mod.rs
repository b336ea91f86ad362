//! HTTP route handlers for the kiosk.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Gallery (optional ?preview=<id>)
//! POST /selection/toggle          - Toggle one image (JSON or 303 back to /)
//! GET  /images/{id}               - Image bytes proxied from the gallery service
//! POST /consent                   - Accept the terms gate
//!
//! GET  /form                      - Name entry
//! POST /form                      - Validate and store the name
//!
//! GET  /checkout                  - Basket summary and payment choice
//! POST /checkout/cash             - Place a cash order
//!
//! # PayPal widget (JSON)
//! POST /api/paypal/create-order   - Payment phase 1
//! POST /api/paypal/capture-order  - Payment phase 2, then place the order
//!
//! GET  /confirmation              - Receipt (read-once)
//! GET  /health                    - Liveness
//! ```

pub mod checkout;
pub mod confirmation;
pub mod consent;
pub mod form;
pub mod gallery;
pub mod paypal;

use axum::{
    Router,
    http::{HeaderMap, header::ACCEPT},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use print_counter_core::ImageId;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::SessionStore;

use crate::middleware::{
    create_session_layer, csp_nonce_middleware, request_id_middleware,
    security_headers_middleware, session_lock_middleware,
};
use crate::state::AppState;

/// One image as the templates see it.
#[derive(Debug, Clone)]
pub struct ImageView {
    /// Identifier as listed by the gallery service.
    pub id: String,
    /// Kiosk path serving the image bytes.
    pub src: String,
    /// Gallery path with this image enlarged.
    pub preview_href: String,
    /// Whether the image is in the basket.
    pub selected: bool,
}

impl ImageView {
    #[must_use]
    pub fn new(id: &ImageId, selected: bool) -> Self {
        let encoded = urlencoding::encode(id.as_str());
        Self {
            id: id.to_string(),
            src: format!("/images/{encoded}"),
            preview_href: format!("/?preview={encoded}"),
            selected,
        }
    }
}

/// Whether the client asked for a JSON response.
pub(crate) fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

/// Create the PayPal widget API router.
pub fn paypal_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(paypal::create_order))
        .route("/capture-order", post(paypal::capture_order))
}

/// Create all page routes for the kiosk.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Gallery
        .route("/", get(gallery::index))
        .route("/selection/toggle", post(gallery::toggle))
        .route("/images/{id}", get(gallery::image))
        .route("/consent", post(consent::accept))
        // Name entry
        .route("/form", get(form::show).post(form::submit))
        // Checkout
        .route("/checkout", get(checkout::show))
        .route("/checkout/cash", post(checkout::cash))
        .nest("/api/paypal", paypal_routes())
        // Confirmation
        .route("/confirmation", get(confirmation::show))
}

/// Build the complete application: routes, assets and middleware.
///
/// The session store is passed in so the binary can use `SQLite` and tests can
/// use memory.
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(store, state.config());
    let static_dir = state.config().static_dir.clone();
    let session_locks = state.session_locks().clone();

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(session_layer)
        .layer(from_fn_with_state(session_locks, session_lock_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(csp_nonce_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_image_view_escapes_paths() {
        let view = ImageView::new(&ImageId::from("summer #1.jpg"), true);
        assert_eq!(view.id, "summer #1.jpg");
        assert_eq!(view.src, "/images/summer%20%231.jpg");
        assert_eq!(view.preview_href, "/?preview=summer%20%231.jpg");
        assert!(view.selected);
    }

    #[test]
    fn test_wants_json() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));

        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!wants_json(&headers));

        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain"),
        );
        assert!(wants_json(&headers));
    }
}
