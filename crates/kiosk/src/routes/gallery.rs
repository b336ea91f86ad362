//! Gallery route handlers.
//!
//! The gallery lists today's images, keeps the selection in the session and
//! proxies image bytes so the browser never talks to the gallery service
//! directly.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::{
        HeaderMap, HeaderValue,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::{IntoResponse, Redirect, Response},
};
use print_counter_core::ImageId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::{DeviceConsent, KioskSession};
use crate::routes::{ImageView, wants_json};
use crate::state::AppState;

/// How long browsers may cache proxied image bytes.
const IMAGE_CACHE_CONTROL: &str = "private, max-age=300";

/// Gallery query parameters.
#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    /// Image shown enlarged, at most one.
    pub preview: Option<String>,
}

/// Gallery page template.
#[derive(Template, WebTemplate)]
#[template(path = "gallery.html")]
pub struct GalleryTemplate {
    pub nonce: String,
    pub images: Vec<ImageView>,
    pub selected_count: usize,
    pub preview: Option<ImageView>,
    pub consent_required: bool,
}

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub image: String,
}

/// Toggle result for script clients.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub selected: bool,
    pub count: usize,
}

/// Display the gallery.
///
/// With the terms gate enabled and not yet accepted on this device, the
/// listing is not fetched and only the terms modal is shown.
#[instrument(skip(state, session, consent, nonce))]
pub async fn index(
    State(state): State<AppState>,
    session: KioskSession,
    consent: DeviceConsent,
    CspNonce(nonce): CspNonce,
    Query(query): Query<GalleryQuery>,
) -> Result<GalleryTemplate> {
    let consent_required = state.config().features.consent_gate && !consent.accepted();

    if consent_required {
        return Ok(GalleryTemplate {
            nonce,
            images: Vec::new(),
            selected_count: 0,
            preview: None,
            consent_required,
        });
    }

    let basket = session.basket().await?;

    // Listing failures leave the gallery empty; there is no alert.
    let listing = match state.gallery().list_images().await {
        Ok(listing) => listing,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load image listing");
            Vec::new()
        }
    };

    let images = listing
        .iter()
        .map(|id| ImageView::new(id, basket.selection.contains(id)))
        .collect();

    let preview = query
        .preview
        .filter(|id| !id.is_empty())
        .map(ImageId::from)
        .map(|id| ImageView::new(&id, basket.selection.contains(&id)));

    Ok(GalleryTemplate {
        nonce,
        images,
        selected_count: basket.selection.len(),
        preview,
        consent_required,
    })
}

/// Toggle one image in the selection.
///
/// Script clients sending `Accept: application/json` get the new state; plain
/// form posts are sent back to the gallery.
#[instrument(skip(session, headers))]
pub async fn toggle(
    session: KioskSession,
    headers: HeaderMap,
    Form(form): Form<ToggleForm>,
) -> Result<Response> {
    if form.image.is_empty() {
        return Err(AppError::BadRequest("missing image".to_string()));
    }

    let (selected, count) = session.toggle_image(ImageId::from(form.image)).await?;

    if wants_json(&headers) {
        Ok(Json(ToggleResponse { selected, count }).into_response())
    } else {
        Ok(Redirect::to("/").into_response())
    }
}

/// Proxy one image's bytes from the gallery service.
#[instrument(skip(state))]
pub async fn image(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let image = state.gallery().fetch_image(&ImageId::from(id)).await?;

    let content_type = image
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    let mut response = image.bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(IMAGE_CACHE_CONTROL));

    Ok(response)
}
