//! Terms gate route handler.

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect},
};
use tracing::instrument;

use crate::models::consent_cookie;
use crate::services::consent::accept_terms;
use crate::state::AppState;

/// Accept the terms for this device and return to the gallery.
#[instrument(skip(state))]
pub async fn accept(State(state): State<AppState>) -> impl IntoResponse {
    let record = accept_terms(state.gallery()).await;
    let cookie = consent_cookie(&record.device_id, state.config().is_secure());

    ([(SET_COOKIE, cookie.to_string())], Redirect::to("/"))
}
