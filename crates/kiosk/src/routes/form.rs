//! Name entry route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use print_counter_core::{CustomerName, NameError};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::KioskSession;

/// Name entry page template.
#[derive(Template, WebTemplate)]
#[template(path = "form.html")]
pub struct FormTemplate {
    pub nonce: String,
    pub name: String,
    pub error: Option<&'static str>,
    pub selected_count: usize,
}

/// Name form data.
#[derive(Debug, Deserialize)]
pub struct NameForm {
    #[serde(default)]
    pub name: String,
}

/// Inline message for an unusable name.
#[must_use]
pub const fn name_error_message(error: &NameError) -> &'static str {
    match error {
        NameError::Empty => "Name is required!",
        NameError::TooLong { .. } => "Name is too long!",
    }
}

/// Display the name entry form, pre-filled from the session.
#[instrument(skip(session, nonce))]
pub async fn show(session: KioskSession, CspNonce(nonce): CspNonce) -> Result<FormTemplate> {
    let basket = session.basket().await?;

    Ok(FormTemplate {
        nonce,
        name: basket.name,
        error: None,
        selected_count: basket.selection.len(),
    })
}

/// Store the name and continue to checkout if it is usable.
#[instrument(skip(session, nonce, form))]
pub async fn submit(
    session: KioskSession,
    CspNonce(nonce): CspNonce,
    Form(form): Form<NameForm>,
) -> Result<Response> {
    session.set_name(&form.name).await?;

    match CustomerName::parse(&form.name) {
        Ok(_) => Ok(Redirect::to("/checkout").into_response()),
        Err(e) => {
            tracing::debug!(error = %e, "Name rejected");
            let selected_count = session.basket().await?.selection.len();
            let page = FormTemplate {
                nonce,
                name: form.name,
                error: Some(name_error_message(&e)),
                selected_count,
            };
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_error_messages() {
        assert_eq!(name_error_message(&NameError::Empty), "Name is required!");
        assert_eq!(
            name_error_message(&NameError::TooLong { max: 120 }),
            "Name is too long!"
        );
    }
}
