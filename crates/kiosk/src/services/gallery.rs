//! HTTP client for the gallery service.
//!
//! The gallery service is the shop's own backend. It lists the photographs
//! taken that day, serves their bytes, records orders, drives the counter
//! printer, logs terms acceptance, and fronts the PayPal order API.
//!
//! Every call treats a transport error or a non-2xx status as a failure.
//! There are no retries and no client-side timeouts.

use std::sync::Arc;

use async_trait::async_trait;
use print_counter_core::{CaptureStatus, ConsentRecord, ImageId, OrderSnapshot, Price};
use reqwest::header::CONTENT_TYPE;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::GalleryConfig;
use crate::services::ordering::{OrderService, PaymentProvider, PaymentToken};

/// Errors that can occur when calling the gallery service.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Acknowledgment object returned by the order, print and consent endpoints.
pub type Ack = serde_json::Value;

/// Image bytes with the upstream content type.
#[derive(Debug, Clone)]
pub struct ImageBytes {
    /// `Content-Type` reported by the gallery service, if any.
    pub content_type: Option<String>,
    /// Raw image data.
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct CreatePaymentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
}

#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct CapturePaymentRequest<'a> {
    #[serde(rename = "orderID")]
    order_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CapturePaymentResponse {
    capture: CaptureDetails,
}

#[derive(Debug, Deserialize)]
struct CaptureDetails {
    status: CaptureStatus,
}

/// Client for the gallery service.
#[derive(Clone)]
pub struct GalleryClient {
    inner: Arc<GalleryClientInner>,
}

struct GalleryClientInner {
    client: reqwest::Client,
    base_url: String,
    consent_url: Url,
}

impl GalleryClient {
    /// Create a new gallery client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &GalleryConfig) -> Result<Self, GalleryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("print-counter-kiosk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(GalleryClientInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                consent_url: config.consent_url.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// URL of an image's bytes, with the identifier percent-encoded.
    #[must_use]
    pub fn image_url(&self, id: &ImageId) -> String {
        self.endpoint(&format!("/images/{}", urlencoding::encode(id.as_str())))
    }

    /// Fetch the ordered list of images available today.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a JSON array of strings.
    #[instrument(skip(self))]
    pub async fn list_images(&self) -> Result<Vec<ImageId>, GalleryError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("/api/images"))
            .send()
            .await?;

        let images: Vec<ImageId> = read_json(response).await?;
        debug!(count = images.len(), "Fetched image listing");
        Ok(images)
    }

    /// Fetch the bytes of one image.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the image does not exist.
    #[instrument(skip(self), fields(image = %id))]
    pub async fn fetch_image(&self, id: &ImageId) -> Result<ImageBytes, GalleryError> {
        let response = self.inner.client.get(self.image_url(id)).send().await?;
        let response = ensure_success(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response.bytes().await?.to_vec();

        Ok(ImageBytes {
            content_type,
            bytes,
        })
    }

    /// Send a terms-acceptance record to the consent log.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, record), fields(device_id = %record.device_id))]
    pub async fn log_consent(&self, record: &ConsentRecord) -> Result<Ack, GalleryError> {
        let response = self
            .inner
            .client
            .post(self.inner.consent_url.clone())
            .json(record)
            .send()
            .await?;

        read_ack(response).await
    }

    async fn post_snapshot(
        &self,
        path: &str,
        snapshot: &OrderSnapshot,
    ) -> Result<Ack, GalleryError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(path))
            .json(snapshot)
            .send()
            .await?;

        read_ack(response).await
    }
}

#[async_trait]
impl OrderService for GalleryClient {
    #[instrument(skip(self, snapshot), fields(images = snapshot.image_count(), method = %snapshot.payment_method))]
    async fn submit_order(&self, snapshot: &OrderSnapshot) -> Result<Ack, GalleryError> {
        self.post_snapshot("/api/order", snapshot).await
    }

    #[instrument(skip(self, snapshot), fields(images = snapshot.image_count()))]
    async fn dispatch_print(&self, snapshot: &OrderSnapshot) -> Result<Ack, GalleryError> {
        self.post_snapshot("/api/print", snapshot).await
    }
}

#[async_trait]
impl PaymentProvider for GalleryClient {
    #[instrument(skip(self, total), fields(total = %total))]
    async fn create_order(&self, total: Price) -> Result<PaymentToken, GalleryError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/api/paypal/create-order"))
            .json(&CreatePaymentRequest {
                total: total.amount,
            })
            .send()
            .await?;

        let created: CreatePaymentResponse = read_json(response).await?;
        Ok(PaymentToken::new(created.id))
    }

    #[instrument(skip(self))]
    async fn capture_order(&self, order_id: &str) -> Result<CaptureStatus, GalleryError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/api/paypal/capture-order"))
            .json(&CapturePaymentRequest { order_id })
            .send()
            .await?;

        let captured: CapturePaymentResponse = read_json(response).await?;
        Ok(captured.capture.status)
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Turn a non-success status into [`GalleryError::Api`].
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GalleryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(GalleryError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Parse a successful JSON body.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GalleryError> {
    let response = ensure_success(response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| GalleryError::Parse(e.to_string()))
}

/// Parse an acknowledgment body; an empty body counts as `null`.
async fn read_ack(response: reqwest::Response) -> Result<Ack, GalleryError> {
    let response = ensure_success(response).await?;
    let body = response.text().await?;
    parse_ack(&body)
}

fn parse_ack(body: &str) -> Result<Ack, GalleryError> {
    if body.trim().is_empty() {
        return Ok(Ack::Null);
    }
    serde_json::from_str(body).map_err(|e| GalleryError::Parse(e.to_string()))
}
