//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::KioskConfig;
use crate::middleware::SessionLocks;
use crate::services::{GalleryClient, GalleryError, OrderFlow};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: KioskConfig,
    gallery: GalleryClient,
    orders: OrderFlow,
    session_locks: SessionLocks,
}

impl AppState {
    /// Create application state talking to the configured gallery service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: KioskConfig) -> Result<Self, GalleryError> {
        let gallery = GalleryClient::new(&config.gallery)?;
        let orders = OrderFlow::new(
            Arc::new(gallery.clone()),
            Arc::new(gallery.clone()),
            config.pricing.unit_price,
        );

        Ok(Self::with_parts(config, gallery, orders))
    }

    /// Assemble state from already-built parts.
    #[must_use]
    pub fn with_parts(config: KioskConfig, gallery: GalleryClient, orders: OrderFlow) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                gallery,
                orders,
                session_locks: SessionLocks::default(),
            }),
        }
    }

    /// Get a reference to the kiosk configuration.
    #[must_use]
    pub fn config(&self) -> &KioskConfig {
        &self.inner.config
    }

    /// Get a reference to the gallery service client.
    #[must_use]
    pub fn gallery(&self) -> &GalleryClient {
        &self.inner.gallery
    }

    /// Get a reference to the checkout flow.
    #[must_use]
    pub fn orders(&self) -> &OrderFlow {
        &self.inner.orders
    }

    /// Get the per-session request locks.
    #[must_use]
    pub fn session_locks(&self) -> &SessionLocks {
        &self.inner.session_locks
    }
}
