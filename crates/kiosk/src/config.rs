//! Kiosk configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GALLERY_API_URL` - Base URL of the image, order, print and payment service
//!
//! ## Optional
//! - `KIOSK_HOST` - Bind address (default: 127.0.0.1)
//! - `KIOSK_PORT` - Listen port (default: 3000)
//! - `KIOSK_BASE_URL` - Public URL of the kiosk (default: <http://localhost:3000>)
//! - `KIOSK_DATABASE_URL` - `SQLite` URL for the session store
//!   (falls back to `DATABASE_URL`, then `sqlite://kiosk-sessions.db?mode=rwc`)
//! - `KIOSK_STATIC_DIR` - Static asset directory (default: crates/kiosk/static)
//! - `CONSENT_LOG_URL` - Consent logging endpoint (default: `{GALLERY_API_URL}/api/consent`)
//! - `KIOSK_UNIT_PRICE` - Price per printed image (default: 2)
//! - `KIOSK_CURRENCY` - ISO 4217 currency code (default: EUR)
//! - `PAYPAL_CLIENT_ID` - Enables the PayPal button when set
//! - `KIOSK_CONSENT_GATE` - Require terms acceptance before the gallery (default: false)
//! - `KIOSK_CONFIRMATION_NEW_WINDOW` - Open confirmation in a new window (default: false)
//! - `KIOSK_AUTO_RETURN_SECONDS` - Return to the gallery after N seconds, 0 disables (default: 10)
//! - `KIOSK_INTERCEPT_BACK` - Redirect browser back-navigation on confirmation (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use print_counter_core::{CurrencyCode, Price};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite://kiosk-sessions.db?mode=rwc";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Kiosk application configuration.
#[derive(Debug, Clone)]
pub struct KioskConfig {
    /// `SQLite` connection URL for the session store
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the kiosk
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Upstream gallery service
    pub gallery: GalleryConfig,
    /// Pricing
    pub pricing: PricingConfig,
    /// PayPal widget configuration, `None` hides the button
    pub paypal: Option<PaypalConfig>,
    /// Optional behaviours of the ordering flow
    pub features: KioskFeatures,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Upstream gallery service endpoints.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Base URL, e.g. `https://gallery.example.com`
    pub api_url: Url,
    /// Consent logging endpoint
    pub consent_url: Url,
}

/// Per-image pricing.
#[derive(Debug, Clone, Copy)]
pub struct PricingConfig {
    /// Price of one printed image
    pub unit_price: Price,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            unit_price: Price::new(Decimal::from(2), CurrencyCode::EUR),
        }
    }
}

/// PayPal JavaScript SDK settings.
#[derive(Debug, Clone)]
pub struct PaypalConfig {
    /// Public client ID passed to the SDK script URL
    pub client_id: String,
}

/// Optional behaviours layered on the ordering flow.
///
/// The historical kiosk builds differed only in these switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KioskFeatures {
    /// Block the gallery until the terms are accepted once
    pub consent_gate: bool,
    /// Open the confirmation screen in a new window and close the checkout one
    pub confirmation_in_new_window: bool,
    /// Delay before the confirmation screen returns to the gallery
    pub auto_return: Option<Duration>,
    /// Redirect back-navigation on the confirmation screen to the gallery
    pub intercept_back_navigation: bool,
}

impl Default for KioskFeatures {
    fn default() -> Self {
        Self {
            consent_gate: false,
            confirmation_in_new_window: false,
            auto_return: Some(Duration::from_secs(10)),
            intercept_back_navigation: false,
        }
    }
}

impl KioskConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("KIOSK_DATABASE_URL");
        let host = parse_env_or_default::<IpAddr>("KIOSK_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("KIOSK_PORT", "3000")?;
        let base_url = get_env_or_default("KIOSK_BASE_URL", "http://localhost:3000");
        let static_dir = PathBuf::from(get_env_or_default("KIOSK_STATIC_DIR", "crates/kiosk/static"));

        let gallery = GalleryConfig::from_env()?;
        let pricing = PricingConfig::from_env()?;
        let paypal = get_optional_env("PAYPAL_CLIENT_ID")
            .filter(|id| !id.trim().is_empty())
            .map(|client_id| PaypalConfig { client_id });
        let features = KioskFeatures::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            static_dir,
            gallery,
            pricing,
            paypal,
            features,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns `true` if the kiosk is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Configuration pointing at the given upstream, with every default.
    ///
    /// Used by tests and local tooling that don't go through the environment.
    #[must_use]
    pub fn for_upstream(api_url: Url) -> Self {
        let consent_url = default_consent_url(&api_url);
        Self {
            database_url: SecretString::from(DEFAULT_DATABASE_URL),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            static_dir: PathBuf::from("crates/kiosk/static"),
            gallery: GalleryConfig {
                api_url,
                consent_url,
            },
            pricing: PricingConfig::default(),
            paypal: None,
            features: KioskFeatures::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl GalleryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = parse_url("GALLERY_API_URL", &get_required_env("GALLERY_API_URL")?)?;
        let consent_url = match get_optional_env("CONSENT_LOG_URL") {
            Some(value) => parse_url("CONSENT_LOG_URL", &value)?,
            None => default_consent_url(&api_url),
        };

        Ok(Self {
            api_url,
            consent_url,
        })
    }
}

impl PricingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let amount = parse_env_or_default::<Decimal>("KIOSK_UNIT_PRICE", "2")?;
        if amount.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "KIOSK_UNIT_PRICE".to_string(),
                "must not be negative".to_string(),
            ));
        }
        let currency = parse_env_or_default::<CurrencyCode>("KIOSK_CURRENCY", "EUR")?;

        Ok(Self {
            unit_price: Price::new(amount, currency),
        })
    }
}

impl KioskFeatures {
    fn from_env() -> Result<Self, ConfigError> {
        let auto_return_seconds = parse_env_or_default::<u64>("KIOSK_AUTO_RETURN_SECONDS", "10")?;

        Ok(Self {
            consent_gate: get_bool_env("KIOSK_CONSENT_GATE")?,
            confirmation_in_new_window: get_bool_env("KIOSK_CONFIRMATION_NEW_WINDOW")?,
            auto_return: (auto_return_seconds > 0).then(|| Duration::from_secs(auto_return_seconds)),
            intercept_back_navigation: get_bool_env("KIOSK_INTERCEPT_BACK")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`, then the local file.
fn get_database_url(primary_key: &str) -> SecretString {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_or_else(
            |_| SecretString::from(DEFAULT_DATABASE_URL),
            SecretString::from,
        )
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default literal.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Read a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`), default false.
fn get_bool_env(key: &str) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(false), |value| parse_bool(key, &value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(url)
}

fn default_consent_url(api_url: &Url) -> Url {
    let mut url = api_url.clone();
    url.path_segments_mut()
        .map(|mut segments| {
            segments.pop_if_empty().extend(["api", "consent"]);
        })
        .ok();
    url
}
