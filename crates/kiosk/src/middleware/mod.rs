//! HTTP middleware stack for the kiosk.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (per-request nonce for inline scripts)
//! 5. Security headers (CSP built from the nonce)
//! 6. Session lock (one session-writing request per session at a time)
//! 7. Session layer (tower-sessions with `SQLite` store)

pub mod csp;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use csp::{CspNonce, csp_nonce_middleware};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SessionLocks, create_session_layer, session_lock_middleware};
