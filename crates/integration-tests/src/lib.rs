//! Integration test harness for the print counter kiosk.
//!
//! Each test starts two servers on ephemeral ports:
//!
//! - a fake gallery service that records every upstream call, and
//! - the real kiosk router pointed at it, with in-memory sessions.
//!
//! Tests then drive the kiosk with a cookie-enabled client that does not
//! follow redirects, so every `303` can be asserted.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p print-counter-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use print_counter_kiosk::{app, config::KioskConfig, state::AppState};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;
use url::Url;

/// How long to wait for the detached print request.
const CALL_WAIT: Duration = Duration::from_secs(2);

/// One request received by the fake gallery service.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Request path, e.g. `/api/order`.
    pub path: String,
    /// JSON body, `null` for GET requests.
    pub body: Value,
}

/// How the fake gallery service answers.
#[derive(Debug, Clone)]
pub struct GalleryBehaviour {
    /// Listing returned by `/api/images`.
    pub images: Vec<String>,
    /// Answer `/api/order` with a 500.
    pub fail_order: bool,
    /// Answer `/api/print` with a 500.
    pub fail_print: bool,
    /// Answer `/api/consent` with a 500.
    pub fail_consent: bool,
    /// Status returned by `/api/paypal/capture-order`.
    pub capture_status: String,
}

impl Default for GalleryBehaviour {
    fn default() -> Self {
        Self {
            images: vec![
                "IMG_0001.jpg".to_string(),
                "IMG_0002.jpg".to_string(),
                "summer party #3.jpg".to_string(),
            ],
            fail_order: false,
            fail_print: false,
            fail_consent: false,
            capture_status: "COMPLETED".to_string(),
        }
    }
}

#[derive(Clone)]
struct FakeGalleryState {
    behaviour: Arc<GalleryBehaviour>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeGalleryState {
    fn record(&self, path: impl Into<String>, body: Value) {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(RecordedCall {
                path: path.into(),
                body,
            });
    }
}

/// Fake upstream gallery service.
pub struct FakeGallery {
    /// Base URL of the fake service.
    pub url: Url,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeGallery {
    /// Start the fake service on an ephemeral port.
    pub async fn start(behaviour: GalleryBehaviour) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = FakeGalleryState {
            behaviour: Arc::new(behaviour),
            calls: Arc::clone(&calls),
        };

        let router = Router::new()
            .route("/api/images", get(list_images))
            .route("/images/{id}", get(image_bytes))
            .route("/api/consent", post(consent))
            .route("/api/order", post(order))
            .route("/api/print", post(print))
            .route("/api/paypal/create-order", post(create_payment))
            .route("/api/paypal/capture-order", post(capture_payment))
            .with_state(state);

        let addr = serve(router).await;
        let url = Url::parse(&format!("http://{addr}/")).expect("valid fake gallery URL");

        Self { url, calls }
    }

    /// Every call received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    /// Paths of every POST received so far, in arrival order.
    #[must_use]
    pub fn posted_paths(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.path.starts_with("/api/") && c.path != "/api/images")
            .map(|c| c.path)
            .collect()
    }

    /// Calls to one path.
    #[must_use]
    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    /// Wait until a call to `path` has arrived (the print request is detached).
    pub async fn wait_for(&self, path: &str) -> Option<RecordedCall> {
        let deadline = tokio::time::Instant::now() + CALL_WAIT;
        loop {
            if let Some(call) = self.calls_to(path).into_iter().next() {
                return Some(call);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

async fn list_images(State(state): State<FakeGalleryState>) -> Json<Vec<String>> {
    state.record("/api/images", Value::Null);
    Json(state.behaviour.images.clone())
}

async fn image_bytes(State(state): State<FakeGalleryState>, Path(id): Path<String>) -> Response {
    state.record(format!("/images/{id}"), Value::Null);
    if state.behaviour.images.contains(&id) {
        ([(CONTENT_TYPE, "image/jpeg")], id.into_bytes()).into_response()
    } else {
        (StatusCode::NOT_FOUND, "no such image").into_response()
    }
}

fn ack_or_fail(fail: bool, message: &str) -> Response {
    if fail {
        (StatusCode::INTERNAL_SERVER_ERROR, "upstream failure").into_response()
    } else {
        Json(json!({ "message": message })).into_response()
    }
}

async fn consent(State(state): State<FakeGalleryState>, Json(body): Json<Value>) -> Response {
    state.record("/api/consent", body);
    ack_or_fail(state.behaviour.fail_consent, "Consent logged")
}

async fn order(State(state): State<FakeGalleryState>, Json(body): Json<Value>) -> Response {
    state.record("/api/order", body);
    ack_or_fail(state.behaviour.fail_order, "Order saved")
}

async fn print(State(state): State<FakeGalleryState>, Json(body): Json<Value>) -> Response {
    state.record("/api/print", body);
    ack_or_fail(state.behaviour.fail_print, "Printing started")
}

async fn create_payment(State(state): State<FakeGalleryState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("/api/paypal/create-order", body);
    Json(json!({ "id": "PAY-1" }))
}

async fn capture_payment(State(state): State<FakeGalleryState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("/api/paypal/capture-order", body);
    Json(json!({ "capture": { "status": state.behaviour.capture_status } }))
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has an address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("test server failed");
    });

    addr
}

/// A running kiosk plus a browser-like client.
pub struct TestKiosk {
    /// Base URL of the kiosk, without trailing slash.
    pub base_url: String,
    /// Cookie-enabled client that does not follow redirects.
    pub client: reqwest::Client,
}

impl TestKiosk {
    /// Start a kiosk against `gallery`, adjusting the default config first.
    pub async fn start(gallery: &FakeGallery, configure: impl FnOnce(&mut KioskConfig)) -> Self {
        let mut config = KioskConfig::for_upstream(gallery.url.clone());
        configure(&mut config);

        let state = AppState::new(config).expect("Failed to build kiosk state");
        let addr = serve(app(state, MemoryStore::default())).await;

        Self {
            base_url: format!("http://{addr}"),
            client: Self::browser(),
        }
    }

    /// A fresh browser profile (new cookie jar).
    #[must_use]
    pub fn browser() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a kiosk page.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("kiosk GET failed")
    }

    /// POST a form to the kiosk.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("kiosk form POST failed")
    }

    /// POST JSON to the kiosk, as the page script does.
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .expect("kiosk JSON POST failed")
    }

    /// Select images and enter a name, as a customer would.
    pub async fn fill_basket(&self, images: &[&str], name: &str) {
        for image in images {
            let response = self.post_form("/selection/toggle", &[("image", image)]).await;
            assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
        }
        let response = self.post_form("/form", &[("name", name)]).await;
        assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
    }
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
