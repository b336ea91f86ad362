//! End-to-end gallery tests: listing, selection, image proxy, terms gate.

use print_counter_integration_tests::{FakeGallery, GalleryBehaviour, TestKiosk, location};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let gallery = FakeGallery::start(GalleryBehaviour::default()).await;
    let kiosk = TestKiosk::start(&gallery, |_| {}).await;

    let response = kiosk.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.expect("body"), "ok");
}

#[tokio::test]
async fn test_gallery_lists_images_with_escaped_urls() {
    let gallery = FakeGallery::start(GalleryBehaviour::default()).await;
    let kiosk = TestKiosk::start(&gallery, |_| {}).await;

    let response = kiosk.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("content-security-policy"));
    assert!(response.headers().contains_key("x-request-id"));
    let body = response.text().await.expect("body");
    assert!(body.contains("/images/IMG_0001.jpg"));
    assert!(body.contains("/images/summer%20party%20%233.jpg"));
    assert_eq!(gallery.calls_to("/api/images").len(), 1);
}

#[tokio::test]
async fn test_gallery_renders_empty_when_listing_fails() {
    // Port 9 (discard) refuses connections on test machines
    let gallery = FakeGallery::start(GalleryBehaviour::default()).await;
    let kiosk = TestKiosk::start(&gallery, |config| {
        config.gallery.api_url = url::Url::parse("http://127.0.0.1:9/").expect("url");
    })
    .await;

    let response = kiosk.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("body");
    assert!(body.contains("No photos are available right now."));
}

#[tokio::test]
async fn test_toggle_json_and_form() {
    let gallery = FakeGallery::start(GalleryBehaviour::default()).await;
    let kiosk = TestKiosk::start(&gallery, |_| {}).await;

    let response = kiosk
        .client
        .post(format!("{}/selection/toggle", kiosk.base_url))
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&[("image", "IMG_0001.jpg")])
        .send()
        .await
        .expect("toggle");
    assert_eq!(response.status(), StatusCode::OK);
    let state: serde_json::Value = response.json().await.expect("json");
    assert_eq!(state, json!({ "selected": true, "count": 1 }));

    // Same image again through the plain form removes it
    let response = kiosk
        .post_form("/selection/toggle", &[("image", "IMG_0001.jpg")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));

    let body = kiosk.get("/").await.text().await.expect("body");
    assert!(body.contains("<span id=\"selected-count\">0</span>"));
}

#[tokio::test]
async fn test_selection_is_per_browser() {
    let gallery = FakeGallery::start(GalleryBehaviour::default()).await;
    let kiosk = TestKiosk::start(&gallery, |_| {}).await;
    kiosk
        .post_form("/selection/toggle", &[("image", "IMG_0001.jpg")])
        .await;

    let other = TestKiosk::browser();
    let body = other
        .get(format!("{}/", kiosk.base_url))
        .send()
        .await
        .expect("gallery")
        .text()
        .await
        .expect("body");

    assert!(body.contains("<span id=\"selected-count\">0</span>"));
}

#[tokio::test]
async fn test_concurrent_toggles_keep_every_image() {
    let gallery = FakeGallery::start(GalleryBehaviour::default()).await;
    let kiosk = TestKiosk::start(&gallery, |_| {}).await;
    // First toggle establishes the session cookie
    kiosk
        .post_form("/selection/toggle", &[("image", "img0.jpg")])
        .await;

    let mut toggles = tokio::task::JoinSet::new();
    for i in 1..20 {
        let client = kiosk.client.clone();
        let url = format!("{}/selection/toggle", kiosk.base_url);
        toggles.spawn(async move {
            client
                .post(url)
                .header(reqwest::header::ACCEPT, "application/json")
                .form(&[("image", format!("img{i}.jpg"))])
                .send()
                .await
                .expect("toggle")
                .status()
        });
    }
    while let Some(status) = toggles.join_next().await {
        assert_eq!(status.expect("toggle task"), StatusCode::OK);
    }

    let response = kiosk
        .client
        .post(format!("{}/selection/toggle", kiosk.base_url))
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&[("image", "img0.jpg")])
        .send()
        .await
        .expect("toggle");
    let state: serde_json::Value = response.json().await.expect("json");

    assert_eq!(state, json!({ "selected": false, "count": 19 }));
}

#[tokio::test]
async fn test_preview_shows_one_overlay() {
    let gallery = FakeGallery::start(GalleryBehaviour::default()).await;
    let kiosk = TestKiosk::start(&gallery, |_| {}).await;

    let body = kiosk
        .get("/?preview=IMG_0002.jpg")
        .await
        .text()
        .await
        .expect("body");

    assert_eq!(body.matches("enlarged-image").count(), 1);
    assert!(body.contains("Close preview"));
}

#[tokio::test]
async fn test_image_proxy_passes_bytes_and_type() {
    let gallery = FakeGallery::start(GalleryBehaviour::default()).await;
    let kiosk = TestKiosk::start(&gallery, |_| {}).await;

    let response = kiosk.get("/images/summer%20party%20%233.jpg").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/jpeg");
    assert_eq!(
        response.bytes().await.expect("bytes").as_ref(),
        b"summer party #3.jpg"
    );

    let missing = kiosk.get("/images/nope.jpg").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Terms Gate
// ============================================================================

fn consent_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("pc_consent="))
        .map(str::to_string)
}

#[tokio::test]
async fn test_consent_gate_blocks_listing_until_accepted() {
    let gallery = FakeGallery::start(GalleryBehaviour::default()).await;
    let kiosk = TestKiosk::start(&gallery, |config| {
        config.features.consent_gate = true;
    })
    .await;

    let body = kiosk.get("/").await.text().await.expect("body");
    assert!(body.contains("I accept"));
    assert!(gallery.calls_to("/api/images").is_empty());

    let response = kiosk.post_form("/consent", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));

    let consent = gallery.calls_to("/api/consent");
    assert_eq!(consent.len(), 1);
    let device_id = consent[0].body["deviceId"].as_str().expect("device id");
    assert_eq!(device_id.len(), 24);
    assert!(consent[0].body["timestamp"].is_string());

    // The device id is what the browser keeps
    let cookie = consent_cookie(&response).expect("consent cookie");
    assert!(cookie.starts_with(&format!("pc_consent={device_id};")));
    assert!(cookie.contains("Max-Age="));

    let body = kiosk.get("/").await.text().await.expect("body");
    assert!(!body.contains("I accept"));
    assert_eq!(gallery.calls_to("/api/images").len(), 1);
}

#[tokio::test]
async fn test_consent_survives_session_loss() {
    let gallery = FakeGallery::start(GalleryBehaviour::default()).await;
    let kiosk = TestKiosk::start(&gallery, |config| {
        config.features.consent_gate = true;
    })
    .await;
    let response = kiosk.post_form("/consent", &[]).await;
    let cookie = consent_cookie(&response).expect("consent cookie");
    let pair = cookie.split(';').next().expect("name=value").to_string();

    // A browser whose session expired still carries the consent cookie
    let body = reqwest::Client::new()
        .get(format!("{}/", kiosk.base_url))
        .header(reqwest::header::COOKIE, pair)
        .send()
        .await
        .expect("gallery")
        .text()
        .await
        .expect("body");

    assert!(!body.contains("I accept"));
    assert_eq!(gallery.calls_to("/api/consent").len(), 1);
}

#[tokio::test]
async fn test_consent_accepted_even_when_logging_fails() {
    let gallery = FakeGallery::start(GalleryBehaviour {
        fail_consent: true,
        ..GalleryBehaviour::default()
    })
    .await;
    let kiosk = TestKiosk::start(&gallery, |config| {
        config.features.consent_gate = true;
    })
    .await;

    kiosk.post_form("/consent", &[]).await;

    let body = kiosk.get("/").await.text().await.expect("body");
    assert!(!body.contains("I accept"));
}
