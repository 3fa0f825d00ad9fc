//! Demo backend against a local HTTP server
//!
//! Run with: cargo test --test demo_source_test

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use melodora::core::metrics;
use melodora::download::source::{AudioQuality, DemoSource, DownloadAdapter};

const FAKE_MP3: &[u8] = &[0x49, 0x44, 0x33, 0x03, 0x00, 0x00, 0x00, 0x00];

#[tokio::test]
async fn test_download_fetches_hosted_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/qg0zob.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_MP3.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let demo = DemoSource::new(&server.uri()).unwrap();
    let payload = demo
        .download("dQw4w9WgXcQ", AudioQuality::High)
        .await
        .expect("catalog track must download");

    assert_eq!(payload.bytes, FAKE_MP3.to_vec());
    assert_eq!(payload.title, "Never Gonna Give You Up");
    assert_eq!(payload.artist, "Rick Astley");
    assert_eq!(payload.duration_seconds, Some(212));
    assert!(payload.filename.starts_with("Rick Astley"));
    assert!(payload.filename.ends_with(".mp3"));
}

#[tokio::test]
async fn test_base_url_with_path_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/ec9o4o.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_MP3.to_vec()))
        .mount(&server)
        .await;

    let demo = DemoSource::new(&format!("{}/media", server.uri())).unwrap();
    let payload = demo.download("JGwWNGJdvx8", AudioQuality::Low).await;
    assert!(payload.is_some());
}

#[tokio::test]
async fn test_missing_file_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let demo = DemoSource::new(&server.uri()).unwrap();
    assert!(demo.download("kJQP7kiw5Fk", AudioQuality::Medium).await.is_none());
}

#[tokio::test]
async fn test_server_error_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let demo = DemoSource::new(&server.uri()).unwrap();
    assert!(demo.download("dQw4w9WgXcQ", AudioQuality::High).await.is_none());
}

#[tokio::test]
async fn test_successful_download_is_timed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/luvrwr.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_MP3.to_vec()))
        .mount(&server)
        .await;
    let timings = || {
        metrics::DOWNLOAD_DURATION_SECONDS
            .with_label_values(&["demo"])
            .get_sample_count()
    };

    let before = timings();
    let demo = DemoSource::new(&server.uri()).unwrap();
    assert!(demo.download("kJQP7kiw5Fk", AudioQuality::High).await.is_some());

    // Other tests in this binary may download concurrently
    assert!(timings() > before);
}
