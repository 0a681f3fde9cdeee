//! End-to-end router tests driven through `tower::ServiceExt::oneshot`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use tempfile::TempDir;
use tower::ServiceExt;
use warden_api::{ApiErrorResponse, AppState, CORRELATION_ID_HEADER, bootstrap, routes};
use warden_config::ApplicationConfig;
use warden_guard::{CRYPTO_DECOY_URLS, Challenge};

const MALWARE: &[u8] = b"[InternetShortcut]\nURL=https://example.com/malware\n";

struct TestServer {
    _root: TempDir,
    state: AppState,
    router: Router,
}

fn server() -> TestServer {
    let root = tempfile::tempdir().unwrap();
    let base = root.path().join("quarantine");
    fs::create_dir_all(base.join("nested")).unwrap();
    fs::write(root.path().join("secret.txt"), b"top secret").unwrap();
    fs::write(base.join("juicy_malware_linux_amd_64.url"), MALWARE).unwrap();

    server_with_base(root, base)
}

fn server_with_base(root: TempDir, base: PathBuf) -> TestServer {
    let mut config = ApplicationConfig::default();
    config.quarantine.base_dir = base;
    let state = bootstrap::initialize_app_state(&config);
    let router = routes::create_router(state.clone());
    TestServer {
        _root: root,
        state,
        router,
    }
}

async fn get(router: &Router, uri: &str) -> Response {
    router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn error_body(response: Response) -> ApiErrorResponse {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_quarantine_file_is_streamed() {
    let srv = server();
    let response = get(&srv.router, "/quarantine/juicy_malware_linux_amd_64.url").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH],
        MALWARE.len().to_string().as_str()
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], MALWARE);
}

#[tokio::test]
async fn test_encoded_traversal_is_forbidden() {
    let srv = server();
    for uri in [
        "/quarantine/..%2Fsecret.txt",
        "/quarantine/..%2F..%2Fetc%2Fpasswd",
        "/quarantine/%2Fetc%2Fpasswd",
    ] {
        let response = get(&srv.router, uri).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        let body = error_body(response).await;
        assert_eq!(body.error, "FORBIDDEN");
        assert!(!body.message.contains("secret"));
    }
}

#[tokio::test]
async fn test_nul_byte_is_bad_request() {
    let srv = server();
    let response = get(&srv.router, "/quarantine/juicy%00.url").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_body(response).await.error, "INVALID_INPUT");
}

#[tokio::test]
async fn test_missing_file_and_directory_are_not_found() {
    let srv = server();
    for uri in ["/quarantine/nope.txt", "/quarantine/nested"] {
        let response = get(&srv.router, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_missing_base_directory_is_server_error_without_path() {
    let root = tempfile::tempdir().unwrap();
    let base = root.path().join("never-created");
    let srv = server_with_base(root, base);

    let response = get(&srv.router, "/quarantine/juicy_malware_linux_amd_64.url").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = error_body(response).await;
    assert_eq!(body.error, "CONFIGURATION_ERROR");
    assert!(!body.message.contains("never-created"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_escape_is_forbidden() {
    let srv = server();
    let base = srv.state.path_guard.base_dir().to_path_buf();
    std::os::unix::fs::symlink("../secret.txt", base.join("escape")).unwrap();

    let response = get(&srv.router, "/quarantine/escape").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_allowlisted_redirect_is_found() {
    let srv = server();
    let response = get(
        &srv.router,
        "/redirect?to=https%3A%2F%2Fgithub.com%2Fjuice-shop%2Fjuice-shop",
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://github.com/juice-shop/juice-shop"
    );
}

#[tokio::test]
async fn test_relative_redirect_is_found() {
    let srv = server();
    let response = get(&srv.router, "/redirect?to=%2Fabout").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/about");
}

#[tokio::test]
async fn test_non_ascii_relative_redirect_keeps_raw_bytes() {
    let srv = server();
    let response = get(&srv.router, "/redirect?to=%2F%C3%A9").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION].as_bytes(), "/é".as_bytes());
}

#[tokio::test]
async fn test_permitted_target_with_newline_is_not_acceptable() {
    let srv = server();
    // The URL parser strips the newline, so the origin matches the allowlist
    let response = get(
        &srv.router,
        "/redirect?to=https%3A%2F%2Fgithub.com%2Fjuice-shop%2Fjuice-shop%0A",
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert!(response.headers().get(header::LOCATION).is_none());
}

#[tokio::test]
async fn test_rejected_redirects_are_not_acceptable() {
    let srv = server();
    let cases = [
        ("/redirect?to=https%3A%2F%2Fevil.net%2F", "https://evil.net/"),
        ("/redirect?to=%2F%2Fevil.net", "//evil.net"),
        ("/redirect?to=javascript%3Aalert(1)", "javascript:alert(1)"),
        ("/redirect?to=", ""),
        ("/redirect", ""),
    ];

    for (uri, target) in cases {
        let response = get(&srv.router, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE, "{uri}");
        assert!(response.headers().get(header::LOCATION).is_none());

        let body = error_body(response).await;
        assert_eq!(body.error, "UNRECOGNIZED");
        assert!(
            body.message
                .starts_with(&format!("Unrecognized target URL for redirect: {target}")),
            "{}",
            body.message
        );
    }
}

#[tokio::test]
async fn test_redirects_feed_challenge_tracker() {
    let srv = server();
    let decoy = CRYPTO_DECOY_URLS[1].replace(':', "%3A").replace('/', "%2F");

    let response = get(&srv.router, &format!("/redirect?to={decoy}")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(srv.state.challenges.is_solved(Challenge::RedirectCryptoCurrency));

    let response = get(&srv.router, "/redirect?to=https%3A%2F%2Fevil.net").await;
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert!(!srv.state.challenges.is_solved(Challenge::Redirect));
}

#[tokio::test]
async fn test_correlation_id_is_echoed_or_generated() {
    let srv = server();
    let id = "6f1c2d3e-4b5a-4c6d-8e7f-901234567890";

    let response = srv
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/quarantine/..%2Fsecret.txt")
                .header(CORRELATION_ID_HEADER, id)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()[CORRELATION_ID_HEADER], id);
    assert_eq!(error_body(response).await.correlation_id.to_string(), id);

    let response = get(&srv.router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let generated = response.headers()[CORRELATION_ID_HEADER].to_str().unwrap();
    assert_ne!(generated, id);
    assert_eq!(generated.len(), 36);
}

#[tokio::test]
async fn test_health_reports_allowlist() {
    let srv = server();
    let response = get(&srv.router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["allowlist_entries"], 8);
    assert_eq!(body["allowlist_origins"], 8);
}

#[tokio::test]
async fn test_router_with_timeout_serves_requests() {
    let srv = server();
    let router = routes::create_router_with_timeout(srv.state.clone(), Duration::from_secs(5));

    let response = get(&router, "/quarantine/juicy_malware_linux_amd_64.url").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], MALWARE);

    let response = get(&router, "/redirect?to=%2Fabout").await;
    assert_eq!(response.status(), StatusCode::FOUND);
}
