//! Integration tests for the HTTP document source
//!
//! These tests use wiremock to check response decoding and how sessions
//! move through the pool.

use channel_links::crawler::{DocumentSource, HttpSource, SessionPool, SourceError};
use channel_links::parser::parse_document;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LINK_PAGE: &str = r#"<html><body>
<a class="channel-external-link" href="https://acme.example/">Acme</a>
</body></html>"#;

fn create_source(pool: &Arc<SessionPool>) -> HttpSource {
    HttpSource::new(
        Arc::clone(pool),
        Duration::from_secs(5),
        Duration::from_secs(5),
    )
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Id of the session the next acquire hands out
async fn next_session_id(pool: &Arc<SessionPool>) -> u64 {
    let pooled = pool.acquire().await.unwrap();
    pooled.session().unwrap().id
}

#[tokio::test]
async fn test_deflate_encoded_page_is_decoded() {
    let server = MockServer::start().await;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(LINK_PAGE.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    mount(
        &server,
        "/@acme/about",
        ResponseTemplate::new(200)
            .set_body_bytes(compressed)
            .insert_header("content-encoding", "deflate")
            .insert_header("content-type", "text/html"),
    )
    .await;

    let pool = SessionPool::new(1);
    let body = create_source(&pool)
        .fetch(&format!("{}/@acme/about", server.uri()))
        .await
        .unwrap();

    let extraction = parse_document(&body);
    assert_eq!(extraction.links.len(), 1);
    assert_eq!(extraction.links[0].url, "https://acme.example/");
}

#[tokio::test]
async fn test_block_status_discards_session() {
    let server = MockServer::start().await;
    mount(&server, "/ok", ResponseTemplate::new(200).set_body_string(LINK_PAGE)).await;
    mount(&server, "/forbidden", ResponseTemplate::new(403)).await;

    let pool = SessionPool::new(1);
    let source = create_source(&pool);

    source.fetch(&format!("{}/ok", server.uri())).await.unwrap();
    assert_eq!(pool.idle_count(), 1);
    let first = next_session_id(&pool).await;

    let result = source.fetch(&format!("{}/forbidden", server.uri())).await;
    assert_eq!(result, Err(SourceError::Status { code: 403 }));
    assert_eq!(pool.idle_count(), 0);

    source.fetch(&format!("{}/ok", server.uri())).await.unwrap();
    assert_eq!(pool.idle_count(), 1);
    assert_ne!(next_session_id(&pool).await, first);
}

#[tokio::test]
async fn test_ordinary_http_error_keeps_session() {
    let server = MockServer::start().await;
    mount(&server, "/missing", ResponseTemplate::new(404)).await;

    let pool = SessionPool::new(1);
    let source = create_source(&pool);

    let result = source.fetch(&format!("{}/missing", server.uri())).await;
    assert_eq!(result, Err(SourceError::Status { code: 404 }));
    assert_eq!(pool.idle_count(), 1);
}

#[tokio::test]
async fn test_network_error_discards_session() {
    // Bind then release a port so the connection is refused
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();

    let pool = SessionPool::new(1);
    let result = create_source(&pool)
        .fetch(&format!("http://{}/gone", addr))
        .await;

    assert!(matches!(result, Err(SourceError::Network(_))));
    assert_eq!(pool.idle_count(), 0);
}
