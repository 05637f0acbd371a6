//! Integration tests for the batch pipeline
//!
//! These tests use wiremock to serve About pages and test the full
//! fetch, parse and classify cycle end-to-end.

use channel_links::config::{
    BatchConfig, CacheConfig, CircuitBreakerConfig, Config, FetchConfig, OutputConfig,
    RateLimitConfig,
};
use channel_links::crawler::{run_batch, BatchItem, BatchRunner};
use channel_links::output::InputTable;
use channel_links::url::Category;
use channel_links::ItemStatus;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with very short delays
fn create_test_config() -> Config {
    Config {
        fetch: FetchConfig {
            timeout_ms: 300,
            readiness_timeout_ms: 300,
            block_retry_delay_ms: 20,
            max_block_retries: 1,
            about_suffix: "/about".to_string(),
            session_pool_size: 3,
        },
        rate_limit: RateLimitConfig {
            min_delay_ms: 1,
            max_delay_ms: 10,
            block_pause_min_ms: 5,
            block_pause_max_ms: 5,
        },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 5,
            cooldown_ms: 60_000,
        },
        batch: BatchConfig {
            concurrency: 3,
            batch_size: 0,
            batch_pause_ms: 0,
            dispatch_jitter_min_ms: 0,
            dispatch_jitter_max_ms: 0,
            max_rows: None,
            progress_interval: 5,
        },
        cache: CacheConfig::default(),
        output: OutputConfig {
            input_path: "channels.csv".to_string(),
            output_path: "channels_out.csv".to_string(),
            url_column: None,
            summary_path: None,
            status_path: None,
        },
    }
}

/// About page with the links in the initial data blob (flat records)
fn flat_about_page(name: &str) -> String {
    format!(
        r#"<html><head><title>{name} - About</title></head><body>
<script>var ytInitialData = {{"contents":{{"aboutChannelViewModel":{{"description":"Hello","links":[
{{"title":"Facebook","url":"https://www.facebook.com/{name}"}},
{{"title":"Shop","url":"https://{name}.example/"}}
]}}}}}};</script>
</body></html>"#
    )
}

/// About page with view-model records wrapped in redirect URLs
fn view_model_about_page(name: &str) -> String {
    let record = |title: &str, target: &str| {
        let wrapped = format!(
            "https://www.youtube.com/redirect?event=channel_description&q={}",
            target.replace(':', "%3A").replace('/', "%2F")
        );
        format!(
            r#"{{"channelExternalLinkViewModel":{{"title":{{"content":"{title}"}},"link":{{"commandRuns":[{{"onTap":{{"innertubeCommand":{{"urlEndpoint":{{"url":"{wrapped}"}}}}}}}}]}}}}}}"#
        )
    };

    format!(
        r#"<html><body><script>var ytInitialData = {{"header":{{}},"onResponseReceivedEndpoints":[{{"aboutChannelViewModel":{{"links":[{},{}]}}}}]}};</script></body></html>"#,
        record("Facebook", &format!("https://www.facebook.com/{name}")),
        record("Store", &format!("https://store.{name}.example/")),
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_mixed_batch_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/@alpha/about", flat_about_page("alpha"), 1).await;
    mount_page(&server, "/@beta/about", view_model_about_page("beta"), 1).await;
    mount_page(
        &server,
        "/@walled/about",
        "<html><body>Our systems have detected unusual traffic from your computer network.</body></html>"
            .to_string(),
        2,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/@sleepy/about"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(flat_about_page("sleepy"))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let items = vec![
        BatchItem::new(0, format!("{}/@alpha", base)),
        BatchItem::new(1, format!("{}/@walled", base)),
        BatchItem::new(2, ""),
        BatchItem::new(3, format!("{}/@sleepy/", base)),
        BatchItem::new(4, format!("{}/@beta", base)),
    ];

    let runner = BatchRunner::from_config(&create_test_config());
    let report = runner.run(items, CancellationToken::new()).await;
    let summary = &report.summary;

    assert_eq!(summary.processed, 5);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.error_count(), 2);
    assert_eq!(
        summary.errors.iter().map(|(index, _)| *index).collect::<Vec<_>>(),
        [1, 3]
    );

    let statuses: Vec<_> = report.items.iter().map(|item| item.status).collect();
    assert_eq!(
        statuses,
        [
            ItemStatus::Success,
            ItemStatus::Blocked,
            ItemStatus::Skipped,
            ItemStatus::Timeout,
            ItemStatus::Success
        ]
    );

    let alpha = report.items[0].links.as_ref().unwrap();
    assert_eq!(alpha.get(Category::Facebook), ["https://www.facebook.com/alpha"]);
    assert_eq!(alpha.get(Category::Website), ["https://alpha.example/"]);
    assert!(alpha.get(Category::Other).is_empty());

    let beta = report.items[4].links.as_ref().unwrap();
    assert_eq!(beta.get(Category::Facebook), ["https://www.facebook.com/beta"]);
    assert_eq!(beta.get(Category::Website), ["https://store.beta.example/"]);

    assert!(report.items[1].message.contains("anti-bot"));
    assert!(report.items[3].message.contains("timeout"));

    let status = runner.status();
    assert!(!status.breaker.is_open);
    assert_eq!(status.breaker.failure_count, 0);
}

#[tokio::test]
async fn test_repeated_failures_open_circuit() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/@down/about"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.circuit_breaker.failure_threshold = 2;
    config.batch.concurrency = 1;

    let items = (0..4)
        .map(|index| BatchItem::new(index, format!("{}/@down", base)))
        .collect();

    let runner = BatchRunner::from_config(&config);
    let report = runner.run(items, CancellationToken::new()).await;

    let statuses: Vec<_> = report.items.iter().map(|item| item.status).collect();
    assert_eq!(
        statuses,
        [
            ItemStatus::Failed,
            ItemStatus::Failed,
            ItemStatus::CircuitOpen,
            ItemStatus::CircuitOpen
        ]
    );
    assert!(report.items[0].message.contains("HTTP 500"));
    assert_eq!(report.summary.error_count(), 4);
    assert!(runner.status().breaker.is_open);
}

#[tokio::test]
async fn test_page_without_links_is_not_an_error() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/@quiet/about",
        "<html><body><p>Just a description.</p></body></html>".to_string(),
        1,
    )
    .await;

    let report = run_batch(
        &create_test_config(),
        vec![BatchItem::new(0, format!("{}/@quiet", base))],
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.items[0].status, ItemStatus::NoLinks);
    assert_eq!(report.items[0].message, "No links found with any method");
    assert_eq!(report.summary.error_count(), 0);
}

#[tokio::test]
async fn test_csv_table_round_trip() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/@alpha/about", flat_about_page("alpha"), 1).await;

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("channels.csv");
    let output = dir.path().join("channels_out.csv");
    std::fs::write(
        &input,
        format!("Name,Channel Link\nAlpha,{}/@alpha\nNobody,\nBroken,not-a-url\n", base),
    )
    .unwrap();

    let mut config = create_test_config();
    config.cache.enabled = true;

    let table = InputTable::read(&input, None, None).unwrap();
    let runner = BatchRunner::from_config(&config);
    let report = runner.run(table.batch_items(), CancellationToken::new()).await;
    table.write_augmented(&report.items, &output).unwrap();

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(
        headers,
        [
            "Name",
            "Channel Link",
            "Website",
            "Facebook",
            "Instagram",
            "Twitter",
            "LinkedIn",
            "TikTok",
            "Other Links",
            "Processing Status"
        ]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(&rows[0][2], "https://alpha.example/");
    assert_eq!(&rows[0][3], "https://www.facebook.com/alpha");
    assert!(rows[0][9].starts_with("Success"));
    assert_eq!(&rows[1][9], "Skipped (No URL)");
    assert_eq!(&rows[2][9], "Invalid channel URL: not-a-url");

    assert_eq!(runner.status().cache_entries, Some(1));
}
