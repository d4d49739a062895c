//! Integration tests for the enrichment pipeline
//!
//! These tests use wiremock to stand in for the shortening service, the
//! favicon endpoint, and the target pages, and drive the full pipeline
//! end-to-end against a real SQLite store.

use linkstash::config::MetadataConfig;
use linkstash::enrich::{EnrichmentPipeline, LinkIcon, PipelineError, Snapshot};
use linkstash::metadata::MetadataFetcher;
use linkstash::resolver::AliasResolver;
use linkstash::storage::{LinkRecord, LinkStore, SqliteStore, StoreError, StoreResult};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A valid 1x1 PNG
fn one_pixel_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x63, 0xF8, 0xCF, 0xC0, 0xF0, 0x1F, 0x00, 0x05, 0x00, 0x01, 0xFF, 0x89, 0x99,
        0x3D, 0x1D, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]
}

struct Harness {
    server: MockServer,
    store: Arc<Mutex<SqliteStore>>,
    pipeline: EnrichmentPipeline<SqliteStore>,
    // Keeps the database directory alive for the duration of the test
    _dir: tempfile::TempDir,
}

/// Builds a pipeline whose resolver and favicon endpoint both point at a
/// fresh mock server, over a file-backed store seeded with `server_ids`
async fn setup(server_ids: &[&str]) -> Harness {
    let server = MockServer::start().await;

    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteStore::new(&dir.path().join("links.db")).unwrap();
    for server_id in server_ids {
        store.save(&LinkRecord::new(*server_id)).unwrap();
    }
    let store = Arc::new(Mutex::new(store));

    let resolver = AliasResolver::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let metadata = MetadataFetcher::new(&MetadataConfig {
        favicon_endpoint: format!("{}/faviconV2", server.uri()),
        icon_size: 64,
        request_timeout_secs: 5,
        user_agent: "TestAgent/1.0".to_string(),
    })
    .unwrap();

    let pipeline = EnrichmentPipeline::new(Arc::clone(&store), resolver, metadata, 64);

    Harness {
        server,
        store,
        pipeline,
        _dir: dir,
    }
}

/// Drains the snapshot stream to completion
async fn collect_all(pipeline: &EnrichmentPipeline<SqliteStore>) -> Vec<Snapshot> {
    let mut stream = pipeline.enrich_all().await.unwrap();
    let mut snapshots = Vec::new();
    while let Some(snapshot) = stream.recv().await {
        snapshots.push(snapshot);
    }
    snapshots
}

fn stored_server_ids(store: &Arc<Mutex<SqliteStore>>) -> Vec<String> {
    store
        .lock()
        .unwrap()
        .load_all()
        .unwrap()
        .into_iter()
        .map(|r| r.server_id)
        .collect()
}

#[tokio::test]
async fn test_partial_then_final_with_decoded_favicon() {
    // Resolve succeeds, og:title present, favicon is a valid PNG
    let harness = setup(&["A1B2C3"]).await;
    let page_url = format!("{}/page", harness.server.uri());

    Mock::given(method("GET"))
        .and(path("/api/alias/A1B2C3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!(r#"{{"url":"{}"}}"#, page_url)),
        )
        .mount(&harness.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><head>
                    <meta property="og:title" content="Example OG Title" />
                    <title>Ignored</title>
                    </head><body></body></html>"#,
                )
                .insert_header("content-type", "text/html"),
        )
        .mount(&harness.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/faviconV2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(one_pixel_png())
                .insert_header("content-type", "image/png"),
        )
        .mount(&harness.server)
        .await;

    let snapshots = collect_all(&harness.pipeline).await;
    assert_eq!(snapshots.len(), 2);

    let partial = &snapshots[0];
    assert!(!partial.is_final());
    assert_eq!(partial.link().url, page_url);
    assert!(partial.link().title.is_none());
    assert!(partial.link().icon.is_none());

    let final_snapshot = &snapshots[1];
    assert!(final_snapshot.is_final());
    assert_eq!(
        final_snapshot.link().title.as_deref(),
        Some("Example OG Title")
    );
    assert!(final_snapshot.link().icon.as_ref().unwrap().is_image());
}

#[tokio::test]
async fn test_favicon_failure_yields_placeholder() {
    // Favicon endpoint answers 404 text/plain
    let harness = setup(&["A1B2C3"]).await;
    let page_url = format!("{}/page", harness.server.uri());

    Mock::given(method("GET"))
        .and(path("/api/alias/A1B2C3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!(r#"{{"url":"{}"}}"#, page_url)),
        )
        .mount(&harness.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Some Page</title></head></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&harness.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/faviconV2"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("not found")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&harness.server)
        .await;

    let snapshots = collect_all(&harness.pipeline).await;
    assert_eq!(snapshots.len(), 2);

    let final_snapshot = &snapshots[1];
    assert!(final_snapshot.is_final());
    match final_snapshot.link().icon.as_ref().unwrap() {
        LinkIcon::Placeholder(name) => assert_eq!(*name, "globe"),
        LinkIcon::Image(_) => panic!("favicon failure must yield a placeholder"),
    }
}

#[tokio::test]
async fn test_non_image_favicon_yields_placeholder() {
    // 200 with a non-image Content-Type must be rejected
    let harness = setup(&["A1B2C3"]).await;
    let page_url = format!("{}/page", harness.server.uri());

    Mock::given(method("GET"))
        .and(path("/api/alias/A1B2C3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!(r#"{{"url":"{}"}}"#, page_url)),
        )
        .mount(&harness.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Some Page</title></head></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&harness.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/faviconV2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>interstitial</html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&harness.server)
        .await;

    let snapshots = collect_all(&harness.pipeline).await;
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots[1].link().icon.as_ref().unwrap().is_placeholder());
}

#[tokio::test]
async fn test_undecodable_favicon_yields_placeholder() {
    // image/png Content-Type but bytes that do not decode
    let harness = setup(&["A1B2C3"]).await;
    let page_url = format!("{}/page", harness.server.uri());

    Mock::given(method("GET"))
        .and(path("/api/alias/A1B2C3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!(r#"{{"url":"{}"}}"#, page_url)),
        )
        .mount(&harness.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Some Page</title></head></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&harness.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/faviconV2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xDE, 0xAD, 0xBE, 0xEF])
                .insert_header("content-type", "image/png"),
        )
        .mount(&harness.server)
        .await;

    let snapshots = collect_all(&harness.pipeline).await;
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots[1].link().icon.as_ref().unwrap().is_placeholder());
}

#[tokio::test]
async fn test_title_falls_back_to_url() {
    let harness = setup(&["A1B2C3"]).await;
    let page_url = format!("{}/page", harness.server.uri());

    Mock::given(method("GET"))
        .and(path("/api/alias/A1B2C3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!(r#"{{"url":"{}"}}"#, page_url)),
        )
        .mount(&harness.server)
        .await;

    // The target page itself is down
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/faviconV2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(one_pixel_png())
                .insert_header("content-type", "image/png"),
        )
        .mount(&harness.server)
        .await;

    let snapshots = collect_all(&harness.pipeline).await;
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[1].link().title.as_deref(), Some(page_url.as_str()));
}

#[tokio::test]
async fn test_remote_server_error_skips_record() {
    // A non-404 resolver failure emits nothing and keeps the record
    let harness = setup(&["FAIL001"]).await;

    Mock::given(method("GET"))
        .and(path("/api/alias/FAIL001"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&harness.server)
        .await;

    let snapshots = collect_all(&harness.pipeline).await;
    assert!(snapshots.is_empty());

    assert_eq!(stored_server_ids(&harness.store), vec!["FAIL001"]);
}

#[tokio::test]
async fn test_remote_not_found_deletes_record() {
    // A remote 404 emits nothing and removes the stale record
    let harness = setup(&["DEAD404"]).await;

    Mock::given(method("GET"))
        .and(path("/api/alias/DEAD404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&harness.server)
        .await;

    let snapshots = collect_all(&harness.pipeline).await;
    assert!(snapshots.is_empty());

    assert!(stored_server_ids(&harness.store).is_empty());
}

#[tokio::test]
async fn test_unparseable_target_emits_partial_only() {
    let harness = setup(&["A1B2C3"]).await;

    Mock::given(method("GET"))
        .and(path("/api/alias/A1B2C3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"url":"not a url"}"#))
        .mount(&harness.server)
        .await;

    let snapshots = collect_all(&harness.pipeline).await;
    assert_eq!(snapshots.len(), 1);
    assert!(!snapshots[0].is_final());
    assert_eq!(snapshots[0].link().url, "not a url");
}

#[tokio::test]
async fn test_mixed_batch_masks_per_record_failures() {
    // One live alias, one dead alias, one failing alias: the stream still
    // completes and only the live alias emits
    let harness = setup(&["LIVE001", "DEAD404", "FAIL001"]).await;
    let page_url = format!("{}/page", harness.server.uri());

    Mock::given(method("GET"))
        .and(path("/api/alias/LIVE001"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!(r#"{{"url":"{}"}}"#, page_url)),
        )
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/alias/DEAD404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/alias/FAIL001"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&harness.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Live</title></head></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/faviconV2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&harness.server)
        .await;

    let snapshots = collect_all(&harness.pipeline).await;
    assert_eq!(snapshots.len(), 2);
    for snapshot in &snapshots {
        assert_eq!(snapshot.link().record.server_id, "LIVE001");
    }

    let mut remaining = stored_server_ids(&harness.store);
    remaining.sort();
    assert_eq!(remaining, vec!["FAIL001", "LIVE001"]);
}

#[tokio::test]
async fn test_dropped_receiver_stops_remaining_work() {
    // Once the consumer drops the stream, records still in flight must
    // stop producing: their sends fail, their target pages are never
    // fetched, and the store is left untouched
    let harness = setup(&["FAST01", "SLOW01", "SLOW02"]).await;
    let fast_page = format!("{}/fast", harness.server.uri());

    Mock::given(method("GET"))
        .and(path("/api/alias/FAST01"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!(r#"{{"url":"{}"}}"#, fast_page)),
        )
        .mount(&harness.server)
        .await;

    // The slow aliases resolve only after the receiver is gone
    for (alias, page) in [("SLOW01", "/slow1"), ("SLOW02", "/slow2")] {
        Mock::given(method("GET"))
            .and(path(format!("/api/alias/{}", alias)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{"url":"{}{}"}}"#, harness.server.uri(), page))
                    .set_delay(Duration::from_millis(250)),
            )
            .mount(&harness.server)
            .await;
    }

    for page in ["/slow1", "/slow2"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(0)
            .mount(&harness.server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Fast</title></head></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&harness.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/faviconV2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(one_pixel_png())
                .insert_header("content-type", "image/png"),
        )
        .mount(&harness.server)
        .await;

    let mut stream = harness.pipeline.enrich_all().await.unwrap();
    let first = stream.recv().await.unwrap();
    assert!(!first.is_final());
    assert_eq!(first.link().record.server_id, "FAST01");
    drop(stream);

    // Let the delayed resolutions land and the tasks wind down
    tokio::time::sleep(Duration::from_millis(600)).await;

    // Nothing was deleted; the run just stopped producing. The zero-request
    // expectations on /slow1 and /slow2 are verified when the mock server
    // shuts down.
    let mut remaining = stored_server_ids(&harness.store);
    remaining.sort();
    assert_eq!(remaining, vec!["FAST01", "SLOW01", "SLOW02"]);
}

/// A store whose bulk load always fails
struct FailingStore;

impl LinkStore for FailingStore {
    fn save(&mut self, _record: &LinkRecord) -> StoreResult<()> {
        Err(StoreError::PersistenceFailed(rusqlite::Error::InvalidQuery))
    }

    fn load_all(&self) -> StoreResult<Vec<LinkRecord>> {
        Err(StoreError::PersistenceFailed(rusqlite::Error::InvalidQuery))
    }

    fn delete(&mut self, _server_id: &str) -> StoreResult<()> {
        Err(StoreError::PersistenceFailed(rusqlite::Error::InvalidQuery))
    }

    fn fetch_by_server_id(&self, _server_id: &str) -> StoreResult<Option<LinkRecord>> {
        Err(StoreError::PersistenceFailed(rusqlite::Error::InvalidQuery))
    }
}

#[tokio::test]
async fn test_store_load_failure_fails_the_stream() {
    let server = MockServer::start().await;
    let resolver = AliasResolver::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let metadata = MetadataFetcher::new(&MetadataConfig {
        favicon_endpoint: format!("{}/faviconV2", server.uri()),
        icon_size: 64,
        request_timeout_secs: 5,
        user_agent: "TestAgent/1.0".to_string(),
    })
    .unwrap();

    let pipeline = EnrichmentPipeline::new(
        Arc::new(Mutex::new(FailingStore)),
        resolver,
        metadata,
        64,
    );

    let result = pipeline.enrich_all().await;
    assert!(matches!(result, Err(PipelineError::Store(_))));
}
