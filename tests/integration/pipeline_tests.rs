//! Integration tests for the image pipeline
//!
//! These tests use wiremock to serve images and verify how many requests the
//! pipeline actually makes under different cache conditions.

use montage_creator::cache::{CacheEntry, CacheStore};
use montage_creator::config::{Config, FetchConfig};
use montage_creator::pipeline::{
    collect_images, image_path, HttpFetcher, Pipeline, PipelineOptions,
};
use montage_creator::state::ImageOrigin;
use montage_creator::MontageError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a config rooted in `dir` with a short timeout
fn create_test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.paths.input = dir.join("gallery.md");
    config.paths.images_dir = dir.join("images");
    config.cache.path = dir.join("image_cache.json");
    config.output.montage_path = dir.join("montage.jpg");
    config.fetch.timeout_secs = 5;
    config
}

fn test_fetcher() -> HttpFetcher {
    HttpFetcher::new(&FetchConfig {
        timeout_secs: 5,
        ..FetchConfig::default()
    })
    .expect("Failed to build fetcher")
}

/// Mounts an image at `image_path` expecting exactly `times` requests
async fn mount_image(server: &MockServer, image_path: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cache_hit_skips_fetcher() {
    let server = MockServer::start().await;
    mount_image(&server, "/cat.png", "fresh", 0).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let url = format!("{}/cat.png", server.uri());

    // A previous run left both the file and its cache entry behind
    let cached_file = dir.path().join("previous.png");
    std::fs::write(&cached_file, "cached").unwrap();
    let cache = CacheStore::new();
    cache.set(&url, CacheEntry::downloaded(url.clone(), cached_file.clone()));
    cache.save(&config.cache.path).await.unwrap();

    let pipeline = Pipeline::from_config(&config).await.expect("Failed to build pipeline");
    let result = pipeline.run(vec![url]).await.expect("Run failed");

    assert_eq!(result.cache_hits, 1);
    assert_eq!(result.downloads, 0);
    assert_eq!(result.paths(), vec![cached_file]);
    assert_eq!(result.images[0].origin, ImageOrigin::Cached);
}

#[tokio::test]
async fn test_duplicate_urls_fetched_independently() {
    let server = MockServer::start().await;
    mount_image(&server, "/a.png", "aaa", 2).await;
    mount_image(&server, "/b.jpg", "bbb", 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let a = format!("{}/a.png", server.uri());
    let b = format!("{}/b.jpg", server.uri());

    let pipeline = Pipeline::from_config(&config).await.expect("Failed to build pipeline");
    let result = pipeline
        .run(vec![a.clone(), b.clone(), a.clone()])
        .await
        .expect("Run failed");

    assert_eq!(result.images.len(), 3);
    assert_eq!(result.downloads, 3);
    assert_eq!(result.failures, 0);
    assert_eq!(pipeline.cache().len(), 2);

    let entry = pipeline.cache().get(&a).unwrap();
    assert_eq!(entry.local_path, image_path(&config.paths.images_dir, &a));
    assert_eq!(entry.status_code, 200);
    assert_eq!(std::fs::read_to_string(&entry.local_path).unwrap(), "aaa");

    // Persisted at the end of the run
    let reloaded = CacheStore::new();
    assert_eq!(reloaded.load(&config.cache.path).await.unwrap(), 2);
    assert_eq!(reloaded.snapshot(), pipeline.cache().snapshot());
}

#[tokio::test]
async fn test_stale_entry_is_refetched() {
    let server = MockServer::start().await;
    mount_image(&server, "/x.gif", "new bytes", 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let url = format!("{}/x.gif", server.uri());

    // The entry points at a file that has since been deleted
    let deleted = dir.path().join("images").join("deleted.gif");
    let mut stale = CacheEntry::downloaded(url.clone(), deleted.clone());
    stale.fetched_at = stale.fetched_at - chrono::Duration::days(3);
    let cache = CacheStore::new();
    cache.set(&url, stale.clone());
    cache.save(&config.cache.path).await.unwrap();

    let pipeline = Pipeline::from_config(&config).await.expect("Failed to build pipeline");
    let result = pipeline.run(vec![url.clone()]).await.expect("Run failed");

    assert_eq!(result.downloads, 1);
    assert_eq!(result.cache_hits, 0);

    let refreshed = pipeline.cache().get(&url).unwrap();
    assert_ne!(refreshed.local_path, deleted);
    assert!(refreshed.fetched_at > stale.fetched_at);
    assert_eq!(
        std::fs::read_to_string(&refreshed.local_path).unwrap(),
        "new bytes"
    );
}

#[tokio::test]
async fn test_no_cache_mode_refetches_and_never_writes() {
    let server = MockServer::start().await;
    mount_image(&server, "/one.png", "1", 1).await;
    mount_image(&server, "/two.png", "2", 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    let one = format!("{}/one.png", server.uri());
    let two = format!("{}/two.png", server.uri());

    // Prior entries with files present would normally be hits
    let cache = CacheStore::new();
    for (url, name) in [(&one, "one.png"), (&two, "two.png")] {
        let file = dir.path().join(name);
        std::fs::write(&file, "old").unwrap();
        cache.set(url, CacheEntry::downloaded(url.clone(), file));
    }
    cache.save(&config.cache.path).await.unwrap();
    let before = std::fs::read_to_string(&config.cache.path).unwrap();

    config.cache.enabled = false;
    let pipeline = Pipeline::from_config(&config).await.expect("Failed to build pipeline");
    let result = pipeline
        .run(vec![one.clone(), two.clone()])
        .await
        .expect("Run failed");

    assert_eq!(result.downloads, 2);
    assert_eq!(result.cache_hits, 0);
    assert!(pipeline.cache().is_empty());

    let after = std::fs::read_to_string(&config.cache.path).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_second_run_uses_persisted_cache() {
    let server = MockServer::start().await;
    mount_image(&server, "/p.png", "png", 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let url = format!("{}/p.png", server.uri());

    let first = Pipeline::from_config(&config).await.expect("Failed to build pipeline");
    let first_result = first.run(vec![url.clone()]).await.expect("First run failed");
    assert_eq!(first_result.downloads, 1);

    let second = Pipeline::from_config(&config).await.expect("Failed to build pipeline");
    let second_result = second.run(vec![url]).await.expect("Second run failed");
    assert_eq!(second_result.cache_hits, 1);
    assert_eq!(second_result.paths(), first_result.paths());
}

#[tokio::test]
async fn test_malformed_cache_file_is_replaced() {
    let server = MockServer::start().await;
    mount_image(&server, "/m.png", "m", 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    std::fs::write(&config.cache.path, "{ not json").unwrap();

    let url = format!("{}/m.png", server.uri());
    let pipeline = Pipeline::from_config(&config).await.expect("Failed to build pipeline");
    let result = pipeline.run(vec![url.clone()]).await.expect("Run failed");
    assert_eq!(result.downloads, 1);

    let reloaded = CacheStore::new();
    assert_eq!(reloaded.load(&config.cache.path).await.unwrap(), 1);
    assert!(reloaded.get(&url).is_some());
}

#[tokio::test]
async fn test_results_follow_completion_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("slow")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    mount_image(&server, "/fast.png", "fast", 2).await;

    let slow = format!("{}/slow.png", server.uri());
    let fast = format!("{}/fast.png", server.uri());

    let dir = TempDir::new().unwrap();
    let options = PipelineOptions {
        images_dir: dir.path().join("images"),
        cache_path: None,
        max_concurrent: None,
        preserve_order: false,
    };

    let unordered = Pipeline::new(test_fetcher(), Arc::new(CacheStore::new()), options.clone());
    let result = unordered
        .run(vec![slow.clone(), fast.clone()])
        .await
        .expect("Run failed");
    let sources: Vec<&str> = result.images.iter().map(|i| i.source_url.as_str()).collect();
    assert_eq!(sources, vec![fast.as_str(), slow.as_str()]);

    let ordered = Pipeline::new(
        test_fetcher(),
        Arc::new(CacheStore::new()),
        PipelineOptions {
            preserve_order: true,
            ..options
        },
    );
    let result = ordered
        .run(vec![slow.clone(), fast.clone()])
        .await
        .expect("Run failed");
    let sources: Vec<&str> = result.images.iter().map(|i| i.source_url.as_str()).collect();
    assert_eq!(sources, vec![slow.as_str(), fast.as_str()]);
}

#[tokio::test]
async fn test_collect_images_from_document() {
    let server = MockServer::start().await;
    mount_image(&server, "/a.png", "a", 1).await;
    Mock::given(method("GET"))
        .and(path("/broken.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    std::fs::write(
        &config.paths.input,
        format!(
            "# Mood board\n\n![a]({0}/a.png)\n\n![broken]({0}/broken.png)\n[link]({0}/page)\n",
            server.uri()
        ),
    )
    .unwrap();

    let result = collect_images(&config).await.expect("Pipeline failed");

    assert_eq!(result.images.len(), 1);
    assert_eq!(result.failures, 1);
    assert!(config.paths.images_dir.is_dir());
    assert!(config.cache.path.is_file());
}

#[tokio::test]
async fn test_collect_images_without_references() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    std::fs::write(&config.paths.input, "Just text, no pictures.\n").unwrap();

    let result = collect_images(&config).await;
    assert!(matches!(result, Err(MontageError::NoUrlsFound)));
}

#[tokio::test]
async fn test_collect_images_missing_input() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.paths.input = PathBuf::from("/nonexistent/gallery.md");

    let result = collect_images(&config).await;
    assert!(matches!(result, Err(MontageError::Io(_))));
}

#[tokio::test]
async fn test_every_fetch_failing_is_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let urls = vec![
        format!("{}/1.png", server.uri()),
        format!("{}/2.png", server.uri()),
    ];

    let pipeline = Pipeline::from_config(&config).await.expect("Failed to build pipeline");
    let result = pipeline.run(urls).await;

    assert!(matches!(
        result,
        Err(MontageError::NoContent { attempted: 2, failed: 2 })
    ));
    // The cache is still persisted before the run fails
    assert!(config.cache.path.is_file());
}

#[tokio::test]
async fn test_unwritable_cache_path_does_not_fail_run() {
    let server = MockServer::start().await;
    mount_image(&server, "/w.png", "w", 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    // A directory can be neither read nor written as the cache file
    config.cache.path = dir.path().join("cache_dir");
    std::fs::create_dir(&config.cache.path).unwrap();

    let url = format!("{}/w.png", server.uri());
    let pipeline = Pipeline::from_config(&config).await.expect("Failed to build pipeline");
    let result = pipeline.run(vec![url.clone()]).await.expect("Run failed");

    assert_eq!(result.downloads, 1);
    assert_eq!(result.paths(), vec![image_path(&config.paths.images_dir, &url)]);
    assert!(pipeline.cache().get(&url).is_some());
    assert!(config.cache.path.is_dir());
}
