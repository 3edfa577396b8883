//! End-to-end runs against an in-memory upstream

mod common;

use common::*;
use pretty_assertions::assert_eq;
use relcat_core::{Aggregator, Catalog, CatalogError, CatalogStore, FetchMode, VersionRecord};
use tempfile::TempDir;

fn three_releases() -> Vec<relcat_core::upstream::RawRelease> {
    vec![
        published("v1.1", "2025-02-01T09:00:00Z", vec![asset("Widgets-mac.dmg")]),
        published("v1.0", "2025-01-01T09:00:00Z", vec![asset("Widgets-win.exe")]),
        published("v0.9", "2024-12-01T09:00:00Z", vec![]),
    ]
}

fn versions(records: &[VersionRecord]) -> Vec<&str> {
    records.iter().map(|r| r.version.as_str()).collect()
}

#[tokio::test]
async fn test_pagination_sums_all_pages() {
    init_test_logging();
    let temp_dir = TempDir::new().unwrap();
    let upstream = FakeUpstream::new().with_releases(three_releases(), 2);
    let aggregator = Aggregator::new(test_config(temp_dir.path()), &upstream);

    let summary = aggregator.run(FetchMode::Full).await.unwrap();

    assert_eq!(summary.release_count, 3);
    assert_eq!(summary.latest_version, "v1.1");
    assert!(!summary.latest_draft);
    assert_eq!(upstream.request_count(&first_page_url()), 1);
    assert_eq!(upstream.request_count(&page_url(2)), 1);

    let catalog = CatalogStore::new(&summary.output_path).load().unwrap().unwrap();
    assert_eq!(versions(&catalog.previous), vec!["v1.0", "v0.9"]);
}

#[tokio::test]
async fn test_draft_takes_priority_over_published() {
    let temp_dir = TempDir::new().unwrap();
    let mut releases = three_releases();
    releases.push(draft("v2.0", "2025-03-01T12:00:00Z"));
    let upstream = FakeUpstream::new().with_releases(releases, 2);
    let aggregator = Aggregator::new(test_config(temp_dir.path()), &upstream);

    let (catalog, summary) = aggregator.plan(FetchMode::Full).await.unwrap();

    let latest = catalog.latest.as_ref().unwrap();
    assert_eq!(latest.version, "v2.0");
    assert!(latest.draft);
    assert_eq!(latest.date, "2025-03-01");
    assert_eq!(latest.notes_url, "https://github.com/acme/widgets/releases");
    assert_eq!(versions(&catalog.previous), vec!["v1.1", "v1.0", "v0.9"]);
    assert!(summary.latest_draft);
    assert!(summary.to_string().ends_with("latest=v2.0 (draft=true)"));
}

#[tokio::test]
async fn test_newest_draft_wins_among_drafts() {
    let temp_dir = TempDir::new().unwrap();
    let releases = vec![
        draft("v2.0-rc1", "2025-03-01T12:00:00Z"),
        published("v1.1", "2025-06-01T09:00:00Z", vec![]),
        draft("v2.0-rc2", "2025-03-05T12:00:00Z"),
    ];
    let upstream = FakeUpstream::new().with_releases(releases, 10);
    let aggregator = Aggregator::new(test_config(temp_dir.path()), &upstream);

    let (catalog, _) = aggregator.plan(FetchMode::Full).await.unwrap();

    assert_eq!(catalog.latest.unwrap().version, "v2.0-rc2");
    assert_eq!(versions(&catalog.previous), vec!["v1.1", "v2.0-rc1"]);
}

#[tokio::test]
async fn test_duplicate_tags_collapse_last_wins() {
    let temp_dir = TempDir::new().unwrap();
    let releases = vec![
        published("v1.0", "2025-01-01T09:00:00Z", vec![asset("old.exe")]),
        published("v0.9", "2024-12-01T09:00:00Z", vec![]),
        published("v1.0", "2025-01-01T09:00:00Z", vec![asset("new.exe")]),
        published("", "2025-05-01T09:00:00Z", vec![]),
    ];
    let upstream = FakeUpstream::new().with_releases(releases, 2);
    let aggregator = Aggregator::new(test_config(temp_dir.path()), &upstream);

    let (catalog, summary) = aggregator.plan(FetchMode::Full).await.unwrap();

    assert_eq!(summary.release_count, 2);
    let latest = catalog.latest.as_ref().unwrap();
    assert_eq!(latest.version, "v1.0");
    assert_eq!(latest.downloads.win[0].url, "https://dl.test/new.exe");
    assert!(catalog.check().is_empty());
}

#[tokio::test]
async fn test_two_full_runs_are_byte_identical() {
    let temp_dir = TempDir::new().unwrap();
    let upstream = FakeUpstream::new().with_releases(three_releases(), 2);
    let aggregator = Aggregator::new(test_config(temp_dir.path()), &upstream);

    let first = aggregator.run(FetchMode::Full).await.unwrap();
    let first_bytes = std::fs::read(&first.output_path).unwrap();
    assert!(!first.unchanged);

    let second = aggregator.run(FetchMode::Full).await.unwrap();
    let second_bytes = std::fs::read(&second.output_path).unwrap();

    assert_eq!(first_bytes, second_bytes);
    assert!(second.unchanged);
}

#[tokio::test]
async fn test_latest_only_demotes_previous_latest() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    // Seed v1.0 as latest with v0.9 in history
    let seed = FakeUpstream::new().with_releases(
        vec![
            published("v1.0", "2025-01-01T09:00:00Z", vec![]),
            published("v0.9", "2024-12-01T09:00:00Z", vec![]),
        ],
        10,
    );
    Aggregator::new(config.clone(), &seed)
        .run(FetchMode::Full)
        .await
        .unwrap();

    let upstream = FakeUpstream::new().with_latest(published(
        "v1.1",
        "2025-02-01T09:00:00Z",
        vec![asset("Widgets-mac.dmg")],
    ));
    let summary = Aggregator::new(config.clone(), &upstream)
        .run(FetchMode::LatestOnly)
        .await
        .unwrap();

    assert_eq!(summary.latest_version, "v1.1");
    assert_eq!(summary.release_count, 3);
    assert_eq!(upstream.requests(), vec![latest_url()]);

    let catalog = CatalogStore::new(&config.output_path).load().unwrap().unwrap();
    assert_eq!(catalog.latest.as_ref().unwrap().version, "v1.1");
    assert_eq!(versions(&catalog.previous), vec!["v1.0", "v0.9"]);
}

#[tokio::test]
async fn test_latest_only_same_version_replaces_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());
    let upstream = FakeUpstream::new()
        .with_releases(three_releases(), 10)
        .with_latest(published(
            "v1.1",
            "2025-02-01T09:00:00Z",
            vec![asset("Widgets-mac.dmg"), asset("Widgets-linux.AppImage")],
        ));
    let aggregator = Aggregator::new(config, &upstream);

    aggregator.run(FetchMode::Full).await.unwrap();
    let (catalog, summary) = aggregator.plan(FetchMode::LatestOnly).await.unwrap();

    assert_eq!(summary.release_count, 3);
    assert!(!summary.unchanged);
    assert_eq!(catalog.latest.as_ref().unwrap().downloads.linux.len(), 1);
    assert_eq!(versions(&catalog.previous), vec!["v1.0", "v0.9"]);
}

#[tokio::test]
async fn test_latest_only_without_catalog_starts_fresh() {
    let temp_dir = TempDir::new().unwrap();
    let upstream =
        FakeUpstream::new().with_latest(published("v1.1", "2025-02-01T09:00:00Z", vec![]));
    let aggregator = Aggregator::new(test_config(temp_dir.path()), &upstream);

    let summary = aggregator.run(FetchMode::LatestOnly).await.unwrap();

    assert_eq!(summary.release_count, 1);
    let catalog = aggregator.store().load().unwrap().unwrap();
    assert!(catalog.previous.is_empty());
}

#[tokio::test]
async fn test_latest_only_rejects_unreadable_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());
    std::fs::create_dir_all(config.output_path.parent().unwrap()).unwrap();
    std::fs::write(&config.output_path, "previous: {broken\n").unwrap();

    let upstream =
        FakeUpstream::new().with_latest(published("v1.1", "2025-02-01T09:00:00Z", vec![]));
    let err = Aggregator::new(config.clone(), &upstream)
        .run(FetchMode::LatestOnly)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::CatalogRead { .. }));
    assert!(upstream.requests().is_empty());
    assert_eq!(
        std::fs::read_to_string(&config.output_path).unwrap(),
        "previous: {broken\n"
    );
}

#[tokio::test]
async fn test_full_run_replaces_unreadable_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());
    std::fs::create_dir_all(config.output_path.parent().unwrap()).unwrap();
    std::fs::write(&config.output_path, "previous: {broken\n").unwrap();

    let upstream = FakeUpstream::new().with_releases(three_releases(), 2);
    let summary = Aggregator::new(config.clone(), &upstream)
        .run(FetchMode::Full)
        .await
        .unwrap();

    assert!(!summary.unchanged);
    let catalog = CatalogStore::new(&config.output_path).load().unwrap().unwrap();
    assert_eq!(catalog.release_count(), 3);
}

#[tokio::test]
async fn test_no_release_leaves_file_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());
    let store = CatalogStore::new(&config.output_path);
    let seeded = Catalog {
        latest: Some(VersionRecord {
            version: "v0.1".to_string(),
            date: "2024-01-01".to_string(),
            ..Default::default()
        }),
        previous: Vec::new(),
    };
    store.save(&seeded).unwrap();
    let before = std::fs::read(&config.output_path).unwrap();

    let upstream = FakeUpstream::new().with_releases(Vec::new(), 2);
    let err = Aggregator::new(config.clone(), &upstream)
        .run(FetchMode::Full)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NoPublishedRelease));

    let upstream = FakeUpstream::new();
    let err = Aggregator::new(config.clone(), &upstream)
        .run(FetchMode::LatestOnly)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NoPublishedRelease));

    assert_eq!(std::fs::read(&config.output_path).unwrap(), before);
}

#[tokio::test]
async fn test_page_failure_aborts_without_writing() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());
    let upstream = FakeUpstream::new()
        .with_releases(three_releases(), 2)
        .failing_on(page_url(2));

    let err = Aggregator::new(config.clone(), &upstream)
        .run(FetchMode::Full)
        .await
        .unwrap_err();

    match err {
        CatalogError::Transport { url, .. } => assert_eq!(url, page_url(2)),
        other => panic!("expected transport error, got {other:?}"),
    }
    assert!(!config.output_path.exists());
}

#[tokio::test]
async fn test_invalid_config_fails_before_any_request() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(temp_dir.path());
    config.upstream_source = "not-a-repo".to_string();
    let upstream = FakeUpstream::new().with_releases(three_releases(), 2);

    let err = Aggregator::new(config, &upstream)
        .run(FetchMode::Full)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Config { .. }));
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn test_plan_does_not_write() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());
    let upstream = FakeUpstream::new().with_releases(three_releases(), 2);

    let (catalog, summary) = Aggregator::new(config.clone(), &upstream)
        .plan(FetchMode::Full)
        .await
        .unwrap();

    assert_eq!(catalog.release_count(), summary.release_count);
    assert!(!config.output_path.exists());
}

#[tokio::test]
async fn test_draft_sharing_tag_with_published_stays_latest() {
    let temp_dir = TempDir::new().unwrap();
    let releases = vec![
        draft("v2.0", "2025-03-01T12:00:00Z"),
        published("v2.0", "2025-02-01T09:00:00Z", vec![asset("Widgets-mac.dmg")]),
        published("v1.0", "2025-01-01T09:00:00Z", vec![]),
    ];
    let upstream = FakeUpstream::new().with_releases(releases, 2);
    let aggregator = Aggregator::new(test_config(temp_dir.path()), &upstream);

    let (catalog, summary) = aggregator.plan(FetchMode::Full).await.unwrap();

    let latest = catalog.latest.as_ref().unwrap();
    assert_eq!(latest.version, "v2.0");
    assert!(latest.draft);
    assert!(summary.latest_draft);
    assert_eq!(versions(&catalog.previous), vec!["v1.0"]);
    assert!(catalog.check().is_empty());
}

#[tokio::test]
async fn test_latest_only_merges_into_catalog_with_latest_repeated() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());
    std::fs::create_dir_all(config.output_path.parent().unwrap()).unwrap();
    // Older tooling wrote the latest release into previous as well
    std::fs::write(
        &config.output_path,
        concat!(
            "latest:\n",
            "  version: v1.0\n",
            "  date: '2025-01-01'\n",
            "previous:\n",
            "- version: v1.0\n",
            "  date: '2025-01-01'\n",
            "- version: v0.9\n",
            "  date: '2024-12-01'\n",
        ),
    )
    .unwrap();

    let upstream =
        FakeUpstream::new().with_latest(published("v1.1", "2025-02-01T09:00:00Z", vec![]));
    let summary = Aggregator::new(config.clone(), &upstream)
        .run(FetchMode::LatestOnly)
        .await
        .unwrap();

    assert_eq!(summary.latest_version, "v1.1");
    assert_eq!(summary.release_count, 3);

    let catalog = CatalogStore::new(&config.output_path)
        .load_checked()
        .unwrap()
        .unwrap();
    assert_eq!(catalog.latest.as_ref().unwrap().version, "v1.1");
    assert_eq!(versions(&catalog.previous), vec!["v1.0", "v0.9"]);
}
