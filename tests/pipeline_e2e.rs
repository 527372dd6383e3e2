//! End-to-end pipeline tests against a mock portal

#![allow(clippy::unwrap_used, clippy::expect_used)]

use cnpj_dl::{Config, Error, Event, FileOutcome, PipelineDriver};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROOT_LISTING: &str = r#"
<html><body>
<a href="2022-01/">2022-01/</a>
<a href="2023-11/">2023-11/</a>
<a href="../">parent</a>
</body></html>
"#;

const FOLDER_LISTING: &str = r#"
<html><body>
<a href="a.zip">a.zip</a>
<a href="b.txt">b.txt</a>
<a href="a.zip">a.zip (mirror)</a>
<a href="notes.pdf">notes.pdf</a>
</body></html>
"#;

async fn mock_portal() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ROOT_LISTING))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2023-11/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FOLDER_LISTING))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2023-11/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 1024]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2023-11/b.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("layout description"))
        .mount(&server)
        .await;
    server
}

fn config_for(server: &MockServer, dir: &tempfile::TempDir) -> Config {
    Config {
        base_url: format!("{}/", server.uri()),
        download_dir: dir.path().join("Downloads_CNPJ"),
        timeout_secs: 5,
        backoff_secs: 0,
        ..Config::default()
    }
}

#[tokio::test]
async fn resolves_latest_folder_and_downloads_the_deduplicated_file_set() {
    let server = mock_portal().await;
    let dir = tempfile::tempdir().unwrap();
    let driver = PipelineDriver::new(config_for(&server, &dir)).unwrap();
    let mut events = driver.subscribe();

    let summary = driver.run().await.unwrap();

    assert_eq!(summary.succeeded(), 2, "a.zip and b.txt, duplicate collapsed");
    assert_eq!(summary.failed(), 0);
    assert_eq!(summary.total_bytes_downloaded(), 1024 + 18);
    assert!(summary.is_complete());

    let dl = dir.path().join("Downloads_CNPJ");
    assert_eq!(tokio::fs::read(dl.join("a.zip")).await.unwrap().len(), 1024);
    assert_eq!(
        tokio::fs::read_to_string(dl.join("b.txt")).await.unwrap(),
        "layout description"
    );
    assert!(!dl.join("notes.pdf").exists(), "non-archive links ignored");

    // 2023-11 beats 2022-01; the resolved URL is base + token + "/"
    match events.try_recv().unwrap() {
        Event::FolderResolved { url } => {
            assert_eq!(url, format!("{}/2023-11/", server.uri()));
        }
        other => panic!("expected FolderResolved first, got {other:?}"),
    }
}

#[tokio::test]
async fn second_run_is_idempotent_and_downloads_zero_new_bytes() {
    let server = mock_portal().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, &dir);

    let first = PipelineDriver::new(config.clone()).unwrap().run().await.unwrap();
    assert_eq!(first.succeeded(), 2);

    let second = PipelineDriver::new(config).unwrap().run().await.unwrap();
    assert_eq!(second.skipped(), 2, "all files already on disk");
    assert_eq!(second.succeeded(), 0);
    assert_eq!(second.total_bytes_downloaded(), 0);
}

#[tokio::test]
async fn a_missing_file_fails_alone_without_aborting_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ROOT_LISTING))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2023-11/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FOLDER_LISTING))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2023-11/a.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2023-11/b.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let driver = PipelineDriver::new(config_for(&server, &dir)).unwrap();
    let summary = driver.run().await.unwrap();

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.succeeded(), 1);
    assert!(!summary.is_complete());
    assert!(matches!(
        summary.files[0].outcome,
        FileOutcome::Failed { attempts: 3, .. }
    ));
    let dl = dir.path().join("Downloads_CNPJ");
    assert!(!dl.join("a.zip").exists(), "failed file leaves nothing behind");
    assert!(dl.join("b.txt").exists());
}

#[tokio::test]
async fn unreachable_root_listing_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        base_url: "http://127.0.0.1:1/".into(),
        download_dir: dir.path().join("Downloads_CNPJ"),
        timeout_secs: 2,
        ..Config::default()
    };

    let err = PipelineDriver::new(config).unwrap().run().await.unwrap_err();
    assert!(matches!(err, Error::ListingFetch { .. }));
}

#[tokio::test]
async fn listing_without_folders_aborts_with_a_distinct_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>empty</html>"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let driver = PipelineDriver::new(config_for(&server, &dir)).unwrap();
    let err = driver.run().await.unwrap_err();

    assert!(matches!(err, Error::NoFoldersFound { .. }));
}
