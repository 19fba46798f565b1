use super::*;

fn run_path() -> String {
    format!("{}/{}", DOWNLOAD, RUN)
}

#[tokio::test]
async fn crawls_root_and_children_in_listing_order() {
    let server = MockServer::start().await;
    mount_result_tree(
        &server,
        &[(FILE_1, Vec::new()), (FILE_2, Vec::new())],
    )
    .await;
    let dir = TempDir::new().unwrap();
    let client = create_test_client(dir.path());

    let files = client.discover(&output_url(&server)).await.unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].url, file_url(&server, FILE_1));
    assert_eq!(files[1].url, file_url(&server, FILE_2));
    assert!(files.iter().all(|f| f.uuid == UUID && f.stream == STREAM));
}

#[tokio::test]
async fn root_without_directories_is_no_child_directories() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/catalog.html", run_path())))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>empty</body></html>"))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let client = create_test_client(dir.path());

    let err = client.discover(&output_url(&server)).await.unwrap_err();
    assert_eq!(err.code(), "no_child_directories");
}

#[tokio::test]
async fn missing_root_is_no_child_directories() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let client = create_test_client(dir.path());

    let err = client.discover(&output_url(&server)).await.unwrap_err();
    assert_eq!(err.code(), "no_child_directories");
}

#[tokio::test]
async fn directories_without_files_are_no_files_found() {
    let server = MockServer::start().await;
    mount_result_tree(&server, &[]).await;
    let dir = TempDir::new().unwrap();
    let client = create_test_client(dir.path());

    let err = client.discover(&output_url(&server)).await.unwrap_err();
    assert_eq!(err.code(), "no_files_found");
}

#[tokio::test]
async fn unreachable_child_does_not_abort_siblings() {
    let server = MockServer::start().await;
    let second = "2020030113-b1b2c3d4-1111-2222-3333-444455556666";
    let root = format!(
        r#"<a href="{}/contents.html">a</a><a href="{}/contents.html">b</a>"#,
        UUID, second
    );
    Mock::given(method("GET"))
        .and(path(format!("{}/catalog.html", run_path())))
        .respond_with(ResponseTemplate::new(200).set_body_string(root))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/{}/contents.html", run_path(), UUID)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/{}/contents.html", run_path(), second)))
        .respond_with(ResponseTemplate::new(200).set_body_string(child_listing(&[FILE_1])))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let client = create_test_client(dir.path());

    let files = client.discover(&output_url(&server)).await.unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].uuid, second);
}

#[tokio::test]
async fn files_off_the_naming_convention_are_skipped() {
    let server = MockServer::start().await;
    mount_result_tree(
        &server,
        &[("README.nc", Vec::new()), (FILE_1, Vec::new())],
    )
    .await;
    let dir = TempDir::new().unwrap();
    let client = create_test_client(dir.path());

    let files = client.discover(&output_url(&server)).await.unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name(), FILE_1);
}

#[tokio::test]
async fn custom_listing_parser_is_used() {
    use crate::listing::{AnchorKind, ListingParser};
    use std::sync::Arc;

    struct NoDirectories;
    impl ListingParser for NoDirectories {
        fn anchors(&self, _html: &str, _kind: AnchorKind) -> Vec<String> {
            Vec::new()
        }
        fn name(&self) -> &'static str {
            "none"
        }
    }

    let server = MockServer::start().await;
    mount_result_tree(&server, &[(FILE_1, Vec::new())]).await;
    let dir = TempDir::new().unwrap();
    let client = create_test_client(dir.path()).with_listing_parser(Arc::new(NoDirectories));

    let err = client.discover(&output_url(&server)).await.unwrap_err();
    assert_eq!(err.code(), "no_child_directories");
}

#[tokio::test]
async fn catalog_front_end_still_crawls_the_download_mount() {
    let server = MockServer::start().await;
    mount_result_tree(&server, &[(FILE_1, Vec::new())]).await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.http.front_end = FrontEnd::Catalog;
    let client = UframeClient::new(config).unwrap();

    let files = client.discover(&output_url(&server)).await.unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].url, file_url(&server, FILE_1));
}
