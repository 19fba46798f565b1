//! Shared test helpers for creating UframeClient instances against a mock service.

use crate::client::UframeClient;
use crate::config::Config;
use crate::coverage::classic;
use serde_json::json;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Result directory token served by the mock service
pub(crate) const UUID: &str = "2020030112-a1b2c3d4-1111-2222-3333-444455556666";
/// Stream token of the files served by the mock service
pub(crate) const STREAM: &str = "CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample";
/// Name of the first data file
pub(crate) const FILE_1: &str =
    "deployment0001_CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample.nc";
/// Name of the second data file
pub(crate) const FILE_2: &str =
    "deployment0002_CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample.nc";
/// Result run directory
pub(crate) const RUN: &str = "20200301T120000-CE02SHSM-RID27-02-FLORTD000-recovered_host-flort_sample";
/// Catalog mount used by the mock service
pub(crate) const CATALOG: &str = "/thredds/catalog/ooi/_nouser";
/// Download mount used by the mock service
pub(crate) const DOWNLOAD: &str = "/opendap/hyrax/async_results/_nouser";
/// Instrument path of the test request
pub(crate) const SENSOR: &str = "/sensor/inv/CE02SHSM/RID27/02-FLORTD000";

/// Configuration whose mounts are path-only so they match mock server URLs
pub(crate) fn test_config(destination: &Path) -> Config {
    let mut config = Config::default();
    config.service.catalog_mount = CATALOG.trim_start_matches('/').to_string();
    config.service.download_mount = DOWNLOAD.trim_start_matches('/').to_string();
    config.download.destination = destination.to_path_buf();
    config.tools.search_path = false;
    config
}

/// Client for `test_config`
pub(crate) fn create_test_client(destination: &Path) -> UframeClient {
    UframeClient::new(test_config(destination)).unwrap()
}

/// Asynchronous request URL on the mock service
pub(crate) fn request_url(server: &MockServer, begin: &str, end: &str, limit: i64) -> String {
    format!(
        "{}{}/recovered_host/flort_sample?beginDT={}&endDT={}&format=application/netcdf&limit={}",
        server.uri(),
        SENSOR,
        begin,
        end,
        limit
    )
}

/// A request URL inside the stream bounds mounted by `mount_metadata`
pub(crate) fn valid_request_url(server: &MockServer) -> String {
    request_url(server, "2020-01-01T00:00:00.0Z", "2020-01-02T00:00:00.0Z", -1)
}

/// Result location as returned by the submission endpoint
pub(crate) fn output_url(server: &MockServer) -> String {
    format!("{}{}/{}/catalog.html", server.uri(), CATALOG, RUN)
}

/// Mount the stream metadata endpoint
pub(crate) async fn mount_metadata(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{}/metadata/times", SENSOR)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "stream": "flort_sample",
                "beginTime": "2019-06-01T00:00:00.000Z",
                "endTime": "2020-06-01T00:00:00.000Z"
            },
            {
                "stream": "flort_metadata",
                "beginTime": "2019-06-01T00:00:00.000Z",
                "endTime": "2019-07-01T00:00:00.000Z"
            }
        ])))
        .mount(server)
        .await;
}

/// Mount a successful submission endpoint
pub(crate) async fn mount_submission(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{}/recovered_host/flort_sample", SENSOR)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "requestUUID": "f7c3b0a2-1234-4c6d-9e8f-0a1b2c3d4e5f",
            "outputURL": output_url(server),
        })))
        .mount(server)
        .await;
}

/// HTML listing of the run root with one result directory
pub(crate) fn root_listing() -> String {
    format!(
        r#"<html><body><table>
<tr><td><a href="{uuid}/contents.html">{uuid}/</a></td></tr>
<tr><td><a href="status.txt">status.txt</a></td></tr>
</table></body></html>"#,
        uuid = UUID
    )
}

/// HTML listing of a result directory
pub(crate) fn child_listing(files: &[&str]) -> String {
    let rows: String = files
        .iter()
        .map(|f| format!("<tr><td><a href=\"{f}\">{f}</a></td><td><a href=\"{f}.html\">form</a></td></tr>\n"))
        .collect();
    format!("<html><body><table>\n{}</table></body></html>", rows)
}

/// NetCDF classic file with the given coverage attributes
pub(crate) fn netcdf_bytes(start: &str, end: &str) -> Vec<u8> {
    classic::encode_header(&[
        ("title", "mock"),
        ("time_coverage_start", start),
        ("time_coverage_end", end),
    ])
}

/// Mount the download front-end result tree: root listing, one result
/// directory listing `files`, and each file's body
pub(crate) async fn mount_result_tree(server: &MockServer, files: &[(&str, Vec<u8>)]) {
    let run = format!("{}/{}", DOWNLOAD, RUN);
    Mock::given(method("GET"))
        .and(path(format!("{}/catalog.html", run)))
        .respond_with(ResponseTemplate::new(200).set_body_string(root_listing()))
        .mount(server)
        .await;

    let names: Vec<&str> = files.iter().map(|(name, _)| *name).collect();
    Mock::given(method("GET"))
        .and(path(format!("{}/{}/contents.html", run, UUID)))
        .respond_with(ResponseTemplate::new(200).set_body_string(child_listing(&names)))
        .mount(server)
        .await;

    for (name, body) in files {
        Mock::given(method("GET"))
            .and(path(format!("{}/{}/{}", run, UUID, name)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(server)
            .await;
    }
}

/// URL of a served data file
pub(crate) fn file_url(server: &MockServer, name: &str) -> String {
    format!("{}{}/{}/{}/{}", server.uri(), DOWNLOAD, RUN, UUID, name)
}
