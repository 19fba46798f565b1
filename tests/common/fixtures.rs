//! Mock UFrame service and NetCDF content generators

use byteorder::{BigEndian, WriteBytesExt};
use serde_json::json;
use std::path::Path;
use uframe_async::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Instrument path of every request in these tests
pub const SENSOR: &str = "/sensor/inv/RS03AXPS/SF03A/02-CTDPFA302";
/// Telemetry and stream following the instrument
pub const METHOD_STREAM: &str = "streamed/ctdpf_sbe43_sample";
/// Catalog mount the submission endpoint points at
pub const CATALOG: &str = "/thredds/catalog/ooi/_nouser";
/// Download mount serving the same files
pub const DOWNLOAD: &str = "/opendap/hyrax/async_results/_nouser";
/// Result run directory
pub const RUN: &str = "20200415T093000-RS03AXPS-SF03A-02-CTDPFA302-streamed-ctdpf_sbe43_sample";
/// Result directory holding the data files
pub const UUID: &str = "2020041509-0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0";
/// Stream token of the served files
pub const STREAM: &str = "RS03AXPS-SF03A-02-CTDPFA302-streamed-ctdpf_sbe43_sample";
/// Tracking id returned by the submission endpoint
pub const REQUEST_UUID: &str = "9d8c7b6a-5f4e-4d3c-8b2a-1f0e9d8c7b6a";

const NC_DIMENSION: u32 = 0x0A;
const NC_ATTRIBUTE: u32 = 0x0C;
const NC_CHAR: u32 = 2;

/// Configuration pointed at path-only mounts so they match mock server URLs
pub fn mock_config(destination: &Path) -> Config {
    let mut config = Config::default();
    config.service.catalog_mount = CATALOG.trim_start_matches('/').to_string();
    config.service.download_mount = DOWNLOAD.trim_start_matches('/').to_string();
    config.download.destination = destination.to_path_buf();
    config.tools.search_path = false;
    config
}

/// Asynchronous request URL on the mock service
pub fn request_url(server: &MockServer, begin: &str, end: &str) -> String {
    format!(
        "{}{}/{}?beginDT={}&endDT={}&format=application/netcdf&limit=-1&execDPA=true&include_provenance=false",
        server.uri(),
        SENSOR,
        METHOD_STREAM,
        begin,
        end
    )
}

/// Catalog landing page returned as `outputURL`
pub fn output_url(server: &MockServer) -> String {
    format!("{}{}/{}/catalog.html", server.uri(), CATALOG, RUN)
}

/// Served name of the n-th deployment file
pub fn deployment_file(n: u32) -> String {
    format!("deployment{:04}_{}.nc", n, STREAM)
}

/// Mount stream metadata, the submission endpoint and the status resource
///
/// The status resource answers 404 `pending_polls` times before it starts
/// answering 200.
pub async fn mount_service(server: &MockServer, pending_polls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("{}/metadata/times", SENSOR)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "stream": "ctdpf_sbe43_sample",
                "beginTime": "2014-09-10T00:00:00.000Z",
                "endTime": "2020-04-01T00:00:00.000Z"
            }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/{}", SENSOR, METHOD_STREAM)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "requestUUID": REQUEST_UUID,
            "outputURL": output_url(server),
        })))
        .mount(server)
        .await;

    let status = format!("{}/{}/status.txt", DOWNLOAD, RUN);
    if pending_polls > 0 {
        Mock::given(method("GET"))
            .and(path(status.clone()))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(pending_polls)
            .with_priority(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(status))
        .respond_with(ResponseTemplate::new(200).set_body_string("complete"))
        .mount(server)
        .await;
}

/// Mount the result tree on the download front-end
pub async fn mount_results(server: &MockServer, files: &[(String, Vec<u8>)]) {
    let run = format!("{}/{}", DOWNLOAD, RUN);
    let root = format!(
        r#"<html><body><a href="{uuid}/contents.html">{uuid}/</a> <a href="status.txt">status.txt</a></body></html>"#,
        uuid = UUID
    );
    Mock::given(method("GET"))
        .and(path(format!("{}/catalog.html", run)))
        .respond_with(ResponseTemplate::new(200).set_body_string(root))
        .mount(server)
        .await;

    let rows: String = files
        .iter()
        .map(|(name, _)| format!("<tr><td><a href=\"{name}\">{name}</a></td></tr>\n"))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("{}/{}/contents.html", run, UUID)))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("<table>\n{}</table>", rows)),
        )
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

fn write_name(out: &mut Vec<u8>, bytes: &[u8]) {
    out.write_u32::<BigEndian>(bytes.len() as u32).unwrap();
    out.extend_from_slice(bytes);
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

/// Minimal NetCDF classic file carrying the given time coverage
pub fn netcdf_file(start: &str, end: &str) -> Vec<u8> {
    let mut out = b"CDF\x01".to_vec();
    out.write_u32::<BigEndian>(0).unwrap();

    out.write_u32::<BigEndian>(NC_DIMENSION).unwrap();
    out.write_u32::<BigEndian>(1).unwrap();
    write_name(&mut out, b"obs");
    out.write_u32::<BigEndian>(0).unwrap();

    out.write_u32::<BigEndian>(NC_ATTRIBUTE).unwrap();
    out.write_u32::<BigEndian>(2).unwrap();
    for (name, value) in [("time_coverage_start", start), ("time_coverage_end", end)] {
        write_name(&mut out, name.as_bytes());
        out.write_u32::<BigEndian>(NC_CHAR).unwrap();
        write_name(&mut out, value.as_bytes());
    }

    out.write_u32::<BigEndian>(0).unwrap();
    out.write_u32::<BigEndian>(0).unwrap();
    out
}
