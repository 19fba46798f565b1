//! Stream time-bound assessment
//!
//! Pure half of the time-bound validator: given the stream descriptors the
//! metadata endpoint returned, decide whether the requested interval lies
//! inside the stream's bounds. Fetching the descriptors is done by
//! [`UframeClient::validate`](crate::UframeClient::validate).

use crate::types::{
    RequestSpec, StreamDescriptor, ValidationIssue, ValidationResult, parse_timestamp,
};

/// Assess a syntactically valid request against the stream descriptors
///
/// The result is always `valid`; stream lookup and bounds problems are
/// reported through `issue` and `valid_time_interval` so the caller decides
/// whether they are fatal.
pub fn assess(
    spec: &RequestSpec,
    streams: &[StreamDescriptor],
    stream: &str,
    time_check: bool,
) -> ValidationResult {
    let result = ValidationResult::accepted();

    let Some(descriptor) = streams.iter().find(|d| d.stream == stream) else {
        return result.with_issue(
            ValidationIssue::UnknownStream,
            format!("stream {} not found for {}", stream, spec.instrument),
        );
    };

    let mut result = ValidationResult {
        stream_begin: Some(descriptor.begin_time.clone()),
        stream_end: Some(descriptor.end_time.clone()),
        ..result
    };

    if !time_check {
        return result;
    }

    let (Some(stream_begin), Some(stream_end)) = (
        parse_timestamp(&descriptor.begin_time),
        parse_timestamp(&descriptor.end_time),
    ) else {
        return result.with_issue(
            ValidationIssue::MalformedMetadata,
            format!(
                "unreadable bounds for stream {}: {} / {}",
                stream, descriptor.begin_time, descriptor.end_time
            ),
        );
    };

    if spec.begin < stream_begin {
        result.valid_time_interval = Some(false);
        return result.with_issue(
            ValidationIssue::TimeIntervalOutOfBounds,
            format!(
                "beginDT {} is earlier than stream begin {}",
                spec.begin_raw, descriptor.begin_time
            ),
        );
    }
    if spec.end > stream_end {
        result.valid_time_interval = Some(false);
        return result.with_issue(
            ValidationIssue::TimeIntervalOutOfBounds,
            format!(
                "endDT {} is later than stream end {}",
                spec.end_raw, descriptor.end_time
            ),
        );
    }

    result.valid_time_interval = Some(true);
    result
}
