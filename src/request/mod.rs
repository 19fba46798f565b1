//! Pure validation stages of an asynchronous request
//!
//! - [`params`] - URL parameter parsing against a [`ParameterTable`]
//! - [`time_bounds`] - requested interval vs. stream time bounds
//!
//! Nothing here performs I/O; the client composes these stages with the
//! metadata fetch.

pub mod params;
pub mod time_bounds;

pub use params::ParameterTable;

use crate::error::RequestError;
use crate::types::{ValidationIssue, ValidationResult};

impl From<&RequestError> for ValidationIssue {
    fn from(err: &RequestError) -> Self {
        match err {
            RequestError::MalformedUrl { .. } => ValidationIssue::MalformedUrl,
            RequestError::MalformedParameter { .. } => ValidationIssue::MalformedParameter,
            RequestError::UnknownParameter { .. } => ValidationIssue::UnknownParameter,
            RequestError::InvalidParameterValue { .. } => ValidationIssue::InvalidParameterValue,
            RequestError::SynchronousRequestRejected { .. } => {
                ValidationIssue::SynchronousRequestRejected
            }
            RequestError::MissingRequiredParameter { .. } => {
                ValidationIssue::MissingRequiredParameter
            }
            RequestError::InvalidTimeOrder { .. } => ValidationIssue::InvalidTimeOrder,
            RequestError::MissingInstrument { .. } => ValidationIssue::MissingInstrument,
        }
    }
}

/// Validation result for a request that failed parsing
pub fn rejection(err: &RequestError) -> ValidationResult {
    ValidationResult {
        valid: false,
        ..ValidationResult::default()
    }
    .with_issue(err.into(), err.to_string())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_carries_code_and_message() {
        let err = RequestError::MissingRequiredParameter {
            name: "limit".to_string(),
        };
        let result = rejection(&err);

        assert!(!result.valid);
        assert_eq!(
            result.issue,
            Some(ValidationIssue::MissingRequiredParameter)
        );
        assert_eq!(
            result.reason.as_deref(),
            Some("missing required parameter: limit")
        );
        assert_eq!(result.valid_time_interval, None);
    }
}
