use super::UframeClient;
use super::test_helpers::*;
use crate::config::{FrontEnd, SubmitOptions};
use crate::error::{Error, ErrorKind};
use crate::types::{Event, RequestStatus, ValidationIssue};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod discover;
