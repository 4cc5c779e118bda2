#![allow(dead_code)]

// tests/common/mod.rs
use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::{HeaderName, CONTENT_TYPE};
use backend_test_support::problem_details::{
    assert_problem_details_from_service_response, Problem,
};

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// Check the problem+json shape, the trace header, and the `Retry-After`
/// rule (present on 503 only).
pub async fn assert_problem_details_structure(
    resp: ServiceResponse<BoxBody>,
    expected_status: u16,
    expected_code: &str,
    expected_detail: Option<&str>,
) -> Problem {
    let headers = resp.headers().clone();

    let trace_hdr = HeaderName::from_static("x-trace-id");
    let trace_id = headers
        .get(&trace_hdr)
        .and_then(|v| v.to_str().ok())
        .expect("x-trace-id header should be present and valid UTF-8");
    assert!(!trace_id.is_empty(), "x-trace-id header should not be empty");

    // Content-Type may include parameters (e.g., charset)
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        content_type.starts_with("application/problem+json"),
        "Content-Type must be application/problem+json (got {content_type})"
    );

    if expected_status == 503 {
        assert!(headers.get("Retry-After").is_some());
    } else {
        assert!(headers.get("Retry-After").is_none());
    }

    let status = actix_web::http::StatusCode::from_u16(expected_status)
        .expect("valid status code");
    let problem =
        assert_problem_details_from_service_response(resp, expected_code, status, expected_detail)
            .await;
    assert!(problem.type_.ends_with(expected_code));
    problem
}
