//! Response builders. All of them are infallible: statuses and header values
//! are known to be valid.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use hyper::{Response, StatusCode};

pub(crate) type Body = Full<Bytes>;

fn with_status(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response<Body> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub(crate) fn ok(content_type: &'static str, body: impl Into<Bytes>) -> Response<Body> {
    with_status(StatusCode::OK, content_type, body)
}

pub(crate) fn json(body: Vec<u8>) -> Response<Body> {
    ok("application/json", body)
}

pub(crate) fn not_found() -> Response<Body> {
    with_status(StatusCode::NOT_FOUND, "text/plain; charset=utf-8", "Not Found")
}

pub(crate) fn method_not_allowed() -> Response<Body> {
    let mut response = with_status(StatusCode::METHOD_NOT_ALLOWED, "text/plain; charset=utf-8", "Method Not Allowed");
    response.headers_mut().insert(ALLOW, HeaderValue::from_static("GET"));
    response
}

pub(crate) fn internal_error(message: String) -> Response<Body> {
    with_status(StatusCode::INTERNAL_SERVER_ERROR, "text/plain; charset=utf-8", message)
}

/// Content type of a cached file, from its extension.
pub(crate) fn content_type(filename: &str) -> &'static str {
    let extension = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0.jpg", "image/jpeg")]
    #[case("12.JPEG", "image/jpeg")]
    #[case("3.png", "image/png")]
    #[case("index.json", "application/json")]
    #[case("README", "application/octet-stream")]
    fn test_content_type(#[case] filename: &str, #[case] expected: &str) {
        assert_eq!(content_type(filename), expected);
    }

    #[test]
    fn test_method_not_allowed() {
        let response = method_not_allowed();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET");
    }
}
