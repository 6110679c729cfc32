use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::error;

pub type HttpResponse = Response<BoxBody<Bytes, hyper::Error>>;

pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed()
}

/// An empty HTTP body (used for OPTIONS responses).
pub fn empty() -> BoxBody<Bytes, hyper::Error> {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

fn build(status: StatusCode, content_type: &'static str, body: BoxBody<Bytes, hyper::Error>) -> HttpResponse {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => build(status, "application/json", full(body)),
        Err(e) => {
            error!(error = %e, "failed to serialize response body");
            build(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                full(r#"{"error":{"code":"InternalServerError","message":"serialization failed","details":{}}}"#),
            )
        }
    }
}

pub fn text_response(status: StatusCode, text: &'static str) -> HttpResponse {
    build(status, "text/plain; charset=utf-8", full(text))
}

/// A PDF download with a `Content-Disposition: attachment` header.
pub fn pdf_response(pdf: Vec<u8>, filename: &str) -> HttpResponse {
    let mut response = build(StatusCode::OK, common::consts::PDF_CONTENT_TYPE, full(pdf));
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// CORS pre-flight response; every path accepts cross-origin calls.
pub fn cors_preflight() -> HttpResponse {
    let mut response = Response::new(empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    let h = response.headers_mut();
    h.insert("Allow", HeaderValue::from_static("GET, POST, OPTIONS"));
    h.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type, X-Request-Id"),
    );
    h.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}

pub fn allow_any_origin(response: &mut HttpResponse) {
    response
        .headers_mut()
        .insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
}
