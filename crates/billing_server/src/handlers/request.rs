use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::Request;
use serde::de::DeserializeOwned;

use super::errors::ApiError;

/// Extract request ID from incoming request headers, or generate a new UUID v4.
pub fn extract_request_id<T>(request: &Request<T>) -> String {
    request
        .headers()
        .get(common::consts::REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

pub async fn read_body<B>(request: Request<B>) -> Result<Bytes, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    request
        .into_body()
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| ApiError::InvalidRequest(format!("failed to read request body: {e}")))
}

/// Interpret the body as UTF-8 text (the XML uploads). An empty body is rejected.
pub fn body_text(body: &Bytes) -> Result<&str, ApiError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| ApiError::InvalidRequest(format!("body is not valid UTF-8: {e}")))?;
    if text.trim().is_empty() {
        return Err(ApiError::InvalidRequest("request body is empty".to_string()));
    }
    Ok(text)
}

pub fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::InvalidRequest("request body is empty".to_string()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidRequest(format!("invalid JSON: {e}")))
}
