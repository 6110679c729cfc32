use common::store::DocumentStore;
use hyper::StatusCode;

use super::errors::ApiError;
use super::response::{json_response, HttpResponse};
use crate::app_state::AppState;

/// `GET /api/consultarDatos`: the whole stored document as JSON.
pub async fn query_data(state: &AppState) -> Result<HttpResponse, ApiError> {
    let catalog = state.with_store(DocumentStore::load).await?;
    Ok(json_response(StatusCode::OK, &catalog))
}
