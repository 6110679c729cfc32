use bytes::Bytes;
use common::api::{MessageResponse, NewResource};
use common::store::DocumentStore;
use hyper::StatusCode;

use super::errors::ApiError;
use super::request::parse_json;
use super::response::{json_response, HttpResponse};
use crate::app_state::AppState;

/// `POST /api/resetear`: remove the data file.
pub async fn reset(state: &AppState) -> Result<HttpResponse, ApiError> {
    let removed = state.with_store(DocumentStore::reset).await?;
    let message = if removed {
        "The system has been reset. All data has been removed."
    } else {
        "The system was already empty."
    };
    Ok(json_response(
        StatusCode::OK,
        &MessageResponse {
            message: message.to_string(),
        },
    ))
}

/// `POST /api/crearRecurso`: append a resource to the catalog.
pub async fn create_resource(body: Bytes, state: &AppState) -> Result<HttpResponse, ApiError> {
    let new: NewResource = parse_json(&body)?;
    validate(&new)?;

    let resource = state
        .with_store(move |store| store.add_resource(new))
        .await?;
    Ok(json_response(StatusCode::CREATED, &resource))
}

fn validate(new: &NewResource) -> Result<(), ApiError> {
    if new.name.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "resource name must not be empty".to_string(),
        ));
    }
    if !new.rate_per_hour.is_finite() || new.rate_per_hour < 0.0 {
        return Err(ApiError::InvalidRequest(format!(
            "rate_per_hour must be a non-negative number, got {}",
            new.rate_per_hour
        )));
    }
    Ok(())
}
