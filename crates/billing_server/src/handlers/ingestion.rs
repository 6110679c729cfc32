use bytes::Bytes;
use common::api::{LoadConfigurationResponse, RecordConsumptionResponse};
use hyper::StatusCode;
use tracing::info;

use super::errors::ApiError;
use super::request::body_text;
use super::response::{json_response, HttpResponse};
use crate::app_state::AppState;

/// `POST /api/cargarConfiguracion`: replace the stored document with the
/// uploaded configuration XML.
pub async fn load_configuration(body: Bytes, state: &AppState) -> Result<HttpResponse, ApiError> {
    let xml = body_text(&body)?.to_string();
    let summary = state
        .with_store(move |store| store.replace_with_config(&xml))
        .await?;

    info!(clients = summary.clients, "configuration loaded");
    Ok(json_response(
        StatusCode::OK,
        &LoadConfigurationResponse {
            message: "Configuration loaded successfully".to_string(),
            load_summary: summary,
        },
    ))
}

/// `POST /api/registrarConsumo`: append a batch of consumption records.
pub async fn record_consumption(body: Bytes, state: &AppState) -> Result<HttpResponse, ApiError> {
    let xml = body_text(&body)?.to_string();
    let summary = state
        .with_store(move |store| store.record_consumptions(&xml))
        .await?;

    let message = if summary.errors.is_empty() {
        format!("{} consumption records processed", summary.processed)
    } else {
        format!(
            "{} consumption records processed, {} skipped",
            summary.processed,
            summary.errors.len()
        )
    };
    Ok(json_response(
        StatusCode::OK,
        &RecordConsumptionResponse {
            message,
            process_summary: summary,
        },
    ))
}
