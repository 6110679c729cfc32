//! JSON payloads exchanged between the backend and the relay.

use serde::{Deserialize, Serialize};

use crate::billing::{ConsumptionDetail, Invoice};
use crate::model::ResourceKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub resources: usize,
    pub categories: usize,
    pub clients: usize,
    pub instances: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionSummary {
    pub processed: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResource {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "abreviatura")]
    pub abbreviation: String,
    #[serde(alias = "metrica")]
    pub metric: String,
    #[serde(alias = "tipo")]
    pub kind: ResourceKind,
    #[serde(alias = "valorXhora")]
    pub rate_per_hour: f64,
}

/// Date-range "form". Both fields are free text; a date is extracted from each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRangeRequest {
    #[serde(default, alias = "fecha_inicio")]
    pub start_date: Option<String>,
    #[serde(default, alias = "fecha_fin")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDetailRequest {
    #[serde(alias = "factura_info")]
    pub invoice: Invoice,
    #[serde(default, alias = "detalles_consumo")]
    pub details: Vec<ConsumptionDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfigurationResponse {
    pub message: String,
    pub load_summary: LoadSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordConsumptionResponse {
    pub message: String,
    pub process_summary: ConsumptionSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub message: String,
    pub invoices: Vec<Invoice>,
    pub consumption_details: Vec<ConsumptionDetail>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// `{"error": {"code", "message", "details"}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}
