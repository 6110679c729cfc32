//! HTTP client for the billing backend.
//!
//! Each method maps onto one backend endpoint. Non-2xx answers are turned
//! into [`RelayError::Backend`] carrying the message from the backend's error
//! envelope when there is one.

use common::api::{
    DateRangeRequest, ErrorEnvelope, InvoiceDetailRequest, InvoiceResponse,
    LoadConfigurationResponse, MessageResponse, NewResource, RecordConsumptionResponse,
};
use common::consts::{
    CREATE_RESOURCE_PATH, GENERATE_INVOICES_PATH, INVOICE_DETAIL_PATH, LOAD_CONFIGURATION_PATH,
    QUERY_DATA_PATH, RECORD_CONSUMPTION_PATH, RESET_PATH, SALES_REPORT_PATH, XML_CONTENT_TYPE,
};
use common::model::{Catalog, Resource};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("backend at {url} is unreachable: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("invalid response from backend: {0}")]
    InvalidResponse(String),
}

pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, url: String) -> Result<Response, RelayError> {
        debug!(url = %url, "calling backend");
        let response = request
            .send()
            .await
            .map_err(|source| RelayError::Unreachable { url, source })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))?;
        let message = serde_json::from_slice::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_string());
        Err(RelayError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, RelayError> {
        let body = response
            .bytes()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| RelayError::InvalidResponse(e.to_string()))
    }

    async fn pdf(response: Response) -> Result<Vec<u8>, RelayError> {
        let body = response
            .bytes()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))?;
        if !body.starts_with(b"%PDF") {
            return Err(RelayError::InvalidResponse(
                "expected a PDF document".to_string(),
            ));
        }
        Ok(body.to_vec())
    }

    async fn post_xml(&self, path: &str, xml: String) -> Result<Response, RelayError> {
        let url = self.url(path);
        let request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(xml);
        self.send(request, url).await
    }

    pub async fn load_configuration(
        &self,
        xml: String,
    ) -> Result<LoadConfigurationResponse, RelayError> {
        let response = self.post_xml(LOAD_CONFIGURATION_PATH, xml).await?;
        Self::json(response).await
    }

    pub async fn record_consumption(
        &self,
        xml: String,
    ) -> Result<RecordConsumptionResponse, RelayError> {
        let response = self.post_xml(RECORD_CONSUMPTION_PATH, xml).await?;
        Self::json(response).await
    }

    pub async fn query_data(&self) -> Result<Catalog, RelayError> {
        let url = self.url(QUERY_DATA_PATH);
        let response = self.send(self.http.get(&url), url).await?;
        Self::json(response).await
    }

    pub async fn generate_invoices(
        &self,
        range: &DateRangeRequest,
    ) -> Result<InvoiceResponse, RelayError> {
        let url = self.url(GENERATE_INVOICES_PATH);
        let response = self.send(self.http.post(&url).json(range), url).await?;
        Self::json(response).await
    }

    pub async fn sales_report(&self, range: &DateRangeRequest) -> Result<Vec<u8>, RelayError> {
        let url = self.url(SALES_REPORT_PATH);
        let response = self.send(self.http.post(&url).json(range), url).await?;
        Self::pdf(response).await
    }

    pub async fn invoice_detail(
        &self,
        request: &InvoiceDetailRequest,
    ) -> Result<Vec<u8>, RelayError> {
        let url = self.url(INVOICE_DETAIL_PATH);
        let response = self.send(self.http.post(&url).json(request), url).await?;
        Self::pdf(response).await
    }

    pub async fn create_resource(&self, new: &NewResource) -> Result<Resource, RelayError> {
        let url = self.url(CREATE_RESOURCE_PATH);
        let response = self.send(self.http.post(&url).json(new), url).await?;
        Self::json(response).await
    }

    pub async fn reset(&self) -> Result<MessageResponse, RelayError> {
        let url = self.url(RESET_PATH);
        let response = self.send(self.http.post(&url), url).await?;
        Self::json(response).await
    }
}
