use bytes::Bytes;
use common::api::{DateRangeRequest, InvoiceDetailRequest, InvoiceResponse};
use common::billing::{self, BillingRun};
use common::dates::DateRange;
use common::sales::SalesAnalysis;
use common::store::DocumentStore;
use hyper::StatusCode;
use tracing::info;

use super::errors::ApiError;
use super::request::parse_json;
use super::response::{json_response, pdf_response, HttpResponse};
use crate::app_state::AppState;
use crate::reports;

/// `POST /api/generarFactura`: bill every client for the requested period.
pub async fn generate_invoices(body: Bytes, state: &AppState) -> Result<HttpResponse, ApiError> {
    let range = parse_range(&body)?;
    let run = bill(state, &range).await?;

    let message = format!(
        "{} invoices generated for {} to {}",
        run.invoices.len(),
        range.start.format("%d/%m/%Y"),
        range.end.format("%d/%m/%Y")
    );
    Ok(json_response(
        StatusCode::OK,
        &InvoiceResponse {
            message,
            invoices: run.invoices,
            consumption_details: run.details,
            errors: run.errors,
        },
    ))
}

/// `POST /api/reporteVentas`: revenue by resource and category as a PDF.
pub async fn sales_report(body: Bytes, state: &AppState) -> Result<HttpResponse, ApiError> {
    let range = parse_range(&body)?;
    let run = bill(state, &range).await?;

    let analysis = SalesAnalysis::from_details(&run.details);
    let pdf = reports::sales_report(&analysis, &range, &state.currency_symbol)?;
    Ok(pdf_response(pdf, "sales_report.pdf"))
}

/// `POST /api/detalleFactura`: render one invoice and its consumption lines.
///
/// The invoice and its lines come from the caller (the result of an earlier
/// `generarFactura`); lines for other clients are ignored.
pub async fn invoice_detail(body: Bytes, state: &AppState) -> Result<HttpResponse, ApiError> {
    let InvoiceDetailRequest {
        invoice,
        mut details,
    } = parse_json(&body)?;
    details.retain(|detail| detail.client_nit == invoice.client_nit);

    let pdf = reports::invoice_detail(&invoice, &details, &state.currency_symbol)?;
    Ok(pdf_response(
        pdf,
        &format!("invoice_{}.pdf", invoice.invoice_number),
    ))
}

async fn bill(state: &AppState, range: &DateRange) -> Result<BillingRun, ApiError> {
    let catalog = state.with_store(DocumentStore::load).await?;
    let run = billing::bill_detailed(&catalog, range);
    info!(
        invoices = run.invoices.len(),
        lines = run.details.len(),
        skipped = run.errors.len(),
        "billing run completed"
    );
    Ok(run)
}

fn parse_range(body: &Bytes) -> Result<DateRange, ApiError> {
    let request: DateRangeRequest = parse_json(body)?;
    let start = non_blank(request.start_date.as_deref());
    let end = non_blank(request.end_date.as_deref());
    match (start, end) {
        (Some(start), Some(end)) => Ok(DateRange::parse(start, end)?),
        _ => Err(ApiError::InvalidRequest(
            "both start_date and end_date are required".to_string(),
        )),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn range_accepts_spanish_field_names() {
        let body = Bytes::from(r#"{"fecha_inicio": "01/03/2024", "fecha_fin": "hasta el 31/03/2024"}"#);
        let range = parse_range(&body).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn range_requires_both_dates() {
        let body = Bytes::from(r#"{"start_date": "01/03/2024", "end_date": "  "}"#);
        assert!(matches!(parse_range(&body), Err(ApiError::InvalidRequest(_))));
    }

    #[test]
    fn range_rejects_text_without_dates() {
        let body = Bytes::from(r#"{"start_date": "yesterday", "end_date": "31/03/2024"}"#);
        assert!(matches!(parse_range(&body), Err(ApiError::InvalidRequest(_))));
    }
}
