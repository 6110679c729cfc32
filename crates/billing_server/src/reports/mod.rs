//! PDF documents returned by the reporting endpoints.

pub mod pdf;

use common::billing::{ConsumptionDetail, Invoice};
use common::dates::DateRange;
use common::sales::{InstanceBreakdown, RevenueLine, SalesAnalysis};
use thiserror::Error;

use self::pdf::{Column, PdfWriter};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to render PDF: {0}")]
    Pdf(String),
}

pub fn money(currency: &str, amount: f64) -> String {
    format!("{currency} {amount:.2}")
}

fn revenue_rows(lines: &[RevenueLine], currency: &str) -> Vec<Vec<String>> {
    lines
        .iter()
        .map(|line| vec![line.name.clone(), money(currency, line.revenue)])
        .collect()
}

/// Revenue by resource and by category for one billing period.
pub fn sales_report(
    analysis: &SalesAnalysis,
    range: &DateRange,
    currency: &str,
) -> Result<Vec<u8>, ReportError> {
    let mut writer = PdfWriter::new("Sales analysis")?;
    writer.title("Sales analysis");
    writer.paragraph(&format!(
        "Period: {} to {}",
        range.start.format("%d/%m/%Y"),
        range.end.format("%d/%m/%Y")
    ));
    writer.spacer(6.0);

    if analysis.by_resource.is_empty() {
        writer.paragraph("No consumption was billed in this period.");
        return writer.finish();
    }

    let total = vec![vec!["Total".to_string(), money(currency, analysis.total)]];

    writer.heading("Revenue by resource");
    writer.table(
        &[Column::text("Resource", 110.0), Column::amount("Revenue", 50.0)],
        &revenue_rows(&analysis.by_resource, currency),
        &total,
    );

    writer.heading("Revenue by category");
    writer.table(
        &[Column::text("Category", 110.0), Column::amount("Revenue", 50.0)],
        &revenue_rows(&analysis.by_category, currency),
        &total,
    );

    writer.finish()
}

/// One invoice with its consumption lines grouped per instance.
pub fn invoice_detail(
    invoice: &Invoice,
    details: &[ConsumptionDetail],
    currency: &str,
) -> Result<Vec<u8>, ReportError> {
    let title = format!("Invoice No. {}", invoice.invoice_number);
    let mut writer = PdfWriter::new(&title)?;
    writer.title(&title);
    writer.paragraph(&format!("Client: {}", invoice.client_name));
    writer.paragraph(&format!("NIT: {}", invoice.client_nit));
    writer.paragraph(&format!(
        "Issued on: {}",
        invoice.issued_on.format("%d/%m/%Y")
    ));
    writer.spacer(6.0);

    for instance in InstanceBreakdown::group(details) {
        writer.heading(&format!(
            "Instance: {} (ID: {})",
            instance.instance_name, instance.instance_id
        ));
        writer.table(
            &[
                Column::text("Resource consumed", 110.0),
                Column::amount("Cost contribution", 50.0),
            ],
            &revenue_rows(&instance.lines, currency),
            &[vec![
                "Instance subtotal".to_string(),
                money(currency, instance.subtotal),
            ]],
        );
    }

    writer.spacer(4.0);
    writer.strong(&format!(
        "TOTAL AMOUNT DUE: {}",
        money(currency, invoice.amount_due)
    ));
    writer.finish()
}
