//! Plain-text tables for the terminal.

use std::fmt::Write;

use common::api::{InvoiceResponse, LoadConfigurationResponse, RecordConsumptionResponse};
use common::model::{Catalog, Resource};
use console::style;

/// Left-aligned columns sized to their widest cell, with a bold header row.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let header = line(headers.iter().map(|h| h.to_string()).collect());
    let _ = writeln!(out, "{}", style(header).bold());
    for row in rows {
        let _ = writeln!(out, "{}", line(row.clone()));
    }
    out
}

fn money(currency: &str, amount: f64) -> String {
    format!("{currency} {amount:.2}")
}

pub fn load_summary(response: &LoadConfigurationResponse) -> String {
    let s = &response.load_summary;
    format!(
        "{}\n  resources:  {}\n  categories: {}\n  clients:    {}\n  instances:  {}\n",
        style(&response.message).green(),
        s.resources,
        s.categories,
        s.clients,
        s.instances
    )
}

pub fn consumption_summary(response: &RecordConsumptionResponse) -> String {
    let mut out = format!("{}\n", style(&response.message).green());
    for error in &response.process_summary.errors {
        let _ = writeln!(out, "  {} {error}", style("skipped:").yellow());
    }
    out
}

pub fn resource(resource: &Resource, currency: &str) -> String {
    format!(
        "Resource {} created: {} ({}), {} per hour per {}\n",
        resource.id,
        resource.name,
        resource.kind.as_str(),
        money(currency, resource.rate_per_hour),
        resource.metric
    )
}

pub fn catalog(catalog: &Catalog, currency: &str) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", style("Resources").cyan().bold());
    let rows: Vec<Vec<String>> = catalog
        .resources
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.name.clone(),
                r.abbreviation.clone(),
                r.metric.clone(),
                r.kind.as_str().to_string(),
                money(currency, r.rate_per_hour),
            ]
        })
        .collect();
    out.push_str(&table(
        &["ID", "Name", "Abbr.", "Metric", "Kind", "Rate/hour"],
        &rows,
    ));

    let _ = writeln!(out, "\n{}", style("Categories").cyan().bold());
    let rows: Vec<Vec<String>> = catalog
        .categories
        .iter()
        .flat_map(|category| {
            category.configurations.iter().map(move |configuration| {
                let resources = configuration
                    .resources
                    .iter()
                    .map(|r| format!("{} x{}", r.resource_id, r.quantity))
                    .collect::<Vec<_>>()
                    .join(", ");
                vec![
                    category.id.clone(),
                    category.name.clone(),
                    configuration.id.clone(),
                    configuration.name.clone(),
                    resources,
                ]
            })
        })
        .collect();
    out.push_str(&table(
        &["Cat.", "Category", "Conf.", "Configuration", "Resources (id x qty)"],
        &rows,
    ));

    let _ = writeln!(out, "\n{}", style("Clients").cyan().bold());
    let rows: Vec<Vec<String>> = catalog
        .clients
        .iter()
        .flat_map(|client| {
            client.instances.iter().map(move |instance| {
                vec![
                    client.nit.clone(),
                    client.name.clone(),
                    instance.id.clone(),
                    instance.name.clone(),
                    instance.configuration_id.clone(),
                    instance.state.as_str().to_string(),
                    instance.consumptions.len().to_string(),
                ]
            })
        })
        .collect();
    out.push_str(&table(
        &["NIT", "Client", "Inst.", "Instance", "Conf.", "State", "Records"],
        &rows,
    ));

    out
}

pub fn invoices(response: &InvoiceResponse, currency: &str) -> String {
    let mut out = format!("{}\n", style(&response.message).green());
    if !response.invoices.is_empty() {
        let rows: Vec<Vec<String>> = response
            .invoices
            .iter()
            .map(|invoice| {
                vec![
                    invoice.invoice_number.to_string(),
                    invoice.client_nit.clone(),
                    invoice.client_name.clone(),
                    invoice.issued_on.format("%d/%m/%Y").to_string(),
                    money(currency, invoice.amount_due),
                ]
            })
            .collect();
        out.push_str(&table(
            &["No.", "NIT", "Client", "Issued", "Amount due"],
            &rows,
        ));
    }
    for error in &response.errors {
        let _ = writeln!(out, "  {} {error}", style("warning:").yellow());
    }
    out
}
