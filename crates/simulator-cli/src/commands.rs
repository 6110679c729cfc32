use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use common::api::{DateRangeRequest, NewResource};
use common::model::ResourceKind;
use console::style;
use tracing::{debug, info};

use crate::client::BackendClient;
use crate::render;
use crate::session::{Session, SessionFile};

/// Everything a command needs: the backend, the session file and the
/// currency used when printing amounts.
pub struct Context {
    pub client: BackendClient,
    pub session: SessionFile,
    pub currency: String,
}

fn read_xml(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_pdf(path: &Path, pdf: &[u8]) -> Result<()> {
    fs::write(path, pdf).with_context(|| format!("failed to write {}", path.display()))?;
    println!("{} {}", style("saved").green(), path.display());
    Ok(())
}

pub async fn load_config(ctx: &Context, file: &Path) -> Result<()> {
    let xml = read_xml(file)?;
    let response = ctx.client.load_configuration(xml).await?;
    print!("{}", render::load_summary(&response));
    Ok(())
}

pub async fn record_consumption(ctx: &Context, file: &Path) -> Result<()> {
    let xml = read_xml(file)?;
    let response = ctx.client.record_consumption(xml).await?;
    print!("{}", render::consumption_summary(&response));
    Ok(())
}

pub async fn show_data(ctx: &Context) -> Result<()> {
    let catalog = ctx.client.query_data().await?;
    print!("{}", render::catalog(&catalog, &ctx.currency));
    Ok(())
}

/// Bill the period and keep the run in the session for `invoice-pdf`.
pub async fn invoice(ctx: &Context, from: &str, to: &str) -> Result<()> {
    let range = DateRangeRequest {
        start_date: Some(from.to_string()),
        end_date: Some(to.to_string()),
    };
    let response = ctx.client.generate_invoices(&range).await?;

    ctx.session
        .save(&Session::from_run(from, to, &response))
        .context("failed to store the billing run")?;
    debug!(path = %ctx.session.path().display(), "billing run saved");

    print!("{}", render::invoices(&response, &ctx.currency));
    Ok(())
}

pub async fn invoice_pdf(ctx: &Context, number: u32, output: Option<PathBuf>) -> Result<()> {
    let session = ctx.session.load()?;
    let request = session.detail_request(number)?;
    info!(
        invoice = number,
        lines = request.details.len(),
        "requesting invoice detail"
    );

    let pdf = ctx.client.invoice_detail(&request).await?;
    let path = output.unwrap_or_else(|| PathBuf::from(format!("invoice_{number}.pdf")));
    write_pdf(&path, &pdf)
}

pub async fn sales_report(ctx: &Context, from: &str, to: &str, output: Option<PathBuf>) -> Result<()> {
    let range = DateRangeRequest {
        start_date: Some(from.to_string()),
        end_date: Some(to.to_string()),
    };
    let pdf = ctx.client.sales_report(&range).await?;
    let path = output.unwrap_or_else(|| PathBuf::from("sales_report.pdf"));
    write_pdf(&path, &pdf)
}

pub struct ResourceArgs {
    pub name: String,
    pub abbreviation: String,
    pub metric: String,
    pub kind: String,
    pub rate_per_hour: f64,
}

pub async fn add_resource(ctx: &Context, args: ResourceArgs) -> Result<()> {
    let new = NewResource {
        name: args.name,
        abbreviation: args.abbreviation,
        metric: args.metric,
        kind: ResourceKind::from(args.kind),
        rate_per_hour: args.rate_per_hour,
    };
    let resource = ctx.client.create_resource(&new).await?;
    print!("{}", render::resource(&resource, &ctx.currency));
    Ok(())
}

pub async fn reset(ctx: &Context) -> Result<()> {
    let response = ctx.client.reset().await?;
    if ctx.session.clear()? {
        debug!(path = %ctx.session.path().display(), "session cleared");
    }
    println!("{}", style(&response.message).green());
    Ok(())
}
