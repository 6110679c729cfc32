use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use common::consts::DEFAULT_CURRENCY_SYMBOL;
use simulator_cli::client::BackendClient;
use simulator_cli::commands::{self, Context, ResourceArgs};
use simulator_cli::session::SessionFile;
use tracing_subscriber::EnvFilter;

/// cloudsim -- command-line client for the cloud billing simulator.
#[derive(Parser, Debug)]
#[command(name = "cloudsim", version, about)]
struct Cli {
    /// Base URL of the billing backend
    #[arg(
        long,
        global = true,
        env = "SIMULATOR_BACKEND_URL",
        default_value = "http://127.0.0.1:5000"
    )]
    backend: String,

    /// Where the last billing run is kept
    #[arg(long, global = true, env = "SIMULATOR_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Currency symbol used when printing amounts
    #[arg(long, global = true, env = "SIMULATOR_CURRENCY", default_value = DEFAULT_CURRENCY_SYMBOL)]
    currency: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a configuration XML, replacing all stored data
    LoadConfig {
        /// Path to the configuration XML
        file: PathBuf,
    },

    /// Upload a batch of consumption records
    RecordConsumption {
        /// Path to the consumption XML
        file: PathBuf,
    },

    /// Show resources, categories and clients
    ShowData,

    /// Generate invoices for a period
    Invoice {
        /// Start of the period (any text containing dd/mm/yyyy)
        #[arg(long)]
        from: String,

        /// End of the period, inclusive
        #[arg(long)]
        to: String,
    },

    /// Download the detail PDF of an invoice from the last `invoice` run
    InvoicePdf {
        /// Invoice number
        number: u32,

        /// Output file (defaults to invoice_<number>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download the sales analysis PDF for a period
    SalesReport {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Output file (defaults to sales_report.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add a resource to the catalog
    AddResource {
        #[arg(long)]
        name: String,

        #[arg(long)]
        abbreviation: String,

        /// Unit the resource is measured in
        #[arg(long)]
        metric: String,

        /// Hardware or Software
        #[arg(long, default_value = "Hardware")]
        kind: String,

        /// Price per unit per hour
        #[arg(long)]
        rate: f64,
    },

    /// Delete all stored data
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context {
        client: BackendClient::new(&cli.backend),
        session: SessionFile::new(cli.session_file.unwrap_or_else(SessionFile::default_path)),
        currency: cli.currency,
    };

    match cli.command {
        Commands::LoadConfig { file } => commands::load_config(&ctx, &file).await,
        Commands::RecordConsumption { file } => commands::record_consumption(&ctx, &file).await,
        Commands::ShowData => commands::show_data(&ctx).await,
        Commands::Invoice { from, to } => commands::invoice(&ctx, &from, &to).await,
        Commands::InvoicePdf { number, output } => commands::invoice_pdf(&ctx, number, output).await,
        Commands::SalesReport { from, to, output } => {
            commands::sales_report(&ctx, &from, &to, output).await
        }
        Commands::AddResource {
            name,
            abbreviation,
            metric,
            kind,
            rate,
        } => {
            commands::add_resource(
                &ctx,
                ResourceArgs {
                    name,
                    abbreviation,
                    metric,
                    kind,
                    rate_per_hour: rate,
                },
            )
            .await
        }
        Commands::Reset => commands::reset(&ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_invoice_pdf_with_output() {
        let cli = Cli::try_parse_from(["cloudsim", "invoice-pdf", "3", "-o", "out.pdf"]).unwrap();
        match cli.command {
            Commands::InvoicePdf { number, output } => {
                assert_eq!(number, 3);
                assert_eq!(output, Some(PathBuf::from("out.pdf")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
