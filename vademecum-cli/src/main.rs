//! Vademecum - search the PAMI medication price list and build priced quotes

use anyhow::Result;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vademecum_core::query::{SearchField, SortKey};

mod catalog_cli;
mod quote_cli;

use catalog_cli::{CacheCommand, CatalogContext, SearchArgs};
use quote_cli::{PriceArg, QuoteArgs, QuoteFormat, QuoteItem};

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "vademecum",
    about = "Search the PAMI medication price list and build priced quotes",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Configuration file (defaults to the platform config directory)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Emit logs as JSON
    #[clap(long, global = true)]
    log_json: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Download the medication list if a newer one was published
    Sync {
        /// Output the outcome as JSON
        #[clap(long)]
        json: bool,
    },

    /// Search medications by name or active ingredient
    Search {
        /// Text to look for (case-insensitive)
        term: String,

        /// Field the term is matched against (name, ingredient)
        #[clap(long, default_value = "name")]
        by: SearchField,

        /// Only show products from this manufacturer (exact name)
        #[clap(long)]
        manufacturer: Option<String>,

        /// Minimum list price
        #[clap(long)]
        min_price: Option<Decimal>,

        /// Maximum list price
        #[clap(long)]
        max_price: Option<Decimal>,

        /// Sort order (name-asc, name-desc, ingredient-asc, ingredient-desc,
        /// manufacturer-asc, manufacturer-desc, price-asc, price-desc)
        #[clap(long, default_value = "name-asc")]
        sort: SortKey,

        /// Show at most this many results
        #[clap(long)]
        limit: Option<usize>,

        /// Output results as JSON
        #[clap(long)]
        json: bool,

        /// Check for a newer medication list first
        #[clap(long)]
        sync: bool,
    },

    /// Show details of one medication
    Show {
        /// Alfabeta code
        code: String,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// List manufacturer names
    Manufacturers,

    /// Build a priced quote from product codes (CODE or CODExQTY)
    Quote {
        /// Product codes, optionally with a quantity (e.g. 11111x2)
        #[clap(required = true)]
        items: Vec<QuoteItem>,

        /// Price charged for each line (defaults to the configured basis)
        #[clap(long, value_enum)]
        price: Option<PriceArg>,

        /// Output format
        #[clap(long, value_enum, default_value = "table")]
        format: QuoteFormat,

        /// Write the quote to a file instead of stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
    },

    /// Convert a published spreadsheet into a JSON snapshot
    Convert {
        /// Spreadsheet file (xlsx, xls, ods)
        spreadsheet: PathBuf,

        /// Output file (defaults to the input name with a .json extension)
        #[clap(long, short)]
        output: Option<PathBuf>,
    },

    /// Inspect or clear the downloaded dataset
    Cache {
        #[clap(subcommand)]
        command: CacheCommand,
    },
}

/// Initialize tracing with CLI flags
///
/// Logs always go to stderr so stdout stays usable for JSON output.
fn initialize_tracing(log_level: &LogLevel, json: bool) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, cli.log_json);

    // `convert` works on local files and never loads the configuration
    let open = || CatalogContext::open(cli.config.as_deref());

    match cli.command {
        Command::Sync { json } => catalog_cli::execute_sync(&open()?, json).await,
        Command::Search {
            term,
            by,
            manufacturer,
            min_price,
            max_price,
            sort,
            limit,
            json,
            sync,
        } => {
            let args = SearchArgs {
                term,
                by,
                manufacturer,
                min_price,
                max_price,
                sort,
                limit,
                json,
                sync,
            };
            catalog_cli::execute_search(&open()?, args).await
        }
        Command::Show { code, json } => catalog_cli::execute_show(&open()?, &code, json).await,
        Command::Manufacturers => catalog_cli::execute_manufacturers(&open()?).await,
        Command::Quote {
            items,
            price,
            format,
            output,
        } => {
            let args = QuoteArgs {
                items,
                price,
                format,
                output,
            };
            quote_cli::execute_quote(&open()?, args).await
        }
        Command::Convert {
            spreadsheet,
            output,
        } => catalog_cli::execute_convert(&spreadsheet, output).await,
        Command::Cache { command } => catalog_cli::execute_cache(&open()?, command).await,
    }
}
