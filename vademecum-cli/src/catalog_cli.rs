//! Catalog commands: sync, search, show, manufacturers, convert, cache

use anyhow::{Context, Result};
use clap::Subcommand;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use vademecum_core::catalog::{ingest, validate_entries, CatalogEntry};
use vademecum_core::config::VademecumConfig;
use vademecum_core::query::{run_query, QuerySpec, SearchField, SortKey};
use vademecum_core::sync::{HttpSource, SyncManager};

/// Loaded configuration plus the sync manager built from it
pub struct CatalogContext {
    pub config: VademecumConfig,
    pub manager: SyncManager<HttpSource>,
}

impl CatalogContext {
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = VademecumConfig::load(config_path)?;
        let dataset_path = config.dataset_path()?;
        let source = HttpSource::new(&config.source)
            .context("Failed to create HTTP client")?;

        tracing::debug!(
            "Dataset at {}, source {}",
            dataset_path.display(),
            config.source.url
        );

        let manager =
            SyncManager::new(source, dataset_path).with_fallback(config.fallback_snapshot.clone());

        Ok(Self { config, manager })
    }
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Show where the dataset is stored and when it was last updated
    Info {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Delete the downloaded dataset
    Clear,
}

/// Search options as given on the command line
#[derive(Debug)]
pub struct SearchArgs {
    pub term: String,
    pub by: SearchField,
    pub manufacturer: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: SortKey,
    pub limit: Option<usize>,
    pub json: bool,
    pub sync: bool,
}

pub async fn execute_sync(ctx: &CatalogContext, json_output: bool) -> Result<()> {
    eprintln!("Checking {} for updates...", ctx.config.source.url);

    let outcome = ctx.manager.check_and_sync().await?;

    if json_output {
        let output = serde_json::json!({
            "refreshed": outcome.refreshed,
            "asOf": outcome.as_of,
            "message": outcome.message(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", outcome.message());
    }

    Ok(())
}

/// Table row for search results
#[derive(Tabled)]
struct SearchResultRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Active ingredient")]
    ingredient: String,
    #[tabled(rename = "Presentation")]
    presentation: String,
    #[tabled(rename = "Manufacturer")]
    manufacturer: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Coverage")]
    coverage: String,
}

impl From<&CatalogEntry> for SearchResultRow {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            code: entry.catalog_code.clone(),
            name: truncate(&entry.display_name, 30),
            ingredient: truncate(&entry.active_ingredient, 30),
            presentation: truncate(&entry.presentation, 30),
            manufacturer: entry.manufacturer.clone(),
            price: format_amount(entry.list_price),
            coverage: entry.coverage_plan.clone(),
        }
    }
}

pub async fn execute_search(ctx: &CatalogContext, args: SearchArgs) -> Result<()> {
    if args.sync {
        // Browsing keeps working on the previous copy when the check fails
        match ctx.manager.check_and_sync().await {
            Ok(outcome) => eprintln!("{}", outcome.message()),
            Err(e) => {
                tracing::warn!("Sync before search failed: {}", e);
                eprintln!("Warning: could not check for a newer medication list: {e}");
            }
        }
    }

    let store = ctx.manager.read_entries().await?;

    let spec = QuerySpec::new(args.term)
        .search_by(args.by)
        .price_range(args.min_price, args.max_price)
        .sort_by(args.sort);
    let spec = match args.manufacturer {
        Some(manufacturer) => spec.manufacturer(manufacturer),
        None => spec,
    };

    let mut results = run_query(&store, &spec);
    let matched = results.len();
    if let Some(limit) = args.limit {
        results.truncate(limit);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No medications found.");
        return Ok(());
    }

    println!(
        "Found {} medication(s), sorted by {}:\n",
        matched,
        spec.sort.label()
    );

    let rows: Vec<SearchResultRow> = results.iter().copied().map(SearchResultRow::from).collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();
    println!("{table}");

    if results.len() < matched {
        println!("  ... and {} more (use --limit to show more)", matched - results.len());
    }

    Ok(())
}

pub async fn execute_show(ctx: &CatalogContext, code: &str, json_output: bool) -> Result<()> {
    let store = ctx.manager.read_entries().await?;
    let entry = store
        .find_by_code(code)
        .with_context(|| format!("Medication with code '{code}' not found in the catalog"))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(entry)?);
        return Ok(());
    }

    println!();
    println!("{}", entry.display_name);
    println!();
    println!("  Code:              {}", entry.catalog_code);
    println!("  Active ingredient: {}", entry.active_ingredient);
    println!("  Presentation:      {}", entry.presentation);
    println!("  Manufacturer:      {}", entry.manufacturer);
    println!("  List price:        {}", format_amount(entry.list_price));
    println!("  Affiliate copay:   {}", format_amount(entry.affiliate_copay));
    if entry.has_coverage() {
        println!("  Coverage:          {}", entry.coverage_plan);
    } else {
        println!("  Coverage:          none");
    }

    Ok(())
}

pub async fn execute_manufacturers(ctx: &CatalogContext) -> Result<()> {
    let store = ctx.manager.read_entries().await?;
    for name in store.manufacturers() {
        println!("{name}");
    }
    Ok(())
}

/// Convert a published spreadsheet into a JSON snapshot usable as fallback data
pub async fn execute_convert(spreadsheet: &Path, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| spreadsheet.with_extension("json"));

    let entries = ingest::load_dataset_file(spreadsheet)
        .await
        .with_context(|| format!("Failed to read {}", spreadsheet.display()))?;
    validate_entries(&entries)?;

    ingest::write_snapshot(&output, &entries)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Wrote {} medications to {}", entries.len(), output.display());
    Ok(())
}

pub async fn execute_cache(ctx: &CatalogContext, command: CacheCommand) -> Result<()> {
    match command {
        CacheCommand::Info { json } => {
            let info = ctx.manager.dataset_info().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
                return Ok(());
            }

            println!("Dataset: {}", info.path.display());
            match info.modified {
                Some(modified) => println!(
                    "Last update: {}",
                    modified.format("%d/%m/%Y %H:%M UTC")
                ),
                None => {
                    println!("Not downloaded yet.");
                    println!("\nRun 'vademecum sync' to download it.");
                }
            }
            if let Some(fallback) = &ctx.config.fallback_snapshot {
                println!("Fallback snapshot: {}", fallback.display());
            }
        }
        CacheCommand::Clear => {
            if ctx.manager.clear_dataset().await? {
                println!("Removed {}", ctx.manager.dataset_path().display());
            } else {
                println!("Nothing to remove.");
            }
        }
    }

    Ok(())
}

/// `$1234.50`
pub fn format_amount(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
