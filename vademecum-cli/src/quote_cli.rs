//! Quote command: build a cart from product codes and render the summary

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use vademecum_core::cart::{Cart, CartSummary, PriceBasis};
use vademecum_core::CatalogStore;

use crate::catalog_cli::{format_amount, CatalogContext};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriceArg {
    /// Public list price
    List,
    /// Amount charged to the affiliate
    Copay,
}

impl From<PriceArg> for PriceBasis {
    fn from(arg: PriceArg) -> Self {
        match arg {
            PriceArg::List => PriceBasis::ListPrice,
            PriceArg::Copay => PriceBasis::AffiliateCopay,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum QuoteFormat {
    #[default]
    Table,
    Markdown,
    Html,
    Json,
}

/// `CODE` or `CODExQTY` on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteItem {
    pub code: String,
    pub quantity: i64,
}

impl FromStr for QuoteItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (code, quantity) = match s.rsplit_once(['x', 'X']) {
            Some((code, qty)) => {
                let quantity = qty
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid quantity '{qty}' in '{s}'"))?;
                (code, quantity)
            }
            None => (s, 1),
        };

        if code.is_empty() {
            return Err(format!("Missing product code in '{s}'"));
        }
        if quantity < 1 {
            return Err(format!("Quantity must be at least 1 in '{s}'"));
        }

        Ok(Self {
            code: code.to_string(),
            quantity,
        })
    }
}

pub struct QuoteArgs {
    pub items: Vec<QuoteItem>,
    pub price: Option<PriceArg>,
    pub format: QuoteFormat,
    pub output: Option<PathBuf>,
}

pub async fn execute_quote(ctx: &CatalogContext, args: QuoteArgs) -> Result<()> {
    let store = ctx.manager.read_entries().await?;
    let basis = args
        .price
        .map(PriceBasis::from)
        .unwrap_or(ctx.config.price_basis);

    let cart = build_cart(&store, &args.items, basis)?;
    let summary = CartSummary::from_cart(&cart, chrono::Local::now().date_naive());

    let rendered = match args.format {
        QuoteFormat::Table => render_table(&summary),
        QuoteFormat::Markdown => render_markdown(&summary),
        QuoteFormat::Html => render_html(&summary),
        QuoteFormat::Json => serde_json::to_string_pretty(&summary)?,
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write quote: {}", path.display()))?;
            println!("Quote saved to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

/// Add each requested product; repeated codes accumulate
fn build_cart(store: &CatalogStore, items: &[QuoteItem], basis: PriceBasis) -> Result<Cart> {
    let mut cart = Cart::new(basis);

    for item in items {
        let entry = store
            .find_by_code(&item.code)
            .with_context(|| format!("Medication with code '{}' not found in the catalog", item.code))?;

        let current = cart
            .get(&entry.catalog_code)
            .map(|line| i64::from(line.quantity))
            .unwrap_or(0);
        cart.add(entry);
        cart.set_quantity(&entry.catalog_code, current.saturating_add(item.quantity));
    }

    tracing::debug!(
        "Quote cart has {} line(s), {} unit(s)",
        cart.len(),
        cart.item_count()
    );
    Ok(cart)
}

#[derive(Tabled)]
struct QuoteRow {
    #[tabled(rename = "Medication")]
    name: String,
    #[tabled(rename = "Presentation")]
    presentation: String,
    #[tabled(rename = "Coverage")]
    coverage: String,
    #[tabled(rename = "Unit price")]
    unit_price: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Subtotal")]
    subtotal: String,
}

fn render_table(summary: &CartSummary) -> String {
    let rows: Vec<QuoteRow> = summary
        .lines
        .iter()
        .map(|line| QuoteRow {
            name: line.name.clone(),
            presentation: line.presentation.clone(),
            coverage: line.coverage.clone(),
            unit_price: format_amount(line.unit_price),
            quantity: line.quantity,
            subtotal: format_amount(line.subtotal),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    format!(
        "Medication quote - {}\n\n{}\n\nTotal: {}",
        summary.generated.format("%d/%m/%Y"),
        table,
        format_amount(summary.total)
    )
}

fn render_markdown(summary: &CartSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Medication quote");
    let _ = writeln!(out);
    let _ = writeln!(out, "Date: {}", summary.generated.format("%d/%m/%Y"));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "| Medication | Presentation | Active ingredient | Coverage | Unit price | Qty | Subtotal |"
    );
    let _ = writeln!(out, "|---|---|---|---|---:|---:|---:|");
    for line in &summary.lines {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            markdown_cell(&line.name),
            markdown_cell(&line.presentation),
            markdown_cell(&line.active_ingredient),
            markdown_cell(&line.coverage),
            format_amount(line.unit_price),
            line.quantity,
            format_amount(line.subtotal)
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "## Coverage summary");
    let _ = writeln!(out);
    for recap in &summary.coverage {
        let _ = writeln!(out, "- {recap}");
    }
    let _ = writeln!(out);
    let _ = write!(out, "**Total: {}**", format_amount(summary.total));
    out
}

fn render_html(summary: &CartSummary) -> String {
    let items: String = summary
        .lines
        .iter()
        .map(|line| {
            format!(
                r#"    <div style="margin-bottom: 10px; padding: 10px; border-bottom: 1px solid #eee;">
      <div style="font-weight: bold;">{name}</div>
      <div style="color: #666;"><i>Presentation: {presentation}</i> - Active ingredient: {ingredient}</div>
      <div style="color: #2089dc; margin-top: 5px;">Coverage: {coverage}</div>
      <div style="margin-top: 5px;">Quantity: {quantity} x {unit} = {subtotal}</div>
    </div>
"#,
                name = escape_html(&line.name),
                presentation = escape_html(&line.presentation),
                ingredient = escape_html(&line.active_ingredient),
                coverage = escape_html(&line.coverage),
                quantity = line.quantity,
                unit = format_amount(line.unit_price),
                subtotal = format_amount(line.subtotal),
            )
        })
        .collect();

    let coverage: String = summary
        .coverage
        .iter()
        .map(|recap| format!("      <div style=\"margin-left: 20px; color: #666;\">{}</div>\n", escape_html(recap)))
        .collect();

    format!(
        r#"<html>
  <body style="padding: 20px; font-family: sans-serif;">
    <h1 style="text-align: center; color: #2089dc;">Medication quote</h1>
    <div style="text-align: right; color: #666; margin-bottom: 20px;">Date: {date}</div>
{items}    <div style="margin-top: 20px; text-align: right;">
      <div style="font-size: 16px; color: #2089dc; margin-bottom: 10px;">Coverage summary:</div>
{coverage}      <div style="font-size: 18px; font-weight: bold;">Total: {total}</div>
    </div>
  </body>
</html>
"#,
        date = summary.generated.format("%d/%m/%Y"),
        total = format_amount(summary.total),
    )
}

fn markdown_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
