//! Priced summary of a cart, ready for rendering

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{Cart, CartLine, PriceBasis};

/// Coverage label for products without a coverage plan
pub const NO_COVERAGE: &str = "No coverage";

/// One row of the exported quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryLine {
    pub code: String,
    pub name: String,
    pub presentation: String,
    pub active_ingredient: String,
    pub coverage: String,
    pub unit_price: Decimal,
    pub price_basis: PriceBasis,
    pub quantity: u32,
    pub subtotal: Decimal,
}

impl From<&CartLine> for SummaryLine {
    fn from(line: &CartLine) -> Self {
        let product = &line.product;
        let coverage = if product.has_coverage() {
            product.coverage_plan.clone()
        } else {
            NO_COVERAGE.to_string()
        };

        Self {
            code: product.catalog_code.clone(),
            name: product.display_name.clone(),
            presentation: product.presentation.clone(),
            active_ingredient: product.active_ingredient.clone(),
            coverage,
            unit_price: line.unit_price,
            price_basis: line.price_basis,
            quantity: line.quantity,
            subtotal: line.subtotal(),
        }
    }
}

/// Everything a renderer needs to produce the quote document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub generated: NaiveDate,
    pub lines: Vec<SummaryLine>,
    pub coverage: Vec<String>,
    pub item_count: u64,
    pub total: Decimal,
}

impl CartSummary {
    pub fn from_cart(cart: &Cart, generated: NaiveDate) -> Self {
        let lines: Vec<SummaryLine> = cart.lines().iter().map(SummaryLine::from).collect();
        // "NAME (presentation): coverage" per line
        let coverage = cart
            .lines()
            .iter()
            .zip(&lines)
            .map(|(line, row)| format!("{}: {}", line.product.label(), row.coverage))
            .collect();

        Self {
            generated,
            lines,
            coverage,
            item_count: cart.item_count(),
            total: cart.total(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn entry(code: &str, name: &str, coverage: &str, price: &str) -> CatalogEntry {
        CatalogEntry {
            display_name: name.to_string(),
            active_ingredient: "losartán".to_string(),
            presentation: "50 mg x 30".to_string(),
            manufacturer: "Gador".to_string(),
            list_price: Decimal::from_str(price).unwrap(),
            coverage_plan: coverage.to_string(),
            affiliate_copay: Decimal::ZERO,
            catalog_code: code.to_string(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    #[test]
    fn test_summary_lines_and_total() {
        let mut cart = Cart::default();
        let a = entry("1", "LOSACOR", "100%", "2500.50");
        cart.add(&a);
        cart.add(&a);
        cart.add(&entry("2", "CORUS", "", "1000"));

        let summary = CartSummary::from_cart(&cart, date());

        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.lines[0].subtotal, Decimal::from_str("5001.00").unwrap());
        assert_eq!(summary.lines[1].coverage, NO_COVERAGE);
        assert_eq!(summary.total, Decimal::from_str("6001.00").unwrap());
        assert_eq!(summary.item_count, 3);
        assert_eq!(
            summary.coverage,
            vec![
                "LOSACOR (50 mg x 30): 100%".to_string(),
                "CORUS (50 mg x 30): No coverage".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_cart_summary() {
        let summary = CartSummary::from_cart(&Cart::default(), date());
        assert!(summary.is_empty());
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let mut cart = Cart::default();
        cart.add(&entry("1", "LOSACOR", "40%", "10"));

        let json = serde_json::to_value(CartSummary::from_cart(&cart, date())).unwrap();
        assert_eq!(json["generated"], "2025-03-03");
        assert_eq!(json["itemCount"], 1);
        assert_eq!(json["lines"][0]["activeIngredient"], "losartán");
        assert_eq!(json["lines"][0]["priceBasis"], "list-price");
    }
}
