//! Tests across the catalog pipeline: rows to store to query to cart

use std::str::FromStr;

use rust_decimal::Decimal;

use super::ingest::{parse_rows, RawCell};
use super::{validate_entries, CatalogStore};
use crate::cart::{Cart, CartSummary, PriceBasis};
use crate::query::{run_query, QuerySpec, SearchField, SortKey};

fn row(cells: &[&str]) -> Vec<RawCell> {
    cells
        .iter()
        .map(|c| {
            if c.is_empty() {
                RawCell::Empty
            } else {
                RawCell::Text(c.to_string())
            }
        })
        .collect()
}

/// A sheet shaped like the published list: a title, a blank row, then data
fn published_sheet() -> Vec<Vec<RawCell>> {
    vec![
        row(&["LISTADO DE PRECIOS PAMI"]),
        row(&[]),
        row(&[
            "MARCA COMERCIAL",
            "PRINCIPIO ACTIVO",
            "PRESENTACIÓN",
            "LABORATORIO",
            "PVP PAMI AL 03/03/2025",
            "COBERTURA",
            "IMPORTE AFILIADO",
            "ALFABETA",
        ]),
        row(&[
            "IBUPIRAC",
            "ibuprofeno",
            "400 mg x 20",
            "Pfizer",
            "$1.234,56",
            "50%",
            "617,28",
            "11111",
        ]),
        row(&["", "", "", "", "", "", "", ""]),
        row(&[
            "BAYASPIRINA",
            "ácido acetilsalicílico",
            "500 mg x 10",
            "Bayer",
            "450",
            "",
            "450",
            "22222",
        ]),
        row(&[
            "LOSACOR",
            "losartán",
            "50 mg x 30",
            "Roemmers",
            "2.100,00",
            "100%",
            "0",
            "33333",
        ]),
    ]
}

fn store() -> CatalogStore {
    let entries = parse_rows(published_sheet(), "published.xlsx").unwrap();
    validate_entries(&entries).unwrap();
    CatalogStore::new(entries)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn test_published_sheet_ingests_every_data_row() {
    let store = store();

    assert_eq!(store.len(), 3);
    let ibupirac = store.find_by_code("11111").unwrap();
    assert_eq!(ibupirac.list_price, dec("1234.56"));
    assert_eq!(ibupirac.affiliate_copay, dec("617.28"));
    assert_eq!(ibupirac.presentation, "400 mg x 20");
    assert!(!store.find_by_code("22222").unwrap().has_coverage());
}

#[test]
fn test_search_then_quote() {
    let store = store();

    let spec = QuerySpec::new("o")
        .search_by(SearchField::ActiveIngredient)
        .sort_by(SortKey::PriceDesc);
    let results = run_query(&store, &spec);
    let codes: Vec<&str> = results.iter().map(|e| e.catalog_code.as_str()).collect();
    assert_eq!(codes, vec!["33333", "11111", "22222"]);

    let mut cart = Cart::new(PriceBasis::ListPrice);
    cart.add(results[1]);
    cart.add(results[1]);
    cart.add(results[2]);

    let summary = CartSummary::from_cart(&cart, chrono::NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
    assert_eq!(summary.total, dec("2919.12"));
    assert_eq!(summary.lines[1].coverage, crate::cart::NO_COVERAGE);
}

#[test]
fn test_manufacturer_picker_feeds_filter() {
    let store = store();

    let manufacturers = store.manufacturers();
    assert_eq!(manufacturers, vec!["Bayer", "Pfizer", "Roemmers"]);

    let spec = QuerySpec::new("a").manufacturer(manufacturers[0]);
    let results = run_query(&store, &spec);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].display_name, "BAYASPIRINA");
}
