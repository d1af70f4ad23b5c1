//! Query engine - filter and sort catalog entries
//!
//! `run_query` is a pure function of the entries and a `QuerySpec`. It
//! recomputes the full result on every call, borrows the entries instead of
//! copying them, and never reorders its input. Identical inputs always give
//! the same output order.

use std::cmp::Ordering;

use crate::catalog::CatalogEntry;
use crate::text::fold;

mod spec;

pub use spec::{QuerySpec, SearchField, SortKey};

/// Filter and sort `entries` according to `spec`
///
/// A blank term yields no results: nothing is listed until the user types
/// something.
pub fn run_query<'a>(entries: &'a [CatalogEntry], spec: &QuerySpec) -> Vec<&'a CatalogEntry> {
    let term = spec.term.trim();
    if term.is_empty() {
        return Vec::new();
    }

    let needle = term.to_lowercase();
    let manufacturer = spec.manufacturer.as_deref();

    let mut results: Vec<&CatalogEntry> = entries
        .iter()
        .filter(|entry| {
            let haystack = match spec.search_field {
                SearchField::Name => &entry.display_name,
                SearchField::ActiveIngredient => &entry.active_ingredient,
            };
            haystack.to_lowercase().contains(&needle)
        })
        .filter(|entry| manufacturer.map_or(true, |m| entry.manufacturer == m))
        .filter(|entry| spec.price_min.map_or(true, |min| entry.list_price >= min))
        .filter(|entry| spec.price_max.map_or(true, |max| entry.list_price <= max))
        .collect();

    sort_entries(&mut results, spec.sort);

    tracing::trace!(
        term = term,
        sort = %spec.sort,
        matched = results.len(),
        "Query evaluated"
    );

    results
}

/// Stable sort of already filtered results
pub fn sort_entries(results: &mut [&CatalogEntry], sort: SortKey) {
    results.sort_by(|a, b| {
        let ordering = compare_by(a, b, sort);
        if sort.is_descending() {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn compare_by(a: &CatalogEntry, b: &CatalogEntry, sort: SortKey) -> Ordering {
    match sort {
        SortKey::NameAsc | SortKey::NameDesc => compare_text(&a.display_name, &b.display_name),
        SortKey::IngredientAsc | SortKey::IngredientDesc => {
            compare_text(&a.active_ingredient, &b.active_ingredient)
        }
        SortKey::ManufacturerAsc | SortKey::ManufacturerDesc => {
            compare_text(&a.manufacturer, &b.manufacturer)
        }
        SortKey::PriceAsc | SortKey::PriceDesc => a.list_price.cmp(&b.list_price),
    }
}

/// Locale-style text comparison for Spanish product data
///
/// Primary order ignores case and accents; ties are broken by the
/// lowercase accented form, then by the raw string, so the order is total.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    fold(a)
        .cmp(&fold(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        // lowercase before uppercase
        .then_with(|| b.cmp(a))
}
