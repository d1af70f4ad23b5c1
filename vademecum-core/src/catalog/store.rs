//! In-memory catalog store
//!
//! Holds the canonical entry list behind an `Arc`, so handing it to the
//! query engine or to several callers never copies the products.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use super::CatalogEntry;

/// The loaded medication catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    entries: Arc<Vec<CatalogEntry>>,
}

impl CatalogStore {
    /// Wrap a freshly loaded entry list
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// All entries, in dataset order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Look up a product by its alfabeta code
    ///
    /// If the dataset repeats a code, the last occurrence is returned.
    pub fn find_by_code(&self, code: &str) -> Option<&CatalogEntry> {
        let code = code.trim();
        self.entries.iter().rev().find(|e| e.catalog_code == code)
    }

    /// Index the entries by alfabeta code; later duplicates overwrite earlier ones
    pub fn index_by_code(&self) -> HashMap<&str, &CatalogEntry> {
        self.entries
            .iter()
            .map(|e| (e.catalog_code.as_str(), e))
            .collect()
    }

    /// Sorted, de-duplicated manufacturer names, for a filter picker
    pub fn manufacturers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .iter()
            .map(|e| e.manufacturer.as_str())
            .filter(|m| !m.is_empty())
            .collect();

        names.sort_by(|a, b| crate::query::compare_text(a, b));
        names.dedup();
        names
    }

    /// Number of products
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no products
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Deref for CatalogStore {
    type Target = [CatalogEntry];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl From<Vec<CatalogEntry>> for CatalogStore {
    fn from(entries: Vec<CatalogEntry>) -> Self {
        Self::new(entries)
    }
}
