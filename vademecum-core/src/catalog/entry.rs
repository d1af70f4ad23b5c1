//! Catalog entries
//!
//! One `CatalogEntry` per product row of the medication list. The
//! `catalog_code` ("alfabeta" code) is the identity of a product everywhere
//! in the system.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// A single product of the medication catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Commercial name
    #[serde(default)]
    pub display_name: String,

    /// Active ingredient (generic drug name)
    #[serde(default)]
    pub active_ingredient: String,

    /// Presentation (dosage form and pack size)
    #[serde(default)]
    pub presentation: String,

    /// Laboratory that manufactures the product
    #[serde(default)]
    pub manufacturer: String,

    /// Public list price
    #[serde(default)]
    pub list_price: Decimal,

    /// Free-text coverage label, may be empty
    #[serde(default)]
    pub coverage_plan: String,

    /// Amount actually charged to the affiliate
    #[serde(default)]
    pub affiliate_copay: Decimal,

    /// Alfabeta code, the unique product key
    #[serde(default)]
    pub catalog_code: String,
}

impl CatalogEntry {
    /// Whether the entry carries a coverage label
    pub fn has_coverage(&self) -> bool {
        !self.coverage_plan.trim().is_empty()
    }

    /// One-line label for lists: "NAME (PRESENTATION)"
    pub fn label(&self) -> String {
        if self.presentation.is_empty() {
            self.display_name.clone()
        } else {
            format!("{} ({})", self.display_name, self.presentation)
        }
    }
}

/// Check that a loaded entry list is usable as a catalog
///
/// The list must be non-empty and no price may be negative.
pub fn validate_entries(entries: &[CatalogEntry]) -> Result<()> {
    if entries.is_empty() {
        return Err(CatalogError::InvalidDataset {
            reason: "the catalog contains no products".to_string(),
        });
    }

    if let Some(bad) = entries
        .iter()
        .find(|e| e.list_price.is_sign_negative() || e.affiliate_copay.is_sign_negative())
    {
        return Err(CatalogError::InvalidDataset {
            reason: format!(
                "product '{}' ({}) has a negative price",
                bad.display_name, bad.catalog_code
            ),
        });
    }

    Ok(())
}
