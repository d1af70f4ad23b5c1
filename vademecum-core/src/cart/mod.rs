//! Cart aggregation model
//!
//! Lines are keyed by alfabeta code and kept in insertion order. Each line
//! freezes a copy of the product and its unit price when it is first added;
//! later catalog refreshes never reprice an existing line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;

mod summary;

pub use summary::{CartSummary, SummaryLine, NO_COVERAGE};

/// Which price of a product is charged for a cart line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceBasis {
    /// Public list price
    #[default]
    ListPrice,
    /// Amount charged to the affiliate
    AffiliateCopay,
}

impl PriceBasis {
    /// The price of `entry` under this basis
    pub fn price_of(self, entry: &CatalogEntry) -> Decimal {
        match self {
            PriceBasis::ListPrice => entry.list_price,
            PriceBasis::AffiliateCopay => entry.affiliate_copay,
        }
    }
}

/// One product held in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product as it was when first added
    pub product: CatalogEntry,
    /// Unit price frozen at insertion
    pub unit_price: Decimal,
    /// Price field the unit price was taken from
    pub price_basis: PriceBasis,
    /// Always at least one
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price × quantity`
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Alfabeta code of the product
    pub fn code(&self) -> &str {
        &self.product.catalog_code
    }
}

/// Products selected for a quote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
    #[serde(default)]
    default_basis: PriceBasis,
}

impl Cart {
    /// Empty cart pricing new lines with `default_basis`
    pub fn new(default_basis: PriceBasis) -> Self {
        Self {
            lines: Vec::new(),
            default_basis,
        }
    }

    /// Add one unit of `entry`, priced with the cart's default basis
    pub fn add(&mut self, entry: &CatalogEntry) {
        self.add_with_basis(entry, self.default_basis);
    }

    /// Add one unit of `entry`
    ///
    /// If the code is already in the cart its quantity goes up by one and the
    /// existing snapshot (product and price) is kept as is. `basis` only
    /// applies to a new line.
    pub fn add_with_basis(&mut self, entry: &CatalogEntry, basis: PriceBasis) {
        if let Some(line) = self.line_mut(&entry.catalog_code) {
            line.quantity = line.quantity.saturating_add(1);
            tracing::debug!(
                "Cart: {} now x{}",
                entry.catalog_code,
                line.quantity
            );
            return;
        }

        self.lines.push(CartLine {
            product: entry.clone(),
            unit_price: basis.price_of(entry),
            price_basis: basis,
            quantity: 1,
        });
        tracing::debug!("Cart: added {}", entry.catalog_code);
    }

    /// Remove the line for `code`; returns whether one was removed
    pub fn remove(&mut self, code: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.code() != code);
        self.lines.len() != before
    }

    /// Set the quantity for `code` exactly
    ///
    /// Zero or less removes the line. Unknown codes are ignored. Returns
    /// whether the cart changed.
    pub fn set_quantity(&mut self, code: &str, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove(code);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.line_mut(code) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove every line
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of every line's subtotal
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Lines in insertion order
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `code`, if any
    pub fn get(&self, code: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.code() == code)
    }

    /// Number of distinct products
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of units across all lines
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Basis used by `add`
    pub fn default_basis(&self) -> PriceBasis {
        self.default_basis
    }

    fn line_mut(&mut self, code: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.code() == code)
    }
}
