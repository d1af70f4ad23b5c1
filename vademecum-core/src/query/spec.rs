//! Query specification types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which text field the search term is matched against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchField {
    /// Commercial name
    #[default]
    Name,
    /// Active ingredient
    #[serde(alias = "ingredient")]
    ActiveIngredient,
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SearchField::Name),
            "ingredient" | "active-ingredient" => Ok(SearchField::ActiveIngredient),
            other => Err(format!(
                "Unknown search field '{other}' (expected 'name' or 'ingredient')"
            )),
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchField::Name => f.write_str("name"),
            SearchField::ActiveIngredient => f.write_str("ingredient"),
        }
    }
}

/// Sort order of query results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    NameAsc,
    NameDesc,
    IngredientAsc,
    IngredientDesc,
    ManufacturerAsc,
    ManufacturerDesc,
    PriceAsc,
    PriceDesc,
}

impl SortKey {
    /// Every sort option, in picker order
    pub const ALL: [SortKey; 8] = [
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::IngredientAsc,
        SortKey::IngredientDesc,
        SortKey::ManufacturerAsc,
        SortKey::ManufacturerDesc,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
    ];

    /// Stable identifier, as accepted by `FromStr`
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::NameAsc => "name-asc",
            SortKey::NameDesc => "name-desc",
            SortKey::IngredientAsc => "ingredient-asc",
            SortKey::IngredientDesc => "ingredient-desc",
            SortKey::ManufacturerAsc => "manufacturer-asc",
            SortKey::ManufacturerDesc => "manufacturer-desc",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            SortKey::NameAsc => "Name (A-Z)",
            SortKey::NameDesc => "Name (Z-A)",
            SortKey::IngredientAsc => "Active ingredient (A-Z)",
            SortKey::IngredientDesc => "Active ingredient (Z-A)",
            SortKey::ManufacturerAsc => "Manufacturer (A-Z)",
            SortKey::ManufacturerDesc => "Manufacturer (Z-A)",
            SortKey::PriceAsc => "Price (lowest first)",
            SortKey::PriceDesc => "Price (highest first)",
        }
    }

    pub(crate) fn is_descending(self) -> bool {
        matches!(
            self,
            SortKey::NameDesc
                | SortKey::IngredientDesc
                | SortKey::ManufacturerDesc
                | SortKey::PriceDesc
        )
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = SortKey::ALL.iter().map(|k| k.as_str()).collect();
                format!("Unknown sort key '{s}' (expected one of: {})", valid.join(", "))
            })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the query engine needs besides the entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    /// Free-text term; nothing matches while it is blank
    pub term: String,

    /// Field the term is matched against
    #[serde(default)]
    pub search_field: SearchField,

    /// Exact manufacturer name
    #[serde(default)]
    pub manufacturer: Option<String>,

    /// Inclusive lower bound on list price
    #[serde(default)]
    pub price_min: Option<Decimal>,

    /// Inclusive upper bound on list price
    #[serde(default)]
    pub price_max: Option<Decimal>,

    /// Result order
    #[serde(default)]
    pub sort: SortKey,
}

impl QuerySpec {
    /// Search by name with no filters, sorted by name
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    pub fn search_by(mut self, field: SearchField) -> Self {
        self.search_field = field;
        self
    }

    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn price_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    pub fn sort_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }
}
