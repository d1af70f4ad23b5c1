//! Dataset ingestion
//!
//! Turns a spreadsheet (xlsx, xls, ods) or a JSON snapshot into typed
//! `CatalogEntry` values. Column names vary between revisions of the
//! published list, so headers are normalised and matched against a set of
//! known aliases before any cell is read.
//!
//! Individual cells never fail: unreadable text becomes an empty string and
//! unreadable prices become zero. Only a file that cannot be read as a whole
//! (no worksheet, no header row, no data rows) is an error.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use super::CatalogEntry;
use crate::error::{CatalogError, Result};
use crate::text::fold_char;

/// Rows scanned when looking for the header row
const HEADER_SCAN_ROWS: usize = 10;

/// Minimum recognised columns for a row to count as the header
const MIN_HEADER_COLUMNS: usize = 2;

/// A spreadsheet cell, reduced to what ingestion cares about
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
}

impl RawCell {
    fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            RawCell::Number(_) => false,
        }
    }
}

impl From<&Data> for RawCell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => RawCell::Empty,
            Data::String(s) => RawCell::Text(s.clone()),
            Data::Float(f) => RawCell::Number(*f),
            Data::Int(i) => RawCell::Number(*i as f64),
            Data::Error(_) => RawCell::Empty,
            other => RawCell::Text(other.to_string()),
        }
    }
}

/// The fixed `CatalogEntry` field a column feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    DisplayName,
    ActiveIngredient,
    Presentation,
    Manufacturer,
    ListPrice,
    CoveragePlan,
    AffiliateCopay,
    CatalogCode,
}

impl Field {
    const ALL: [Field; 8] = [
        Field::DisplayName,
        Field::ActiveIngredient,
        Field::Presentation,
        Field::Manufacturer,
        Field::ListPrice,
        Field::CoveragePlan,
        Field::AffiliateCopay,
        Field::CatalogCode,
    ];

    /// Normalised header names that map exactly onto this field
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::DisplayName => &[
                "MARCACOMERCIAL",
                "NOMBRECOMERCIAL",
                "NOMBRE",
                "MARCA",
                "DISPLAYNAME",
            ],
            Field::ActiveIngredient => &[
                "PRINCIPIOACTIVO",
                "DROGA",
                "MONODROGA",
                "ACTIVEINGREDIENT",
            ],
            Field::Presentation => &["PRESENTACION", "PRESENTATION"],
            Field::Manufacturer => &["LABORATORIO", "MANUFACTURER"],
            Field::ListPrice => &["PRECIO", "PVP", "LISTPRICE"],
            Field::CoveragePlan => &["COBERTURA", "COVERAGEPLAN"],
            Field::AffiliateCopay => &["IMPORTEAFILIADO", "ACARGOAFILIADO", "AFFILIATECOPAY"],
            Field::CatalogCode => &[
                "ALFABETA",
                "CODIGOALFABETA",
                "CODALFABETA",
                "CATALOGCODE",
            ],
        }
    }

    /// Resolve a raw header cell to a field
    ///
    /// Exact aliases win; dated price headers such as
    /// `PVP PAMI AL 03/03/2025` are caught by prefix afterwards.
    pub fn from_header(header: &str) -> Option<Field> {
        let key = normalize_header(header);
        if key.is_empty() {
            return None;
        }

        Field::ALL
            .into_iter()
            .find(|field| field.aliases().contains(&key.as_str()))
            .or_else(|| {
                (key.starts_with("PVP") || key.starts_with("PRECIO")).then_some(Field::ListPrice)
            })
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Uppercase, fold accents and keep only ASCII alphanumerics
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .map(fold_char)
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Which column (if any) feeds each field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: [Option<usize>; 8],
}

impl ColumnMap {
    /// Build the map from a header row; the first column for a field wins
    pub fn from_header_row(row: &[RawCell]) -> Self {
        let mut map = ColumnMap::default();
        for (idx, cell) in row.iter().enumerate() {
            let Some(field) = header_text(cell).as_deref().and_then(Field::from_header) else {
                continue;
            };
            let slot = &mut map.columns[field.index()];
            if slot.is_none() {
                *slot = Some(idx);
            }
        }
        map
    }

    /// Number of fields with a source column
    pub fn recognised(&self) -> usize {
        self.columns.iter().filter(|c| c.is_some()).count()
    }

    /// Column index feeding `field`
    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns[field.index()]
    }

    fn cell<'a>(&self, row: &'a [RawCell], field: Field) -> Option<&'a RawCell> {
        self.column(field).and_then(|idx| row.get(idx))
    }

    /// Coerce one data row into a typed entry
    pub fn entry_from_row(&self, row: &[RawCell]) -> CatalogEntry {
        let text = |field: Field| self.cell(row, field).map(coerce_text).unwrap_or_default();
        let price = |field: Field| self.cell(row, field).map(parse_price).unwrap_or_default();

        CatalogEntry {
            display_name: text(Field::DisplayName),
            active_ingredient: text(Field::ActiveIngredient),
            presentation: text(Field::Presentation),
            manufacturer: text(Field::Manufacturer),
            list_price: price(Field::ListPrice),
            coverage_plan: text(Field::CoveragePlan),
            affiliate_copay: price(Field::AffiliateCopay),
            catalog_code: text(Field::CatalogCode),
        }
    }
}

fn header_text(cell: &RawCell) -> Option<String> {
    match cell {
        RawCell::Text(s) => Some(s.clone()),
        _ => None,
    }
}

/// Text value of a cell, trimmed; numbers keep their shortest form
pub fn coerce_text(cell: &RawCell) -> String {
    match cell {
        RawCell::Empty => String::new(),
        RawCell::Text(s) => s.trim().to_string(),
        RawCell::Number(n) if n.is_finite() => n.to_string(),
        RawCell::Number(_) => String::new(),
    }
}

/// Price value of a cell, rounded to cents; zero when unreadable or negative
pub fn parse_price(cell: &RawCell) -> Decimal {
    let value = match cell {
        RawCell::Empty => None,
        RawCell::Text(s) => parse_price_text(s),
        RawCell::Number(n) => Decimal::from_f64(*n),
    };

    match value {
        Some(v) if !v.is_sign_negative() => v.round_dp(2),
        _ => Decimal::ZERO,
    }
}

/// Parse a currency-formatted price such as `$1.234,56` or `1,234.56`
///
/// Everything but digits, separators and the minus sign is dropped. When both separators
/// appear, the right-most one is the decimal point. A lone comma is a
/// decimal comma; repeated commas or dots are thousands separators.
pub fn parse_price_text(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() == 1 => cleaned.replace(',', "."),
        (Some(_), None) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

/// Parse sheet rows (header row included) into entries
pub fn parse_rows<I>(rows: I, origin: &str) -> Result<Vec<CatalogEntry>>
where
    I: IntoIterator<Item = Vec<RawCell>>,
{
    let mut rows = rows.into_iter();

    let mut columns = None;
    for _ in 0..HEADER_SCAN_ROWS {
        let Some(row) = rows.next() else { break };
        let candidate = ColumnMap::from_header_row(&row);
        if candidate.recognised() >= MIN_HEADER_COLUMNS {
            columns = Some(candidate);
            break;
        }
    }

    let columns = columns.ok_or_else(|| {
        CatalogError::parse(origin, "no header row with recognised column names")
    })?;

    tracing::debug!(
        "Header for {} maps {} of {} fields",
        origin,
        columns.recognised(),
        Field::ALL.len()
    );

    let entries: Vec<CatalogEntry> = rows
        .filter(|row| !row.iter().all(RawCell::is_blank))
        .map(|row| columns.entry_from_row(&row))
        .collect();

    if entries.is_empty() {
        return Err(CatalogError::parse(origin, "the sheet has no data rows"));
    }

    Ok(entries)
}

/// Parse a spreadsheet payload; only the first worksheet is read
pub fn parse_workbook(bytes: &[u8], origin: &str) -> Result<Vec<CatalogEntry>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| CatalogError::parse(origin, format!("not a readable spreadsheet ({e})")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CatalogError::parse(origin, "the workbook has no worksheet"))?
        .map_err(|e| CatalogError::parse(origin, format!("unreadable worksheet ({e})")))?;

    let entries = parse_rows(
        range
            .rows()
            .map(|row| row.iter().map(RawCell::from).collect::<Vec<_>>()),
        origin,
    )?;

    tracing::debug!("Parsed {} entries from {}", entries.len(), origin);
    Ok(entries)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Decode a JSON snapshot with the same rules as a spreadsheet: at least one
/// product, and negative prices read as zero
fn parse_snapshot(bytes: &[u8], path: &Path) -> Result<Vec<CatalogEntry>> {
    let mut entries: Vec<CatalogEntry> =
        serde_json::from_slice(bytes).map_err(|source| CatalogError::Snapshot {
            path: path.to_path_buf(),
            source,
        })?;

    if entries.is_empty() {
        return Err(CatalogError::parse(
            path.display().to_string(),
            "the snapshot has no products",
        ));
    }

    for entry in &mut entries {
        for price in [&mut entry.list_price, &mut entry.affiliate_copay] {
            if price.is_sign_negative() {
                *price = Decimal::ZERO;
            }
        }
    }

    Ok(entries)
}

/// Load a dataset file: a JSON snapshot by extension, a spreadsheet otherwise
pub async fn load_dataset_file(path: &Path) -> Result<Vec<CatalogEntry>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CatalogError::io(path, e))?;

    if is_json(path) {
        return parse_snapshot(&bytes, path);
    }

    parse_workbook(&bytes, &path.display().to_string())
}

/// Write entries as a pretty-printed JSON snapshot
pub async fn write_snapshot(path: &Path, entries: &[CatalogEntry]) -> Result<()> {
    let content = serde_json::to_vec_pretty(entries).map_err(|source| CatalogError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CatalogError::io(parent, e))?;
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|e| CatalogError::io(path, e))
}
