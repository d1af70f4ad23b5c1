//! Reading real spreadsheet and snapshot files

mod common;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::TempDir;
use vademecum_core::catalog::{ingest, validate_entries};
use vademecum_core::CatalogError;

use common::{init_test_logging, march_list, workbook_bytes};

#[test]
fn test_xlsx_with_title_rows_and_numeric_cells() {
    init_test_logging();
    let entries = ingest::parse_workbook(&march_list(), "march.xlsx").unwrap();

    assert_eq!(entries.len(), 2);
    let ibupirac = &entries[0];
    assert_eq!(ibupirac.display_name, "IBUPIRAC");
    assert_eq!(ibupirac.manufacturer, "Pfizer");
    assert_eq!(ibupirac.list_price, Decimal::from_str("1234.56").unwrap());
    assert_eq!(ibupirac.affiliate_copay, Decimal::from_str("617.28").unwrap());
    assert_eq!(ibupirac.catalog_code, "11111");

    // Missing coverage cell reads as empty
    assert_eq!(entries[1].coverage_plan, "");
    validate_entries(&entries).unwrap();
}

#[test]
fn test_header_only_workbook_is_rejected() {
    init_test_logging();
    let err = ingest::parse_workbook(&workbook_bytes(&[]), "empty.xlsx").unwrap_err();
    assert!(matches!(err, CatalogError::DatasetParse { .. }));
}

#[test]
fn test_non_spreadsheet_payload_is_rejected() {
    let err = ingest::parse_workbook(b"not a workbook", "garbage").unwrap_err();
    match err {
        CatalogError::DatasetParse { origin, .. } => assert_eq!(origin, "garbage"),
        other => panic!("expected DatasetParse, got {other:?}"),
    }
}

#[tokio::test]
async fn test_load_dataset_file_by_extension() {
    init_test_logging();
    let dir = TempDir::new().unwrap();

    let xlsx = dir.path().join("list.xlsx");
    std::fs::write(&xlsx, march_list()).unwrap();
    let from_xlsx = ingest::load_dataset_file(&xlsx).await.unwrap();

    let json = dir.path().join("out").join("list.json");
    ingest::write_snapshot(&json, &from_xlsx).await.unwrap();
    let from_json = ingest::load_dataset_file(&json).await.unwrap();

    assert_eq!(from_xlsx, from_json);
}

#[tokio::test]
async fn test_corrupt_snapshot_reports_path() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("broken.json");
    std::fs::write(&json, "[{\"displayName\": ").unwrap();

    let err = ingest::load_dataset_file(&json).await.unwrap_err();
    match err {
        CatalogError::Snapshot { path, .. } => assert_eq!(path, json),
        other => panic!("expected Snapshot, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_snapshot_is_rejected() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("empty.json");
    std::fs::write(&json, "[]").unwrap();

    let err = ingest::load_dataset_file(&json).await.unwrap_err();
    assert!(matches!(err, CatalogError::DatasetParse { .. }));
    assert!(err.to_string().contains("no products"));
}

#[tokio::test]
async fn test_snapshot_negative_prices_read_as_zero() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("bundled.json");
    std::fs::write(
        &json,
        r#"[{
            "displayName": "IBUPIRAC",
            "activeIngredient": "ibuprofeno",
            "presentation": "400 mg x 20",
            "manufacturer": "Pfizer",
            "listPrice": "-100",
            "coveragePlan": "50%",
            "affiliateCopay": "-50.5",
            "catalogCode": "11111"
        }]"#,
    )
    .unwrap();

    let entries = ingest::load_dataset_file(&json).await.unwrap();
    assert_eq!(entries[0].list_price, Decimal::ZERO);
    assert_eq!(entries[0].affiliate_copay, Decimal::ZERO);
    validate_entries(&entries).unwrap();
}
