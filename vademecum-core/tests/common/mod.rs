//! Shared helpers for vademecum-core integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_xlsxwriter::Workbook;
use vademecum_core::sync::RemoteSource;
use vademecum_core::{CatalogError, Result};

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

pub const HEADER: [&str; 8] = [
    "MARCA COMERCIAL",
    "PRINCIPIO ACTIVO",
    "PRESENTACION",
    "LABORATORIO",
    "PVP PAMI AL 03/03/2025",
    "COBERTURA",
    "IMPORTE AFILIADO",
    "ALFABETA",
];

/// One data row: name, ingredient, presentation, manufacturer, price,
/// coverage, copay, code
pub type Product<'a> = (&'a str, &'a str, &'a str, &'a str, f64, &'a str, f64, &'a str);

/// Build an xlsx payload with a title row, a blank row, the header and `products`
pub fn workbook_bytes(products: &[Product<'_>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    sheet.write_string(0, 0, "LISTADO DE MEDICAMENTOS PAMI").unwrap();
    for (col, name) in HEADER.iter().enumerate() {
        sheet.write_string(2, col as u16, *name).unwrap();
    }

    for (i, product) in products.iter().enumerate() {
        let row = 3 + i as u32;
        let (name, ingredient, presentation, manufacturer, price, coverage, copay, code) =
            *product;
        sheet.write_string(row, 0, name).unwrap();
        sheet.write_string(row, 1, ingredient).unwrap();
        sheet.write_string(row, 2, presentation).unwrap();
        sheet.write_string(row, 3, manufacturer).unwrap();
        sheet.write_number(row, 4, price).unwrap();
        if !coverage.is_empty() {
            sheet.write_string(row, 5, coverage).unwrap();
        }
        sheet.write_number(row, 6, copay).unwrap();
        sheet.write_string(row, 7, code).unwrap();
    }

    workbook.save_to_buffer().unwrap()
}

/// The list as first published
pub fn march_list() -> Vec<u8> {
    workbook_bytes(&[
        ("IBUPIRAC", "ibuprofeno", "400 mg x 20", "Pfizer", 1234.56, "50%", 617.28, "11111"),
        ("BAYASPIRINA", "ácido acetilsalicílico", "500 mg x 10", "Bayer", 450.0, "", 450.0, "22222"),
    ])
}

/// A later revision with a new product and a new price
pub fn april_list() -> Vec<u8> {
    workbook_bytes(&[
        ("IBUPIRAC", "ibuprofeno", "400 mg x 20", "Pfizer", 1300.0, "50%", 650.0, "11111"),
        ("BAYASPIRINA", "ácido acetilsalicílico", "500 mg x 10", "Bayer", 480.0, "", 480.0, "22222"),
        ("LOSACOR", "losartán", "50 mg x 30", "Roemmers", 2100.0, "100%", 0.0, "33333"),
    ])
}

pub fn published_at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, month, day, 9, 0, 0).unwrap()
}

/// In-memory `RemoteSource` that counts downloads
pub struct FakeSource {
    timestamp: Option<DateTime<Utc>>,
    payload: Vec<u8>,
    fail_download: bool,
    delay: Duration,
    downloads: AtomicUsize,
}

impl FakeSource {
    pub fn new(timestamp: Option<DateTime<Utc>>, payload: Vec<u8>) -> Self {
        Self {
            timestamp,
            payload,
            fail_download: false,
            delay: Duration::ZERO,
            downloads: AtomicUsize::new(0),
        }
    }

    /// A source whose metadata answers but whose download always fails
    pub fn failing(timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            fail_download: true,
            ..Self::new(timestamp, Vec::new())
        }
    }

    /// Make every download take `delay` before it answers
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for FakeSource {
    async fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.timestamp)
    }

    async fn download(&self) -> Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        // Let a concurrent caller run while this one is mid-download
        tokio::task::yield_now().await;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.fail_download {
            return Err(CatalogError::Network {
                resource: self.describe().to_string(),
                source: "connection reset by peer".into(),
            });
        }
        Ok(self.payload.clone())
    }

    fn describe(&self) -> &str {
        "fake://medicamentos.xlsx"
    }
}
