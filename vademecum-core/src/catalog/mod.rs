//! Vademecum Catalog - medication entries and dataset ingestion
//!
//! This module provides the product record, the in-memory store that
//! holds the loaded list, and the ingestion path that turns the published
//! spreadsheet (or a bundled JSON snapshot) into typed entries.
//!
//! # Architecture
//!
//! ```text
//! Remote dataset (datos.gob.ar, xlsx)     Bundled snapshot (json)
//!     │                                        │
//!     ▼                                        │
//! <data dir>/medicamentos/medicamentos.xlsx    │
//!     │                                        │
//!     └──────────────► ingest ◄────────────────┘
//!                        │
//!                        ▼
//!                   CatalogStore ──► query / cart
//! ```

mod entry;
pub mod ingest;
mod store;

pub use entry::{validate_entries, CatalogEntry};
pub use store::CatalogStore;

#[cfg(test)]
mod tests;
