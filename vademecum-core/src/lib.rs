//! Vademecum core library
//!
//! Medication catalog sync, search and priced quotes for the PAMI price list.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod query;
pub mod sync;

mod text;

pub use catalog::{CatalogEntry, CatalogStore};
pub use error::{CatalogError, Result};
