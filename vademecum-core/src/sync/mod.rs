//! Dataset synchronisation
//!
//! A `SyncManager` compares the remote `Last-Modified` timestamp with the
//! local file's modification time, downloads and installs a new copy when
//! the remote one is newer, and serves the parsed catalog from memory.

mod manager;
mod source;
mod state;

pub use manager::{needs_refresh, DatasetInfo, SyncManager, SyncOutcome};
pub use source::{parse_http_date, HttpSource, RemoteSource};
pub use state::SyncState;
