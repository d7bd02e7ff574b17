pub mod dispatch;
pub mod error;
pub mod listing;
pub mod plugin;
pub mod plugins;
pub mod scan;
pub mod session;
pub mod types;
pub mod web;

pub use dispatch::{PluginRegistry, PluginSet};
pub use error::ScrapeError;
pub use listing::write_listing;
pub use plugin::MetadataPlugin;
pub use scan::{ScanEvent, ScanLog, ScanLogEntry, ScanSummary, scan_all};
pub use session::{SESSION_CALL_BUDGET, SessionApi, SessionClient, SessionToken};
pub use web::PageFetcher;
