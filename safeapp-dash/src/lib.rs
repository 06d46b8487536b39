//! safeapp-dash library interface
//!
//! Dashboard core for the SafeApp back office: tasks, calendar, inventory
//! with inline quantity edits, and field records (fiches) with photo and
//! voice capture. Every remote interaction goes through the webhook traits
//! in [`remote`]; [`client::WebhookClient`] is the HTTP implementation.

pub mod capture;
pub mod client;
pub mod models;
pub mod panels;
pub mod records;
pub mod remote;
pub mod stock;
pub mod uploader;

pub use client::WebhookClient;
pub use records::{RecordStore, SaveError};
pub use stock::{EditState, StockBoard, StockEditSession};
pub use uploader::{persist_assets, UploadError};
