//! Remote operations consumed by the dashboard
//!
//! Each trait groups the webhooks one panel talks to. List operations hand
//! back the raw payload; callers run it through [`safeapp_common::normalize`]
//! so that shape detection happens in exactly one place.
//!
//! [`crate::client::WebhookClient`] implements all of them over HTTP; tests
//! implement them in memory.

use crate::models::{FieldRecord, RowId, Task};
use async_trait::async_trait;
use safeapp_common::Result;
use serde::Serialize;
use serde_json::Value;

/// Task list and calendar webhooks
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn list_tasks(&self) -> Result<Value>;

    async fn create_task(&self, list_id: &str, title: &str) -> Result<()>;

    async fn update_task(&self, list_id: &str, task: &Task) -> Result<()>;

    async fn delete_task(&self, list_id: &str, task_id: &str) -> Result<()>;
}

#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn list_calendar_events(&self) -> Result<Value>;
}

/// Inventory webhooks
#[async_trait]
pub trait StockSource: Send + Sync {
    async fn list_stock(&self) -> Result<Value>;

    /// Set the remaining quantity of one row
    async fn update_stock_row(&self, row_id: &RowId, quantity: u32) -> Result<()>;
}

/// Field-record webhooks
#[async_trait]
pub trait FieldRecordSource: Send + Sync {
    async fn list_field_records(&self) -> Result<Value>;

    /// Upload one asset and return its remote reference
    async fn upload_asset(&self, asset: &AssetUpload<'_>) -> Result<String>;

    async fn upsert_field_record(&self, record: &FieldRecord) -> Result<()>;

    async fn delete_field_record(&self, id: &str) -> Result<()>;

    async fn send_notification(&self, notification: &RecordNotification) -> Result<()>;
}

/// Speech-to-text collaborator
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String>;
}

/// One asset upload, tagged with the record it belongs to
#[derive(Debug, Clone, Copy)]
pub struct AssetUpload<'a> {
    pub marque: &'a str,
    pub modele: &'a str,
    pub file_name: &'a str,
    pub mime_type: &'a str,
    pub bytes: &'a [u8],
}

/// Notification dispatched for a persisted record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordNotification {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub fiche: FieldRecord,
}

impl RecordNotification {
    pub fn for_record(record: &FieldRecord, recipient: &str) -> Self {
        let or_none = |s: &str| {
            if s.trim().is_empty() {
                "Aucune".to_string()
            } else {
                escape_html(s)
            }
        };
        let html = format!(
            "<h2>Prise de Côte - {marque} {modele}</h2>\
             <h3>Cotes</h3><pre>{cotes}</pre>\
             <h3>Notes</h3><p>{notes}</p>\
             <h3>Photos ({count})</h3>{photos}",
            marque = escape_html(&record.marque),
            modele = escape_html(&record.modele),
            cotes = or_none(&record.cotes),
            notes = or_none(&record.notes),
            count = record.photos.len(),
            photos = if record.photos.is_empty() {
                "<p>Aucune photo</p>".to_string()
            } else {
                record
                    .photos
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("<p>Photo {}: {}</p>", i + 1, escape_html(p)))
                    .collect::<String>()
            },
        );

        RecordNotification {
            to: recipient.to_string(),
            subject: format!("Prise de Côte - {} {}", record.marque, record.modele),
            html,
            fiche: record.clone(),
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
