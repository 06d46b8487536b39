//! Workflow-automation webhook client
//!
//! One method per webhook. Responses are returned raw (list operations) or
//! reduced to the single value the caller needs (asset reference,
//! transcription text) after normalization.

use crate::models::{FieldRecord, RowId, Task};
use crate::remote::{
    AssetUpload, CalendarSource, FieldRecordSource, RecordNotification, StockSource, TaskSource,
    Transcriber,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Method;
use safeapp_common::config::DashConfig;
use safeapp_common::{normalize, Error, Result};
use serde_json::{json, Value};

const USER_AGENT: &str = concat!("safeapp-dash/", env!("CARGO_PKG_VERSION"));

/// HTTP client for every remote operation the dashboard uses
pub struct WebhookClient {
    http_client: reqwest::Client,
    config: DashConfig,
}

impl WebhookClient {
    pub fn new(config: DashConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;

        tracing::info!(base_url = %config.base_url, "Webhook client initialized");

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &DashConfig {
        &self.config
    }

    /// Call a webhook and parse its body. No retry: every call is at-least-once
    /// from the caller's point of view.
    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.config.webhook_url(path);
        tracing::debug!(method = %method, url = %url, "Calling webhook");

        let mut request = self.http_client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::unreachable(path, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(endpoint = %path, status = status.as_u16(), "Webhook returned an error");
            return Err(Error::status(path, status.as_u16(), error_text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::unreachable(path, e))?;
        Ok(parse_body(&text))
    }

    async fn get(&self, path: &str) -> Result<Value> {
        self.call(Method::GET, path, None).await
    }

    async fn send(&self, method: Method, path: &str, body: Value) -> Result<Value> {
        self.call(method, path, Some(body)).await
    }
}

/// Webhooks sometimes answer with an empty body or plain text
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// First non-empty value among `keys` in the first canonical row; a bare
/// string row is the value itself.
fn first_field(raw: Value, keys: &[&str]) -> Option<String> {
    let row = normalize(raw).into_iter().next()?;
    let value = match row {
        Value::String(s) => Some(s),
        Value::Object(map) => keys.iter().find_map(|key| match map.get(*key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }),
        _ => None,
    };
    value.filter(|s| !s.trim().is_empty())
}

#[async_trait]
impl TaskSource for WebhookClient {
    async fn list_tasks(&self) -> Result<Value> {
        self.get(&self.config.webhooks.list_tasks).await
    }

    async fn create_task(&self, list_id: &str, title: &str) -> Result<()> {
        self.send(
            Method::POST,
            &self.config.webhooks.create_task,
            json!({ "listId": list_id, "title": title }),
        )
        .await?;
        Ok(())
    }

    async fn update_task(&self, list_id: &str, task: &Task) -> Result<()> {
        let mut body = serde_json::to_value(task)
            .map_err(|e| Error::Decode(format!("task {}: {}", task.id, e)))?;
        if let Value::Object(map) = &mut body {
            map.insert("listId".to_string(), json!(list_id));
            map.insert("taskId".to_string(), json!(task.id));
        }
        self.send(Method::PUT, &self.config.webhooks.update_task, body)
            .await?;
        Ok(())
    }

    async fn delete_task(&self, list_id: &str, task_id: &str) -> Result<()> {
        self.send(
            Method::DELETE,
            &self.config.webhooks.delete_task,
            json!({ "listId": list_id, "taskId": task_id }),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CalendarSource for WebhookClient {
    async fn list_calendar_events(&self) -> Result<Value> {
        self.get(&self.config.webhooks.list_calendar).await
    }
}

#[async_trait]
impl StockSource for WebhookClient {
    async fn list_stock(&self) -> Result<Value> {
        self.get(&self.config.webhooks.list_stock).await
    }

    async fn update_stock_row(&self, row_id: &RowId, quantity: u32) -> Result<()> {
        self.send(
            Method::POST,
            &self.config.webhooks.update_stock,
            json!({ "rowId": row_id.to_json(), "quantite": quantity }),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl FieldRecordSource for WebhookClient {
    async fn list_field_records(&self) -> Result<Value> {
        self.get(&self.config.webhooks.list_fiches).await
    }

    async fn upload_asset(&self, asset: &AssetUpload<'_>) -> Result<String> {
        let path = &self.config.webhooks.upload_asset;
        let raw = self
            .send(
                Method::POST,
                path,
                json!({
                    "marque": asset.marque,
                    "modele": asset.modele,
                    "fileName": asset.file_name,
                    "mimeType": asset.mime_type,
                    "data": STANDARD.encode(asset.bytes),
                }),
            )
            .await?;

        first_field(raw, &["reference", "url", "webViewLink", "id"])
            .ok_or_else(|| Error::Decode(format!("{} returned no asset reference", path)))
    }

    async fn upsert_field_record(&self, record: &FieldRecord) -> Result<()> {
        let body = serde_json::to_value(record)
            .map_err(|e| Error::Decode(format!("field record {}: {}", record.id, e)))?;
        self.send(Method::POST, &self.config.webhooks.upsert_fiche, body)
            .await?;
        Ok(())
    }

    async fn delete_field_record(&self, id: &str) -> Result<()> {
        self.send(
            Method::DELETE,
            &self.config.webhooks.delete_fiche,
            json!({ "id": id }),
        )
        .await?;
        Ok(())
    }

    async fn send_notification(&self, notification: &RecordNotification) -> Result<()> {
        let body = serde_json::to_value(notification)
            .map_err(|e| Error::Decode(format!("notification: {}", e)))?;
        self.send(Method::POST, &self.config.webhooks.notify, body)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Transcriber for WebhookClient {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String> {
        let path = &self.config.webhooks.transcribe;
        let raw = self
            .send(
                Method::POST,
                path,
                json!({ "mimeType": mime_type, "data": STANDARD.encode(audio) }),
            )
            .await?;

        first_field(raw, &["text", "transcription", "transcript"])
            .ok_or_else(|| Error::Decode(format!("{} returned no text", path)))
    }
}
