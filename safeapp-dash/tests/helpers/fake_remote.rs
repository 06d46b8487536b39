//! In-memory remote
//!
//! Implements every webhook trait over plain vectors and logs each call so
//! tests can assert on order and count.

use async_trait::async_trait;
use safeapp_common::{Error, Result};
use safeapp_dash::capture::{Microphone, MicrophoneStream, RecordedAudio};
use safeapp_dash::models::{FieldRecord, RowId, Task};
use safeapp_dash::remote::{
    AssetUpload, CalendarSource, FieldRecordSource, RecordNotification, StockSource, TaskSource,
    Transcriber,
};
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    ListRecords,
    Upload { file_name: String, marque: String },
    Upsert(String),
    Delete(String),
    Notify(String),
    Transcribe(usize),
}

#[derive(Default)]
pub struct FakeRemote {
    pub records: Mutex<Vec<Value>>,
    pub tasks: Mutex<Vec<Value>>,
    pub events: Mutex<Vec<Value>>,
    pub stock: Mutex<Vec<Value>>,
    pub calls: Mutex<Vec<RemoteCall>>,
    /// 1-based upload call that fails
    pub fail_upload_at: Mutex<Option<usize>>,
    pub fail_stock: Mutex<bool>,
    pub transcript: Mutex<String>,
    uploads: Mutex<usize>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RemoteCall::Upload { file_name, .. } => Some(file_name),
                _ => None,
            })
            .collect()
    }

    fn log(&self, call: RemoteCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl FieldRecordSource for FakeRemote {
    async fn list_field_records(&self) -> Result<Value> {
        self.log(RemoteCall::ListRecords);
        // Same wrapper the workflow host uses for list responses
        let items: Vec<Value> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|r| json!({ "json": r }))
            .collect();
        Ok(json!({ "items": items }))
    }

    async fn upload_asset(&self, asset: &AssetUpload<'_>) -> Result<String> {
        self.log(RemoteCall::Upload {
            file_name: asset.file_name.to_string(),
            marque: asset.marque.to_string(),
        });
        let n = {
            let mut uploads = self.uploads.lock().unwrap();
            *uploads += 1;
            *uploads
        };
        if *self.fail_upload_at.lock().unwrap() == Some(n) {
            return Err(Error::status("safeapp-fiche-asset", 502, "upstream timeout"));
        }
        Ok(format!("https://drive.example/{}/{}", n, asset.file_name))
    }

    async fn upsert_field_record(&self, record: &FieldRecord) -> Result<()> {
        self.log(RemoteCall::Upsert(record.id.clone()));
        let value = serde_json::to_value(record).map_err(|e| Error::Decode(e.to_string()))?;
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r["id"] == json!(record.id)) {
            Some(existing) => *existing = value,
            None => records.push(value),
        }
        Ok(())
    }

    async fn delete_field_record(&self, id: &str) -> Result<()> {
        self.log(RemoteCall::Delete(id.to_string()));
        self.records.lock().unwrap().retain(|r| r["id"] != json!(id));
        Ok(())
    }

    async fn send_notification(&self, notification: &RecordNotification) -> Result<()> {
        self.log(RemoteCall::Notify(notification.fiche.id.clone()));
        Ok(())
    }
}

#[async_trait]
impl Transcriber for FakeRemote {
    async fn transcribe(&self, audio: &[u8], _mime_type: &str) -> Result<String> {
        self.log(RemoteCall::Transcribe(audio.len()));
        Ok(self.transcript.lock().unwrap().clone())
    }
}

#[async_trait]
impl TaskSource for FakeRemote {
    async fn list_tasks(&self) -> Result<Value> {
        Ok(json!({ "items": self.tasks.lock().unwrap().clone() }))
    }

    async fn create_task(&self, _list_id: &str, title: &str) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let id = format!("t{}", tasks.len() + 1);
        tasks.push(json!({ "id": id, "title": title, "status": "needsAction" }));
        Ok(())
    }

    async fn update_task(&self, _list_id: &str, task: &Task) -> Result<()> {
        let value = serde_json::to_value(task).map_err(|e| Error::Decode(e.to_string()))?;
        for existing in self.tasks.lock().unwrap().iter_mut() {
            if existing["id"] == json!(task.id) {
                *existing = value.clone();
            }
        }
        Ok(())
    }

    async fn delete_task(&self, _list_id: &str, task_id: &str) -> Result<()> {
        self.tasks.lock().unwrap().retain(|t| t["id"] != json!(task_id));
        Ok(())
    }
}

#[async_trait]
impl CalendarSource for FakeRemote {
    async fn list_calendar_events(&self) -> Result<Value> {
        // Indexed-object shape, as some calendar nodes return
        let events = self.events.lock().unwrap();
        let map: serde_json::Map<String, Value> = events
            .iter()
            .enumerate()
            .map(|(i, e)| (i.to_string(), e.clone()))
            .collect();
        Ok(Value::Object(map))
    }
}

#[async_trait]
impl StockSource for FakeRemote {
    async fn list_stock(&self) -> Result<Value> {
        if *self.fail_stock.lock().unwrap() {
            return Err(Error::unreachable("safeapp-stock", "connection refused"));
        }
        Ok(Value::Array(self.stock.lock().unwrap().clone()))
    }

    async fn update_stock_row(&self, row_id: &RowId, quantity: u32) -> Result<()> {
        for row in self.stock.lock().unwrap().iter_mut() {
            if row["row_number"] == row_id.to_json() {
                row["Quantité"] = json!(quantity);
            }
        }
        Ok(())
    }
}

/// Microphone that records a fixed clip
pub struct FakeMicrophone {
    pub clip: Vec<u8>,
}

struct FakeStream {
    clip: Vec<u8>,
}

impl MicrophoneStream for FakeStream {
    fn finish(self: Box<Self>) -> RecordedAudio {
        RecordedAudio {
            bytes: self.clip,
            mime_type: "audio/webm".to_string(),
        }
    }
}

#[async_trait]
impl Microphone for FakeMicrophone {
    async fn open(&self) -> Result<Box<dyn MicrophoneStream>> {
        Ok(Box::new(FakeStream {
            clip: self.clip.clone(),
        }))
    }
}
