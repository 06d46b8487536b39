//! Field record store
//!
//! Holds the persisted records as last loaded, the search term with its
//! filtered view, and the single active [`CaptureSession`].
//!
//! # Save pipeline
//! validate → persist assets → build record → upsert → clear capture → reload
//!
//! Nothing local changes until the upsert succeeds. Once it has, the capture
//! is gone even if the reload then fails: the record exists remotely.

use crate::capture::{CaptureSession, TranscriptionApplied, TranscriptionOutcome, TranscriptionRequest};
use crate::models::FieldRecord;
use crate::remote::{FieldRecordSource, RecordNotification};
use crate::uploader::{persist_assets, UploadError};
use chrono::Utc;
use safeapp_common::{normalize, Error, Result};
use std::sync::Arc;

/// Failure of one save stage
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("cannot save: {0}")]
    Validation(Error),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("record upsert failed: {0}")]
    Upsert(Error),

    #[error("record saved but reload failed: {0}")]
    Reload(Error),
}

pub struct RecordStore {
    source: Arc<dyn FieldRecordSource>,
    records: Vec<FieldRecord>,
    term: String,
    /// Indices into `records` matching `term`
    visible: Vec<usize>,
    active: Option<CaptureSession>,
    recipient: String,
}

impl RecordStore {
    pub fn new(source: Arc<dyn FieldRecordSource>, recipient: impl Into<String>) -> Self {
        Self {
            source,
            records: Vec::new(),
            term: String::new(),
            visible: Vec::new(),
            active: None,
            recipient: recipient.into(),
        }
    }

    /// Replace the cache with the remote records
    pub async fn load(&mut self) -> Result<()> {
        let raw = self.source.list_field_records().await?;
        self.records = FieldRecord::from_rows(normalize(raw));
        self.refresh_visible();
        tracing::info!(records = self.records.len(), "Field records loaded");
        Ok(())
    }

    pub fn records(&self) -> &[FieldRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&FieldRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Set the search term and return the matching records
    pub fn search(&mut self, term: &str) -> Vec<&FieldRecord> {
        self.term = term.to_string();
        self.refresh_visible();
        self.visible()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Records matching the current term, in cache order
    pub fn visible(&self) -> Vec<&FieldRecord> {
        self.visible.iter().map(|&i| &self.records[i]).collect()
    }

    fn refresh_visible(&mut self) {
        self.visible = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.matches(&self.term))
            .map(|(i, _)| i)
            .collect();
    }

    /// Start a fresh capture, replacing any open one
    pub fn open_new(&mut self) -> &mut CaptureSession {
        self.replace_active(CaptureSession::new())
    }

    /// Start editing a loaded record
    pub fn open_for_edit(&mut self, id: &str) -> Result<&mut CaptureSession> {
        let record = self
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("field record {}", id)))?;
        let session = CaptureSession::for_record(record);
        Ok(self.replace_active(session))
    }

    fn replace_active(&mut self, session: CaptureSession) -> &mut CaptureSession {
        if let Some(previous) = self.active.take() {
            tracing::debug!(session = %previous.id(), "Discarding open capture");
        }
        tracing::debug!(session = %session.id(), editing = ?session.record_id(), "Capture opened");
        self.active.insert(session)
    }

    pub fn active(&self) -> Option<&CaptureSession> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut CaptureSession> {
        self.active.as_mut()
    }

    /// Close the capture without saving; releases its microphone if recording
    pub fn discard_active(&mut self) -> Option<CaptureSession> {
        self.active.take()
    }

    /// Detach a transcription job for the active capture
    pub fn request_transcription(&mut self) -> Result<TranscriptionRequest> {
        self.active
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no capture is open".to_string()))?
            .request_transcription()
    }

    /// Route a finished transcription to the capture that asked for it
    pub fn apply_transcription(&mut self, outcome: TranscriptionOutcome) -> TranscriptionApplied {
        match self.active.as_mut() {
            Some(session) => session.apply_transcription(outcome),
            None => {
                tracing::info!(requested_by = %outcome.session, "Discarding transcription: no open capture");
                TranscriptionApplied::Discarded
            }
        }
    }

    /// Persist the active capture and return the saved record
    pub async fn save(&mut self) -> std::result::Result<FieldRecord, SaveError> {
        let session = self
            .active
            .as_ref()
            .ok_or_else(|| SaveError::Validation(Error::InvalidState("no capture is open".to_string())))?;

        session.validate().map_err(SaveError::Validation)?;

        let photos = persist_assets(session, self.source.as_ref()).await?;
        let record = session.build_record(photos, Utc::now());

        self.source
            .upsert_field_record(&record)
            .await
            .map_err(SaveError::Upsert)?;
        tracing::info!(
            record_id = %record.id,
            photos = record.photos.len(),
            "Field record saved"
        );

        self.active = None;
        self.load().await.map_err(SaveError::Reload)?;
        Ok(record)
    }

    /// Delete a record remotely then reload. Without confirmation nothing is
    /// sent and `Ok(false)` is returned.
    pub async fn delete(&mut self, id: &str, confirmed: bool) -> Result<bool> {
        if !confirmed {
            tracing::debug!(record_id = %id, "Delete not confirmed");
            return Ok(false);
        }

        self.source.delete_field_record(id).await?;
        tracing::info!(record_id = %id, "Field record deleted");

        if self.active.as_ref().and_then(CaptureSession::record_id) == Some(id) {
            self.active = None;
        }
        self.load().await?;
        Ok(true)
    }

    /// Send a persisted record to the configured recipient
    pub async fn notify(&self, record: &FieldRecord) -> Result<()> {
        let notification = RecordNotification::for_record(record, &self.recipient);
        self.source.send_notification(&notification).await?;
        tracing::info!(record_id = %record.id, to = %self.recipient, "Notification sent");
        Ok(())
    }
}
