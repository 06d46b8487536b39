//! Field record capture
//!
//! A [`CaptureSession`] is the record being composed: text fields, photos,
//! one voice note and its transcription. It is either fresh or seeded from
//! a persisted [`FieldRecord`] for editing, and owns its attachments until
//! they are persisted.
//!
//! Transcription runs detached from the session. The request carries the
//! session's [`SessionId`]; the outcome is applied only to the session that
//! asked for it.

mod photo;
mod recording;

pub use photo::{decode_preview, PendingPhoto, PhotoAttachment, PhotoFile};
pub use recording::{AudioAttachment, Microphone, MicrophoneStream, RecordedAudio};

use crate::models::FieldRecord;
use crate::remote::Transcriber;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use recording::ActiveRecording;
use safeapp_common::{Error, Result};
use std::fmt;
use tokio::sync::watch;
use uuid::Uuid;

/// Identity of one capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The persisted record a session edits
#[derive(Debug, Clone, PartialEq)]
struct EditOrigin {
    id: String,
    created_at: DateTime<Utc>,
}

/// Transcription job detached from its session
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    session: SessionId,
    audio: Vec<u8>,
    mime_type: String,
}

/// Finished transcription, still tagged with the requesting session
#[derive(Debug)]
pub struct TranscriptionOutcome {
    pub session: SessionId,
    pub result: Result<String>,
}

/// What happened to a transcription outcome
#[derive(Debug)]
pub enum TranscriptionApplied {
    /// Text appended to `cotes`
    Appended,
    /// Transcription failed; `cotes` untouched
    Failed(Error),
    /// The requesting session is no longer active
    Discarded,
}

impl TranscriptionRequest {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub async fn run(self, transcriber: &dyn Transcriber) -> TranscriptionOutcome {
        tracing::debug!(session = %self.session, bytes = self.audio.len(), "Requesting transcription");
        let result = transcriber.transcribe(&self.audio, &self.mime_type).await;
        TranscriptionOutcome {
            session: self.session,
            result,
        }
    }
}

/// One field record being composed
pub struct CaptureSession {
    id: SessionId,
    origin: Option<EditOrigin>,
    pub marque: String,
    pub modele: String,
    pub cotes: String,
    pub notes: String,
    photos: Vec<PhotoAttachment>,
    audio: Option<AudioAttachment>,
    recording: Option<ActiveRecording>,
    transcription_pending: bool,
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("marque", &self.marque)
            .field("modele", &self.modele)
            .field("photos", &self.photos.len())
            .field("audio", &self.audio.is_some())
            .field("recording", &self.recording.is_some())
            .field("transcription_pending", &self.transcription_pending)
            .finish()
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    /// Fresh, empty capture
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            origin: None,
            marque: String::new(),
            modele: String::new(),
            cotes: String::new(),
            notes: String::new(),
            photos: Vec::new(),
            audio: None,
            recording: None,
            transcription_pending: false,
        }
    }

    /// Capture seeded from a persisted record; its photos are already remote
    pub fn for_record(record: &FieldRecord) -> Self {
        Self {
            origin: Some(EditOrigin {
                id: record.id.clone(),
                created_at: record.created_at,
            }),
            marque: record.marque.clone(),
            modele: record.modele.clone(),
            cotes: record.cotes.clone(),
            notes: record.notes.clone(),
            photos: record
                .photos
                .iter()
                .map(|reference| PhotoAttachment::Persisted {
                    reference: reference.clone(),
                })
                .collect(),
            ..Self::new()
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Id of the record being edited, None for a new record
    pub fn record_id(&self) -> Option<&str> {
        self.origin.as_ref().map(|o| o.id.as_str())
    }

    pub fn photos(&self) -> &[PhotoAttachment] {
        &self.photos
    }

    pub fn audio(&self) -> Option<&AudioAttachment> {
        self.audio.as_ref()
    }

    pub fn transcription_pending(&self) -> bool {
        self.transcription_pending
    }

    /// Decode previews and append the files as pending photos, in input
    /// order. Files whose preview cannot be built are skipped.
    pub async fn add_photos(&mut self, files: Vec<PhotoFile>) -> usize {
        let decoded = join_all(files.into_iter().map(decode_preview)).await;

        let mut added = 0;
        for result in decoded {
            match result {
                Ok(photo) => {
                    self.photos.push(PhotoAttachment::Pending(photo));
                    added += 1;
                }
                Err(e) => tracing::warn!(session = %self.id, error = %e, "Photo skipped"),
            }
        }
        added
    }

    /// Remove the photo at `index`; later photos shift down
    pub fn remove_photo(&mut self, index: usize) -> Result<PhotoAttachment> {
        if index >= self.photos.len() {
            return Err(Error::NotFound(format!(
                "photo {} (capture has {})",
                index,
                self.photos.len()
            )));
        }
        Ok(self.photos.remove(index))
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Seconds elapsed in the current recording, advancing at 1 Hz
    pub fn recording_elapsed_secs(&self) -> Option<u64> {
        self.recording.as_ref().map(ActiveRecording::elapsed_secs)
    }

    /// Watch the elapsed-seconds counter of the current recording
    pub fn subscribe_elapsed(&self) -> Option<watch::Receiver<u64>> {
        self.recording.as_ref().map(ActiveRecording::subscribe)
    }

    /// Acquire the microphone and start recording. A refused microphone
    /// leaves the session untouched.
    pub async fn start_recording(&mut self, microphone: &dyn Microphone) -> Result<()> {
        if self.recording.is_some() {
            return Err(Error::InvalidState("already recording".to_string()));
        }

        let stream = microphone.open().await.map_err(|e| {
            tracing::warn!(session = %self.id, error = %e, "Microphone unavailable");
            e
        })?;

        self.recording = Some(ActiveRecording::start(stream));
        tracing::info!(session = %self.id, "Recording started");
        Ok(())
    }

    /// Stop recording and keep the result as the session's only voice note.
    /// No-op when not recording.
    pub fn stop_recording(&mut self) -> Option<&AudioAttachment> {
        let recording = self.recording.take()?;
        let audio = recording.finish();
        tracing::info!(
            session = %self.id,
            bytes = audio.bytes.len(),
            duration_ms = audio.duration.as_millis() as u64,
            "Recording stopped"
        );
        if self.audio.replace(audio).is_some() {
            tracing::debug!(session = %self.id, "Previous voice note replaced");
        }
        self.audio.as_ref()
    }

    /// Detach a transcription job for the current voice note
    pub fn request_transcription(&mut self) -> Result<TranscriptionRequest> {
        let audio = self
            .audio
            .as_ref()
            .ok_or_else(|| Error::Validation("no voice note to transcribe".to_string()))?;

        self.transcription_pending = true;
        Ok(TranscriptionRequest {
            session: self.id,
            audio: audio.bytes.clone(),
            mime_type: audio.mime_type.clone(),
        })
    }

    /// Apply a finished transcription if it was requested by this session
    pub fn apply_transcription(&mut self, outcome: TranscriptionOutcome) -> TranscriptionApplied {
        if outcome.session != self.id {
            tracing::info!(
                requested_by = %outcome.session,
                active = %self.id,
                "Discarding transcription for an inactive capture"
            );
            return TranscriptionApplied::Discarded;
        }

        self.transcription_pending = false;
        match outcome.result {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    if !self.cotes.is_empty() {
                        self.cotes.push('\n');
                    }
                    self.cotes.push_str(text);
                }
                TranscriptionApplied::Appended
            }
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "Transcription failed");
                TranscriptionApplied::Failed(e)
            }
        }
    }

    /// Marque and modele must both be non-blank before persistence
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [("marque", &self.marque), ("modele", &self.modele)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(format!("{} required", missing.join(" and "))))
        }
    }

    /// Record to upsert: identity and creation time are kept when editing
    pub(crate) fn build_record(&self, photos: Vec<String>, now: DateTime<Utc>) -> FieldRecord {
        let (id, created_at) = match &self.origin {
            Some(origin) => (origin.id.clone(), origin.created_at),
            None => (Uuid::new_v4().to_string(), now),
        };

        FieldRecord {
            id,
            marque: self.marque.trim().to_string(),
            modele: self.modele.trim().to_string(),
            photos,
            cotes: self.cotes.clone(),
            notes: self.notes.clone(),
            created_at,
            updated_at: now,
        }
    }
}
