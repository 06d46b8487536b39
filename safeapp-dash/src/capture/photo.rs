//! Photo attachments and preview decoding

use base64::{engine::general_purpose::STANDARD, Engine as _};
use safeapp_common::{Error, Result};

const FALLBACK_MIME: &str = "application/octet-stream";

/// A file picked for attachment
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PhotoFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A photo held locally, not yet uploaded
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPhoto {
    pub file_name: String,
    pub mime_type: String,
    /// `data:` URL for display
    pub preview: String,
    pub bytes: Vec<u8>,
}

/// Photo on a capture: local until persisted
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoAttachment {
    Pending(PendingPhoto),
    Persisted { reference: String },
}

impl PhotoAttachment {
    pub fn is_pending(&self) -> bool {
        matches!(self, PhotoAttachment::Pending(_))
    }
}

/// Build the displayable preview for one file off the async executor
pub async fn decode_preview(file: PhotoFile) -> Result<PendingPhoto> {
    let name = file.name.clone();
    tokio::task::spawn_blocking(move || {
        let mime_type = infer::get(&file.bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or(FALLBACK_MIME)
            .to_string();
        let preview = format!("data:{};base64,{}", mime_type, STANDARD.encode(&file.bytes));
        PendingPhoto {
            file_name: file.name,
            mime_type,
            preview,
            bytes: file.bytes,
        }
    })
    .await
    .map_err(|e| Error::Decode(format!("preview for {}: {}", name, e)))
}
