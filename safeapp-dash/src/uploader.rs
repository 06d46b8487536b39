//! Sequential asset persistence for a capture
//!
//! Photos are uploaded one at a time in display order so that the reference
//! list comes back in the same order. The first failure stops the sequence.
//! Assets uploaded before it stay on the remote side; there is no delete
//! operation for them, so their references travel in [`UploadError`].

use crate::capture::{CaptureSession, PhotoAttachment};
use crate::remote::{AssetUpload, FieldRecordSource};
use safeapp_common::Error;

/// Upload failure at a 1-based photo position
#[derive(Debug, thiserror::Error)]
#[error("photo {position} upload failed: {source}")]
pub struct UploadError {
    pub position: usize,
    /// References uploaded by this run before the failure
    pub uploaded: Vec<String>,
    pub source: Error,
}

/// Resolve every photo of `session` to a remote reference, uploading pending
/// ones in order.
pub async fn persist_assets(
    session: &CaptureSession,
    source: &dyn FieldRecordSource,
) -> Result<Vec<String>, UploadError> {
    let mut references = Vec::with_capacity(session.photos().len());
    let mut uploaded = Vec::new();

    for (index, photo) in session.photos().iter().enumerate() {
        match photo {
            PhotoAttachment::Persisted { reference } => references.push(reference.clone()),
            PhotoAttachment::Pending(pending) => {
                let asset = AssetUpload {
                    marque: session.marque.trim(),
                    modele: session.modele.trim(),
                    file_name: &pending.file_name,
                    mime_type: &pending.mime_type,
                    bytes: &pending.bytes,
                };

                match source.upload_asset(&asset).await {
                    Ok(reference) => {
                        tracing::debug!(position = index + 1, reference = %reference, "Photo uploaded");
                        uploaded.push(reference.clone());
                        references.push(reference);
                    }
                    Err(e) => {
                        if !uploaded.is_empty() {
                            tracing::warn!(
                                session = %session.id(),
                                orphaned = ?uploaded,
                                "Upload aborted; earlier assets remain on the remote side"
                            );
                        }
                        return Err(UploadError {
                            position: index + 1,
                            uploaded,
                            source: e,
                        });
                    }
                }
            }
        }
    }

    tracing::info!(
        session = %session.id(),
        photos = references.len(),
        uploaded = uploaded.len(),
        "Assets persisted"
    );
    Ok(references)
}
