//! Voice recording
//!
//! The microphone is reached through [`Microphone`]; an open
//! [`MicrophoneStream`] is the exclusive hold on the device and releases it
//! when finished or dropped.

use async_trait::async_trait;
use safeapp_common::Result;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Audio input device
#[async_trait]
pub trait Microphone: Send + Sync {
    /// Acquire the device. Fails with `Error::Permission` when access is denied.
    async fn open(&self) -> Result<Box<dyn MicrophoneStream>>;
}

/// An acquired, recording microphone
pub trait MicrophoneStream: Send {
    /// Stop recording, release the device and hand back the encoded audio
    fn finish(self: Box<Self>) -> RecordedAudio;
}

/// Encoded audio produced by a stream
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// The single voice note of a capture
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAttachment {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub duration: Duration,
}

/// Recording in progress: the stream plus a 1 Hz elapsed-seconds ticker
pub(crate) struct ActiveRecording {
    stream: Option<Box<dyn MicrophoneStream>>,
    elapsed: watch::Receiver<u64>,
    ticker: JoinHandle<()>,
    started: Instant,
}

impl ActiveRecording {
    pub(crate) fn start(stream: Box<dyn MicrophoneStream>) -> Self {
        let (tx, rx) = watch::channel(0u64);
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.is_closed() {
                    break;
                }
                tx.send_modify(|secs| *secs += 1);
            }
        });

        Self {
            stream: Some(stream),
            elapsed: rx,
            ticker,
            started: Instant::now(),
        }
    }

    pub(crate) fn elapsed_secs(&self) -> u64 {
        *self.elapsed.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.elapsed.clone()
    }

    /// Stop the ticker and release the microphone
    pub(crate) fn finish(mut self) -> AudioAttachment {
        self.ticker.abort();
        let duration = self.started.elapsed();
        let audio = self
            .stream
            .take()
            .map(|stream| stream.finish())
            .unwrap_or(RecordedAudio {
                bytes: Vec::new(),
                mime_type: String::new(),
            });

        AudioAttachment {
            bytes: audio.bytes,
            mime_type: audio.mime_type,
            duration,
        }
    }
}

impl Drop for ActiveRecording {
    fn drop(&mut self) {
        self.ticker.abort();
        // Dropping the stream releases the device
        self.stream.take();
    }
}
