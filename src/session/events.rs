//! Events emitted by a transcription session toward the UI collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A state transition notification.
///
/// Exactly one is emitted per session state transition; consumers must
/// treat the latest received status as authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    /// A session started and the engine is capturing audio.
    Listening,
    /// A session ended because the user toggled it off.
    Stopped,
    /// A session ended because the engine exited on its own after
    /// having produced output.
    Ready,
    /// A session failed: launch error, missing configuration, or an
    /// engine that died before producing any output.
    Error { reason: String },
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::Listening => write!(f, "Listening"),
            StatusEvent::Stopped => write!(f, "Stopped"),
            StatusEvent::Ready => write!(f, "Ready"),
            StatusEvent::Error { reason } => write!(f, "Error: {}", reason),
        }
    }
}

/// One filtered, user-visible line of recognized speech.
///
/// `text` is non-empty, trimmed, and classified as real transcription by
/// the line filter. Events from one session preserve the order in which
/// the engine emitted the underlying lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub text: String,
    /// Milliseconds since the Unix epoch at the time the line was accepted.
    pub timestamp_ms: u64,
}

impl TranscriptEvent {
    /// Creates an event stamped with the current wall-clock time.
    pub fn now(text: String) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self { text, timestamp_ms }
    }
}
