//! Transcription session lifecycle.

pub mod controller;
pub mod events;

pub use controller::{SessionController, SessionState, ToggleOutcome};
pub use events::{StatusEvent, TranscriptEvent};
