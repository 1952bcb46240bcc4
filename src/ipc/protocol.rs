//! JSON message protocol for IPC communication between CLI and daemon.

use crate::session::events::{StatusEvent, TranscriptEvent};
use serde::{Deserialize, Serialize};

/// Commands sent by CLI to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Toggle the transcription session on/off
    Toggle,
    /// Get daemon status
    Status,
    /// Shutdown the daemon
    Shutdown,
    /// Subscribe to the live event stream
    Follow,
}

impl Command {
    /// Serialize command to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize command from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Responses sent by daemon to CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Command succeeded
    Ok,
    /// Command was dropped because a transition is already in flight
    Ignored,
    /// Current daemon status
    Status { state: String, device: String },
    /// Error occurred
    Error { message: String },
}

impl Response {
    /// Serialize response to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize response from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Events streamed to `follow` subscribers after the initial response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DaemonEvent {
    /// Session state changed
    Status { status: StatusEvent },
    /// A transcript line passed the filter
    Transcript { event: TranscriptEvent },
}

impl DaemonEvent {
    /// Serialize event to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize event from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_all_variants_roundtrip() {
        let commands = vec![
            Command::Toggle,
            Command::Status,
            Command::Shutdown,
            Command::Follow,
        ];

        for cmd in commands {
            let json = cmd.to_json().expect("should serialize");
            let deserialized = Command::from_json(&json).expect("should deserialize");
            assert_eq!(cmd, deserialized, "roundtrip failed for {:?}", cmd);
        }
    }

    #[test]
    fn test_command_json_format_examples() {
        assert_eq!(Command::Toggle.to_json().unwrap(), r#"{"type":"toggle"}"#);
        assert_eq!(Command::Status.to_json().unwrap(), r#"{"type":"status"}"#);
        assert_eq!(Command::Follow.to_json().unwrap(), r#"{"type":"follow"}"#);
    }

    #[test]
    fn test_response_status_json_roundtrip() {
        let resp = Response::Status {
            state: "listening".to_string(),
            device: "Microphone Array (Realtek Audio)".to_string(),
        };
        let json = resp.to_json().expect("should serialize");
        let deserialized = Response::from_json(&json).expect("should deserialize");
        assert_eq!(resp, deserialized);
        assert!(json.contains("\"type\":\"status\""));
        assert!(json.contains("\"state\":\"listening\""));
    }

    #[test]
    fn test_response_ignored_json_format() {
        assert_eq!(Response::Ignored.to_json().unwrap(), r#"{"type":"ignored"}"#);
    }

    #[test]
    fn test_response_error_json_roundtrip() {
        let resp = Response::Error {
            message: "Recognition model not found at /x".to_string(),
        };
        let json = resp.to_json().expect("should serialize");
        let deserialized = Response::from_json(&json).expect("should deserialize");
        assert_eq!(resp, deserialized);
        assert!(json.contains("\"type\":\"error\""));
    }

    #[test]
    fn test_daemon_event_status_roundtrip() {
        let event = DaemonEvent::Status {
            status: StatusEvent::Listening,
        };
        let json = event.to_json().expect("should serialize");
        let deserialized = DaemonEvent::from_json(&json).expect("should deserialize");
        assert_eq!(event, deserialized);
        assert!(json.contains("\"type\":\"status\""));
    }

    #[test]
    fn test_daemon_event_transcript_roundtrip() {
        let event = DaemonEvent::Transcript {
            event: TranscriptEvent {
                text: "Hello world".to_string(),
                timestamp_ms: 1_700_000_000_000,
            },
        };
        let json = event.to_json().expect("should serialize");
        let deserialized = DaemonEvent::from_json(&json).expect("should deserialize");
        assert_eq!(event, deserialized);
        assert!(json.contains("\"text\":\"Hello world\""));
    }

    #[test]
    fn test_invalid_json_returns_error() {
        assert!(Command::from_json(r#"{"type": "unknown_command"}"#).is_err());
        assert!(Command::from_json(r#"{"invalid": "json"}"#).is_err());
        assert!(Command::from_json("not json at all").is_err());
    }
}
