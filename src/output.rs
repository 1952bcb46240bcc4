//! Shared event rendering for terminal output.
//! Used by `overscribe follow` and daemon verbose mode.

use crate::ipc::protocol::DaemonEvent;
use crate::session::events::StatusEvent;

const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Render a daemon event.
///
/// Transcript lines go to stdout so `follow` pipes cleanly into other
/// tools; status lines go to stderr.
pub fn render_event(event: &DaemonEvent) {
    match event {
        DaemonEvent::Status { status } => {
            let color = status_color(status);
            eprintln!("{DIM}[{color}{status}{RESET}{DIM}]{RESET}");
        }
        DaemonEvent::Transcript { event } => {
            println!("{}", event.text);
        }
    }
}

fn status_color(status: &StatusEvent) -> &'static str {
    match status {
        StatusEvent::Listening => GREEN,
        StatusEvent::Stopped => DIM,
        StatusEvent::Ready => YELLOW,
        StatusEvent::Error { .. } => RED,
    }
}
