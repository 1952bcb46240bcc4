//! Command handler implementation for the daemon.

use crate::ipc::protocol::{Command, Response};
use crate::ipc::server::CommandHandler;
use crate::session::{SessionController, ToggleOutcome};
use std::sync::Arc;
use tokio::sync::Notify;

/// Command handler for daemon IPC commands.
pub struct DaemonCommandHandler {
    controller: Arc<SessionController>,
    shutdown: Arc<Notify>,
}

impl DaemonCommandHandler {
    /// Creates a new command handler.
    pub fn new(controller: Arc<SessionController>, shutdown: Arc<Notify>) -> Self {
        Self {
            controller,
            shutdown,
        }
    }

    /// Toggle the transcription session on/off.
    async fn toggle_session(&self) -> Response {
        // Toggling spawns or signals a subprocess; keep it off the
        // async runtime threads.
        let controller = Arc::clone(&self.controller);
        let outcome = tokio::task::spawn_blocking(move || controller.toggle()).await;

        match outcome {
            Ok(ToggleOutcome::Started) | Ok(ToggleOutcome::Stopping) => Response::Ok,
            Ok(ToggleOutcome::Ignored) => Response::Ignored,
            Ok(ToggleOutcome::Failed(message)) => Response::Error { message },
            Err(e) => Response::Error {
                message: format!("Toggle task failed: {}", e),
            },
        }
    }

    /// Get daemon status.
    fn get_status(&self) -> Response {
        Response::Status {
            state: self.controller.state().as_str().to_string(),
            device: self.controller.device_name().to_string(),
        }
    }

    /// Shut the daemon down, stopping any running session first.
    fn shutdown_daemon(&self) -> Response {
        self.controller.stop_if_listening();
        self.shutdown.notify_one();
        Response::Ok
    }
}

#[async_trait::async_trait]
impl CommandHandler for DaemonCommandHandler {
    async fn handle(&self, command: Command) -> Response {
        match command {
            Command::Toggle => self.toggle_session().await,
            Command::Status => self.get_status(),
            Command::Shutdown => self.shutdown_daemon(),
            // The server keeps the connection open and streams events;
            // only the acknowledgement comes from here.
            Command::Follow => Response::Ok,
        }
    }
}
