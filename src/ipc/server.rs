//! Async Unix socket IPC server for daemon control.
//!
//! Request/response commands are one JSON line each way. A `follow`
//! subscription keeps the connection open after the response and streams
//! daemon events as JSON lines until the client disconnects.

use crate::error::{OverscribeError, Result};
use crate::ipc::protocol::{Command, DaemonEvent, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, broadcast};

/// Handler trait for processing IPC commands.
#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handle a command and return a response.
    async fn handle(&self, command: Command) -> Response;
}

/// State for managing server shutdown.
#[derive(Debug, Clone)]
struct ServerState {
    shutdown: Arc<Mutex<bool>>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            shutdown: Arc::new(Mutex::new(false)),
        }
    }

    async fn is_shutdown(&self) -> bool {
        *self.shutdown.lock().await
    }

    async fn set_shutdown(&self) {
        *self.shutdown.lock().await = true;
    }
}

/// IPC server for handling daemon control commands via Unix socket.
pub struct IpcServer {
    socket_path: PathBuf,
    state: ServerState,
}

impl IpcServer {
    /// Create a new IPC server bound to the specified socket path.
    pub fn new(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            state: ServerState::new(),
        }
    }

    /// Get the socket path this server is using.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Get the default socket path based on XDG_RUNTIME_DIR or fallback.
    pub fn default_socket_path() -> PathBuf {
        if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
            PathBuf::from(xdg_runtime).join("overscribe.sock")
        } else {
            let uid = unsafe { libc::getuid() };
            PathBuf::from(format!("/tmp/overscribe-{}.sock", uid))
        }
    }

    /// Start the IPC server and handle incoming connections.
    ///
    /// `events` feeds `follow` subscribers; commands other than `follow`
    /// go through `handler`.
    pub async fn start<H>(&self, handler: H, events: broadcast::Sender<DaemonEvent>) -> Result<()>
    where
        H: CommandHandler + 'static,
    {
        // Clean up any existing socket file
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| OverscribeError::IpcSocket {
                message: format!("Failed to remove existing socket: {}", e),
            })?;
        }

        let listener =
            UnixListener::bind(&self.socket_path).map_err(|e| OverscribeError::IpcSocket {
                message: format!("Failed to bind to socket: {}", e),
            })?;

        let handler = Arc::new(handler);

        loop {
            if self.state.is_shutdown().await {
                break;
            }

            // Accept with a timeout so the shutdown flag is re-checked.
            let accept_result =
                tokio::time::timeout(tokio::time::Duration::from_millis(100), listener.accept())
                    .await;

            match accept_result {
                Ok(Ok((stream, _))) => {
                    let handler = Arc::clone(&handler);
                    let events = events.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, handler, events).await {
                            eprintln!("Error handling client: {}", e);
                        }
                    });
                }
                Ok(Err(e)) => {
                    return Err(OverscribeError::IpcConnection {
                        message: format!("Failed to accept connection: {}", e),
                    });
                }
                Err(_) => {
                    continue;
                }
            }
        }

        Ok(())
    }

    /// Stop the IPC server and clean up the socket file.
    pub async fn stop(&self) -> Result<()> {
        self.state.set_shutdown().await;

        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| OverscribeError::IpcSocket {
                message: format!("Failed to remove socket file: {}", e),
            })?;
        }

        Ok(())
    }
}

/// Handle a single client connection.
async fn handle_client<H>(
    stream: UnixStream,
    handler: Arc<H>,
    events: broadcast::Sender<DaemonEvent>,
) -> Result<()>
where
    H: CommandHandler,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    // Read command (one line JSON)
    reader
        .read_line(&mut line)
        .await
        .map_err(|e| OverscribeError::IpcConnection {
            message: format!("Failed to read from client: {}", e),
        })?;

    let command = Command::from_json(line.trim()).map_err(|e| OverscribeError::IpcProtocol {
        message: format!("Failed to parse command: {}", e),
    })?;

    // Subscribe before acknowledging so no event between the two is lost.
    let subscription = if command == Command::Follow {
        Some(events.subscribe())
    } else {
        None
    };
    // Holding a sender here would keep the stream open past daemon
    // shutdown; subscribers must observe the channel closing.
    drop(events);

    let response = handler.handle(command).await;
    write_line(&mut writer, &serialize(&response.to_json())?).await?;

    let Some(mut rx) = subscription else {
        return Ok(());
    };

    loop {
        match rx.recv().await {
            Ok(event) => {
                let json = serialize(&event.to_json())?;
                if write_line(&mut writer, &json).await.is_err() {
                    // Subscriber went away.
                    break;
                }
            }
            // A slow subscriber missed events; keep streaming from the
            // current position rather than tearing the connection down.
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    Ok(())
}

fn serialize(result: &std::result::Result<String, serde_json::Error>) -> Result<String> {
    match result {
        Ok(json) => Ok(json.clone()),
        Err(e) => Err(OverscribeError::IpcProtocol {
            message: format!("Failed to serialize message: {}", e),
        }),
    }
}

async fn write_line<W>(writer: &mut W, json: &str) -> Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| OverscribeError::IpcConnection {
            message: format!("Failed to write to client: {}", e),
        })?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| OverscribeError::IpcConnection {
            message: format!("Failed to write newline to client: {}", e),
        })?;
    writer
        .flush()
        .await
        .map_err(|e| OverscribeError::IpcConnection {
            message: format!("Failed to flush writer: {}", e),
        })?;
    Ok(())
}
