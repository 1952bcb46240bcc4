//! IPC client for sending commands to the daemon.

use crate::error::{OverscribeError, Result};
use crate::ipc::protocol::{Command, DaemonEvent, Response};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Send a command to the daemon via Unix socket.
///
/// # Errors
/// Returns `OverscribeError::IpcConnection` if connection fails
/// Returns `OverscribeError::IpcProtocol` if serialization/deserialization fails
pub async fn send_command(socket_path: &Path, command: Command) -> Result<Response> {
    let stream = connect(socket_path).await?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    write_command(&mut writer, &command).await?;

    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .await
        .map_err(|e| OverscribeError::IpcConnection {
            message: format!("Failed to read response: {}", e),
        })?;

    let response =
        Response::from_json(response_line.trim()).map_err(|e| OverscribeError::IpcProtocol {
            message: format!("Failed to deserialize response: {}", e),
        })?;

    Ok(response)
}

/// Subscribe to the daemon's event stream and invoke `on_event` for each
/// event until the daemon closes the connection.
///
/// Returns the acknowledgement error, if the subscription was refused.
pub async fn follow_events<F>(socket_path: &Path, mut on_event: F) -> Result<()>
where
    F: FnMut(DaemonEvent),
{
    let stream = connect(socket_path).await?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    write_command(&mut writer, &Command::Follow).await?;

    let mut line = String::new();
    reader
        .read_line(&mut line)
        .await
        .map_err(|e| OverscribeError::IpcConnection {
            message: format!("Failed to read response: {}", e),
        })?;

    match Response::from_json(line.trim()) {
        Ok(Response::Ok) => {}
        Ok(Response::Error { message }) => {
            return Err(OverscribeError::IpcProtocol { message });
        }
        Ok(other) => {
            return Err(OverscribeError::IpcProtocol {
                message: format!("Unexpected subscription response: {:?}", other),
            });
        }
        Err(e) => {
            return Err(OverscribeError::IpcProtocol {
                message: format!("Failed to deserialize response: {}", e),
            });
        }
    }

    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| OverscribeError::IpcConnection {
                message: format!("Failed to read event: {}", e),
            })?;
        if read == 0 {
            // Daemon closed the stream.
            return Ok(());
        }
        let event =
            DaemonEvent::from_json(line.trim()).map_err(|e| OverscribeError::IpcProtocol {
                message: format!("Failed to deserialize event: {}", e),
            })?;
        on_event(event);
    }
}

async fn connect(socket_path: &Path) -> Result<UnixStream> {
    UnixStream::connect(socket_path)
        .await
        .map_err(|e| OverscribeError::IpcConnection {
            message: format!("Failed to connect to daemon: {}", e),
        })
}

async fn write_command<W>(writer: &mut W, command: &Command) -> Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    let command_json = command.to_json().map_err(|e| OverscribeError::IpcProtocol {
        message: format!("Failed to serialize command: {}", e),
    })?;

    writer
        .write_all(command_json.as_bytes())
        .await
        .map_err(|e| OverscribeError::IpcConnection {
            message: format!("Failed to write command: {}", e),
        })?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| OverscribeError::IpcConnection {
            message: format!("Failed to write newline: {}", e),
        })?;
    writer
        .flush()
        .await
        .map_err(|e| OverscribeError::IpcConnection {
            message: format!("Failed to flush writer: {}", e),
        })?;
    Ok(())
}
