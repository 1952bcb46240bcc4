//! Daemon mode for overscribe - owns the session controller and IPC server.

pub mod handler;

use crate::config::Config;
use crate::device::{self, CommandProbe};
use crate::error::{OverscribeError, Result};
use crate::filter::resolve_noise_rules;
use crate::ipc::protocol::DaemonEvent;
use crate::ipc::server::IpcServer;
use crate::session::SessionController;
use crossbeam_channel::unbounded;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tokio::sync::{Notify, broadcast};

/// Events a `follow` subscriber can miss before its stream skips ahead.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Resolves the capture device name for this daemon run.
///
/// An explicit configured device skips the probe entirely. Otherwise the
/// probe command runs once, synchronously, before the daemon accepts any
/// command; no session can start against an unresolved device. Probe
/// failure is not fatal, it degrades to the fallback name.
pub fn resolve_device(config: &Config) -> String {
    if let Some(device) = &config.audio.device {
        return device.clone();
    }
    match CommandProbe::from_config(&config.audio) {
        Ok(probe) => device::resolve(&probe, &config.audio.probe_keyword)
            .device_name()
            .to_string(),
        Err(_) => crate::defaults::FALLBACK_DEVICE.to_string(),
    }
}

/// Run the daemon: resolve the device, start the IPC server, wait for
/// shutdown.
///
/// # Arguments
/// * `config` - Configuration
/// * `socket_path` - Path to Unix socket for IPC
/// * `quiet` - Suppress status messages
///
/// # Returns
/// Ok(()) on graceful shutdown, error otherwise
pub async fn run_daemon(config: Config, socket_path: Option<PathBuf>, quiet: bool) -> Result<()> {
    let device_name = resolve_device(&config);
    if !quiet {
        eprintln!("Capture device: {}", device_name);
    }

    let (status_tx, status_rx) = unbounded();
    let (transcript_tx, transcript_rx) = unbounded();
    let controller = Arc::new(SessionController::new(
        config.engine.clone(),
        device_name,
        resolve_noise_rules(&config.filter),
        status_tx,
        transcript_tx,
    ));

    // Bridge the controller's channels onto the broadcast bus feeding
    // `follow` subscribers. Plain threads: the senders are crossbeam and
    // the receive side blocks.
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    {
        let event_tx = event_tx.clone();
        thread::spawn(move || {
            for status in status_rx.iter() {
                let _ = event_tx.send(DaemonEvent::Status { status });
            }
        });
    }
    {
        let event_tx = event_tx.clone();
        thread::spawn(move || {
            for event in transcript_rx.iter() {
                let _ = event_tx.send(DaemonEvent::Transcript { event });
            }
        });
    }

    let socket_path = socket_path.unwrap_or_else(IpcServer::default_socket_path);
    let server = Arc::new(IpcServer::new(socket_path));

    if !quiet {
        eprintln!(
            "IPC server listening at: {}",
            server.socket_path().display()
        );
        eprintln!("Daemon ready.");
    }

    let shutdown = Arc::new(Notify::new());
    let handler = handler::DaemonCommandHandler::new(Arc::clone(&controller), Arc::clone(&shutdown));

    let server_clone = Arc::clone(&server);
    let server_handle = tokio::spawn(async move { server_clone.start(handler, event_tx).await });

    // Wait for a shutdown command or a termination signal.
    tokio::select! {
        _ = shutdown.notified() => {
            if !quiet {
                eprintln!("Shutdown requested, stopping...");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            if !quiet {
                eprintln!("\nReceived SIGINT, shutting down...");
            }
            controller.stop_if_listening();
        }
        res = wait_for_sigterm() => {
            if let Err(e) = res {
                eprintln!("Error setting up signal handler: {}", e);
            }
            if !quiet {
                eprintln!("\nReceived SIGTERM, shutting down...");
            }
            controller.stop_if_listening();
        }
    }

    server.stop().await?;

    if let Err(e) = server_handle.await {
        eprintln!("overscribe: daemon server task failed: {e}");
    }

    if !quiet {
        eprintln!("Daemon stopped.");
    }

    Ok(())
}

/// Wait for SIGTERM signal (used by systemd).
#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
        OverscribeError::Other(format!("Failed to register SIGTERM handler: {}", e))
    })?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    // On non-Unix, just wait forever (Ctrl+C will still work)
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioSection;

    #[test]
    fn test_explicit_device_skips_probe() {
        let config = Config {
            audio: AudioSection {
                device: Some("hw:1,0".to_string()),
                // Command that would fail if it ran.
                probe_command: vec!["/nonexistent/probe".to_string()],
                ..AudioSection::default()
            },
            ..Config::default()
        };
        assert_eq!(resolve_device(&config), "hw:1,0");
    }

    #[test]
    fn test_probe_failure_falls_back() {
        let config = Config {
            audio: AudioSection {
                device: None,
                probe_command: vec!["/nonexistent/probe".to_string()],
                ..AudioSection::default()
            },
            ..Config::default()
        };
        assert_eq!(resolve_device(&config), crate::defaults::FALLBACK_DEVICE);
    }

    #[test]
    fn test_probe_output_resolves_device() {
        let config = Config {
            audio: AudioSection {
                device: None,
                probe_command: vec![
                    "/bin/sh".to_string(),
                    "-c".to_string(),
                    r#"echo '"USB Microphone (C-Media)"' >&2"#.to_string(),
                ],
                ..AudioSection::default()
            },
            ..Config::default()
        };
        assert_eq!(resolve_device(&config), "USB Microphone (C-Media)");
    }

    #[test]
    fn test_empty_probe_command_falls_back() {
        let config = Config {
            audio: AudioSection {
                device: None,
                probe_command: vec![],
                ..AudioSection::default()
            },
            ..Config::default()
        };
        assert_eq!(resolve_device(&config), crate::defaults::FALLBACK_DEVICE);
    }
}
