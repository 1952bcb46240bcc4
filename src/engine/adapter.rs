//! Recognition engine subprocess adapter.
//!
//! Owns the external streaming recognizer: launches it with a fully
//! specified argument set, hands its combined output to the caller as raw
//! byte chunks, and delivers exactly one exit notice per handle whether
//! the process was interrupted or died on its own.

use crate::config::EngineSection;
use crate::error::{OverscribeError, Result};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;

/// Size of a single read from the engine's output streams.
const READ_BUF_SIZE: usize = 4096;

/// Delivered exactly once when the engine process exits.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitNotice {
    /// Process exit code, if the process exited normally. `None` when it
    /// was terminated by a signal.
    pub code: Option<i32>,
}

/// Handle to a running engine process.
///
/// `chunks` closes when both output streams reach EOF (the process
/// exited or was killed); the exit notice is available afterwards.
/// Dropping the handle detaches the process — termination goes through
/// [`EngineHandle::interrupt`].
#[derive(Debug)]
pub struct EngineHandle {
    pid: u32,
    /// Raw output chunks from stdout and stderr. Chunk boundaries do not
    /// align with line boundaries.
    pub chunks: Receiver<Vec<u8>>,
    /// Single exit notification.
    pub exit: Receiver<ExitNotice>,
}

impl EngineHandle {
    /// OS process id of the engine.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Requests graceful termination via SIGINT.
    ///
    /// Idempotent: interrupting an already-exited process is a no-op
    /// (the kernel reports ESRCH, which is ignored). There is no
    /// escalation to SIGKILL; an engine that ignores SIGINT keeps
    /// running until it exits on its own.
    pub fn interrupt(&self) {
        interrupt_pid(self.pid);
    }
}

/// Sends SIGINT to a process by id, ignoring delivery failures.
pub fn interrupt_pid(pid: u32) {
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGINT);
    }
}

/// Builds the engine argument vector from configuration.
///
/// All values are opaque pass-through parameters for the streaming
/// recognizer; none affect control logic here.
pub fn build_args(config: &EngineSection) -> Vec<String> {
    let mut args = vec![
        "-m".to_string(),
        config.model.to_string_lossy().into_owned(),
        "--capture".to_string(),
        config.capture_index.to_string(),
        "-t".to_string(),
        config.threads.to_string(),
        "--step".to_string(),
        config.step_ms.to_string(),
        "--length".to_string(),
        config.length_ms.to_string(),
        "--keep".to_string(),
        config.keep_ms.to_string(),
        "--vad-thold".to_string(),
        format!("{}", config.vad_threshold),
        "--freq-thold".to_string(),
        format!("{:.2}", config.freq_threshold),
        "--beam-size".to_string(),
        config.beam_size.to_string(),
        "--max-tokens".to_string(),
        config.max_tokens.to_string(),
    ];
    if config.no_fallback {
        args.push("--no-fallback".to_string());
    }
    args.push("--audio-ctx".to_string());
    args.push(config.audio_ctx.to_string());
    if !config.use_gpu {
        args.push("--no-gpu".to_string());
    }
    args
}

/// Launches the engine process.
///
/// Validates that the binary and model files exist before touching
/// process state; a missing path fails here and nothing is spawned.
/// Returns [`OverscribeError::EngineLaunch`] when the OS cannot create
/// the process.
pub fn spawn(config: &EngineSection) -> Result<EngineHandle> {
    if !config.binary.is_file() {
        return Err(OverscribeError::EngineBinaryNotFound {
            path: config.binary.display().to_string(),
        });
    }
    if !config.model.is_file() {
        return Err(OverscribeError::ModelNotFound {
            path: config.model.display().to_string(),
        });
    }

    let mut child = Command::new(&config.binary)
        .args(build_args(config))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| OverscribeError::EngineLaunch {
            message: e.to_string(),
        })?;

    let pid = child.id();

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| OverscribeError::EngineLaunch {
            message: "stdout pipe missing".to_string(),
        })?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| OverscribeError::EngineLaunch {
            message: "stderr pipe missing".to_string(),
        })?;

    // Both streams feed one channel: the engine does not separate
    // transcript from diagnostics, so both are text sources. Per-stream
    // order is preserved; interleaving across streams is best effort.
    let (chunk_tx, chunks) = unbounded();
    let stderr_tx = chunk_tx.clone();
    thread::spawn(move || read_chunks(stdout, chunk_tx));
    thread::spawn(move || read_chunks(stderr, stderr_tx));

    let (exit_tx, exit) = bounded(1);
    thread::spawn(move || {
        let code = child.wait().ok().and_then(|status| status.code());
        // Receiver may already be gone during teardown; the notice is
        // best effort at that point.
        let _ = exit_tx.send(ExitNotice { code });
    });

    Ok(EngineHandle { pid, chunks, exit })
}

/// Forwards raw reads from one stream until EOF or the consumer hangs up.
fn read_chunks<R: Read>(mut stream: R, tx: Sender<Vec<u8>>) {
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}
