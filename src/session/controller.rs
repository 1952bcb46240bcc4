//! Session state machine.
//!
//! Single source of truth for whether a transcription session is idle,
//! starting, listening, or stopping. All transitions are serialized: one
//! toggle may be in flight at a time, and the controller is the sole
//! owner of the engine subprocess handle.

use crate::config::EngineSection;
use crate::engine::{self, EngineHandle};
use crate::error::Result;
use crate::filter::{LineFilter, NoiseRule};
use crate::session::events::{StatusEvent, TranscriptEvent};
use crossbeam_channel::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

/// Observable session states.
///
/// There is no resting `Error` state: a failed start emits
/// `StatusEvent::Error` and lands back in `Idle`, recoverable by the
/// next toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Listening,
    Stopping,
}

impl SessionState {
    /// Human-readable state name for status reporting.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Listening => "listening",
            SessionState::Stopping => "stopping",
        }
    }
}

/// Result of a toggle request.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// A session was started and is now listening.
    Started,
    /// Graceful shutdown of the running session was requested.
    Stopping,
    /// A transition was already in flight; the request was dropped.
    Ignored,
    /// The start attempt failed; the reason was also emitted as a
    /// `StatusEvent::Error`.
    Failed(String),
}

/// Bookkeeping for one live recognition attempt.
///
/// Created fresh on every start; never reused across restarts.
#[derive(Debug)]
struct Session {
    pid: u32,
    #[allow(dead_code)]
    started_at: Instant,
}

#[derive(Debug)]
struct Shared {
    state: SessionState,
    session: Option<Session>,
}

/// Live transcription session controller.
///
/// Emits exactly one `StatusEvent` per state transition on `status_tx`
/// and filtered transcript lines on `transcript_tx`, in engine output
/// order.
pub struct SessionController {
    shared: Arc<Mutex<Shared>>,
    engine: EngineSection,
    device_name: String,
    rules: Vec<NoiseRule>,
    status_tx: Sender<StatusEvent>,
    transcript_tx: Sender<TranscriptEvent>,
}

impl SessionController {
    /// Creates an idle controller.
    ///
    /// `device_name` is the resolved capture device identifier; it is
    /// informational here (the engine addresses the device by index) and
    /// surfaced through [`SessionController::device_name`] for status
    /// reporting.
    pub fn new(
        engine: EngineSection,
        device_name: String,
        rules: Vec<NoiseRule>,
        status_tx: Sender<StatusEvent>,
        transcript_tx: Sender<TranscriptEvent>,
    ) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state: SessionState::Idle,
                session: None,
            })),
            engine,
            device_name,
            rules,
            status_tx,
            transcript_tx,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        lock(&self.shared).state
    }

    /// Resolved capture device identifier.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Handles one toggle request.
    ///
    /// - `Idle`: starts a session. On success the state is `Listening`
    ///   and `StatusEvent::Listening` was emitted; on failure the state
    ///   is back to `Idle` after a single `StatusEvent::Error`.
    /// - `Listening`: requests graceful engine shutdown (SIGINT). The
    ///   terminal transition to `Idle` plus `StatusEvent::Stopped`
    ///   happens when the exit notice arrives. There is no forced-kill
    ///   escalation: an engine that ignores the interrupt leaves the
    ///   session in `Stopping` until it exits.
    /// - `Starting` / `Stopping`: ignored. A single in-flight transition
    ///   must complete before another toggle is accepted, so rapid
    ///   toggling can never double-spawn or stop a half-started session.
    pub fn toggle(&self) -> ToggleOutcome {
        let mut shared = lock(&self.shared);
        match shared.state {
            SessionState::Starting | SessionState::Stopping => ToggleOutcome::Ignored,
            SessionState::Listening => {
                shared.state = SessionState::Stopping;
                let pid = shared.session.as_ref().map(|s| s.pid);
                drop(shared);
                if let Some(pid) = pid {
                    engine::interrupt_pid(pid);
                }
                ToggleOutcome::Stopping
            }
            SessionState::Idle => {
                shared.state = SessionState::Starting;
                drop(shared);
                match self.start_session() {
                    Ok(()) => ToggleOutcome::Started,
                    Err(e) => {
                        let reason = e.to_string();
                        self.emit(StatusEvent::Error {
                            reason: reason.clone(),
                        });
                        let mut shared = lock(&self.shared);
                        shared.state = SessionState::Idle;
                        shared.session = None;
                        ToggleOutcome::Failed(reason)
                    }
                }
            }
        }
    }

    /// Requests shutdown of a running session, if any.
    ///
    /// Used on daemon shutdown; behaves like a stop toggle and is a
    /// no-op in every other state.
    pub fn stop_if_listening(&self) {
        let mut shared = lock(&self.shared);
        if shared.state == SessionState::Listening {
            shared.state = SessionState::Stopping;
            let pid = shared.session.as_ref().map(|s| s.pid);
            drop(shared);
            if let Some(pid) = pid {
                engine::interrupt_pid(pid);
            }
        }
    }

    fn start_session(&self) -> Result<()> {
        // Path validation happens inside spawn, before any process is
        // created; a missing binary or model resolves to a single Error
        // status with no state to clean up.
        let handle = engine::spawn(&self.engine)?;

        {
            let mut shared = lock(&self.shared);
            shared.session = Some(Session {
                pid: handle.pid(),
                started_at: Instant::now(),
            });
            shared.state = SessionState::Listening;
        }
        self.emit(StatusEvent::Listening);

        // Fresh filter per session: the trailing-fragment carry buffer
        // never leaks across sessions.
        let filter = LineFilter::new(self.rules.clone());
        let shared = Arc::clone(&self.shared);
        let status_tx = self.status_tx.clone();
        let transcript_tx = self.transcript_tx.clone();
        thread::spawn(move || pump(handle, filter, shared, status_tx, transcript_tx));

        Ok(())
    }

    fn emit(&self, status: StatusEvent) {
        let _ = self.status_tx.send(status);
    }
}

/// Drains one session's output and performs its terminal transition.
///
/// Runs on its own thread per session. The chunk channel closes when
/// both engine streams hit EOF, after which the single exit notice is
/// consumed and the state machine resolves it:
/// - a caller-requested stop ends as `Stopped`;
/// - an unsolicited exit after some output ends as `Ready` (implicit
///   stop, not an error);
/// - an unsolicited exit before *any* output ends as `Error` — an
///   engine that never printed a byte almost certainly failed to start.
fn pump(
    handle: EngineHandle,
    mut filter: LineFilter,
    shared: Arc<Mutex<Shared>>,
    status_tx: Sender<StatusEvent>,
    transcript_tx: Sender<TranscriptEvent>,
) {
    let mut saw_output = false;
    for chunk in handle.chunks.iter() {
        if !chunk.is_empty() {
            saw_output = true;
        }
        for event in filter.push(&chunk) {
            // A vanished consumer must not stall teardown; keep
            // draining so the exit notice is still handled.
            let _ = transcript_tx.send(event);
        }
    }

    let _notice = handle.exit.recv();

    let explicit_stop = {
        let mut shared = lock(&shared);
        let explicit = shared.state == SessionState::Stopping;
        shared.state = SessionState::Idle;
        shared.session = None;
        explicit
    };

    let status = if explicit_stop {
        StatusEvent::Stopped
    } else if saw_output {
        StatusEvent::Ready
    } else {
        StatusEvent::Error {
            reason: "recognition engine exited before producing any output".to_string(),
        }
    };
    let _ = status_tx.send(status);
}

/// Locks the shared state, recovering from a poisoned mutex.
///
/// A panicking pump thread must not wedge the controller; the state it
/// guards stays structurally valid.
fn lock<'a>(shared: &'a Arc<Mutex<Shared>>) -> MutexGuard<'a, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterSection;
    use crate::filter::resolve_noise_rules;
    use crossbeam_channel::{Receiver, unbounded};
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Harness {
        controller: SessionController,
        status_rx: Receiver<StatusEvent>,
        transcript_rx: Receiver<TranscriptEvent>,
        _dir: TempDir,
    }

    fn fake_engine(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("fake-engine");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{}", body).unwrap();
        let mut perms = file.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn harness(engine_body: &str) -> Harness {
        let dir = TempDir::new().unwrap();
        let binary = fake_engine(&dir, engine_body);
        let model = dir.path().join("model.bin");
        std::fs::write(&model, b"model").unwrap();

        let engine = EngineSection {
            binary,
            model,
            ..EngineSection::default()
        };
        let (status_tx, status_rx) = unbounded();
        let (transcript_tx, transcript_rx) = unbounded();
        let controller = SessionController::new(
            engine,
            "default".to_string(),
            resolve_noise_rules(&FilterSection::default()),
            status_tx,
            transcript_tx,
        );
        Harness {
            controller,
            status_rx,
            transcript_rx,
            _dir: dir,
        }
    }

    fn next_status(rx: &Receiver<StatusEvent>) -> StatusEvent {
        rx.recv_timeout(Duration::from_secs(5)).expect("status event")
    }

    /// Engine body that transcribes a bit and then waits for SIGINT.
    const TALKING_ENGINE: &str = "\
trap 'exit 0' INT
printf 'init: loading model\\n'
printf 'Hello wor'
printf 'ld\\n[BLANK_AUDIO]\\n'
while :; do sleep 0.05; done";

    #[test]
    fn state_names() {
        assert_eq!(SessionState::Idle.as_str(), "idle");
        assert_eq!(SessionState::Starting.as_str(), "starting");
        assert_eq!(SessionState::Listening.as_str(), "listening");
        assert_eq!(SessionState::Stopping.as_str(), "stopping");
    }

    #[test]
    fn toggle_starts_then_stops_a_session() {
        let h = harness(TALKING_ENGINE);
        assert_eq!(h.controller.state(), SessionState::Idle);

        assert_eq!(h.controller.toggle(), ToggleOutcome::Started);
        assert_eq!(next_status(&h.status_rx), StatusEvent::Listening);
        assert_eq!(h.controller.state(), SessionState::Listening);

        // The filtered transcript arrives: banner and marker dropped,
        // split word rejoined.
        let event = h
            .transcript_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("transcript event");
        assert_eq!(event.text, "Hello world");

        assert_eq!(h.controller.toggle(), ToggleOutcome::Stopping);
        assert_eq!(next_status(&h.status_rx), StatusEvent::Stopped);
        assert_eq!(h.controller.state(), SessionState::Idle);
    }

    #[test]
    fn unsolicited_exit_after_output_is_an_implicit_stop() {
        let h = harness("printf 'some speech here\\n'\nexit 0");
        assert_eq!(h.controller.toggle(), ToggleOutcome::Started);
        assert_eq!(next_status(&h.status_rx), StatusEvent::Listening);
        assert_eq!(next_status(&h.status_rx), StatusEvent::Ready);
        assert_eq!(h.controller.state(), SessionState::Idle);
    }

    #[test]
    fn exit_with_no_output_is_an_error() {
        let h = harness("exit 1");
        assert_eq!(h.controller.toggle(), ToggleOutcome::Started);
        assert_eq!(next_status(&h.status_rx), StatusEvent::Listening);
        match next_status(&h.status_rx) {
            StatusEvent::Error { reason } => {
                assert!(reason.contains("before producing any output"));
            }
            other => panic!("expected Error status, got {:?}", other),
        }
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert!(h.transcript_rx.try_recv().is_err());
    }

    #[test]
    fn missing_binary_emits_one_error_and_returns_to_idle() {
        let h = harness("exit 0");
        // Break the config after harness construction.
        let broken = SessionController::new(
            EngineSection {
                binary: PathBuf::from("/nonexistent/engine"),
                model: PathBuf::from("/nonexistent/model.bin"),
                ..EngineSection::default()
            },
            "default".to_string(),
            vec![],
            h.controller.status_tx.clone(),
            h.controller.transcript_tx.clone(),
        );

        match broken.toggle() {
            ToggleOutcome::Failed(reason) => assert!(reason.contains("not found")),
            other => panic!("expected Failed, got {:?}", other),
        }
        match next_status(&h.status_rx) {
            StatusEvent::Error { reason } => assert!(reason.contains("not found")),
            other => panic!("expected Error status, got {:?}", other),
        }
        assert_eq!(broken.state(), SessionState::Idle);
        // Recoverable: the next toggle is accepted (and fails the same
        // way rather than being ignored).
        assert!(matches!(broken.toggle(), ToggleOutcome::Failed(_)));
        let _ = next_status(&h.status_rx);
    }

    #[test]
    fn toggle_while_stopping_is_ignored() {
        // Engine without an INT trap that sleeps forever would hang the
        // test; use one that exits on INT but slowly enough to observe
        // the Stopping state.
        let h = harness("trap 'sleep 0.3; exit 0' INT\nprintf 'x\\n'\nwhile :; do sleep 0.05; done");
        assert_eq!(h.controller.toggle(), ToggleOutcome::Started);
        assert_eq!(next_status(&h.status_rx), StatusEvent::Listening);

        assert_eq!(h.controller.toggle(), ToggleOutcome::Stopping);
        // In-flight stop: further toggles are dropped.
        assert_eq!(h.controller.toggle(), ToggleOutcome::Ignored);
        assert_eq!(h.controller.toggle(), ToggleOutcome::Ignored);

        assert_eq!(next_status(&h.status_rx), StatusEvent::Stopped);
        assert_eq!(h.controller.state(), SessionState::Idle);
    }

    #[test]
    fn sessions_do_not_leak_state_across_restarts() {
        // First session ends with a dangling partial line in the filter;
        // the second session must not see it.
        let h = harness("printf 'complete line\\npartial without newline'\nexit 0");

        assert_eq!(h.controller.toggle(), ToggleOutcome::Started);
        assert_eq!(next_status(&h.status_rx), StatusEvent::Listening);
        assert_eq!(next_status(&h.status_rx), StatusEvent::Ready);
        let first = h
            .transcript_rx
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(first.text, "complete line");
        assert!(h.transcript_rx.try_recv().is_err());

        // Second session: fresh handle, fresh carry buffer.
        assert_eq!(h.controller.toggle(), ToggleOutcome::Started);
        assert_eq!(next_status(&h.status_rx), StatusEvent::Listening);
        assert_eq!(next_status(&h.status_rx), StatusEvent::Ready);
        let second = h
            .transcript_rx
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(second.text, "complete line");
    }

    #[test]
    fn stop_if_listening_is_a_noop_when_idle() {
        let h = harness("exit 0");
        h.controller.stop_if_listening();
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert!(h.status_rx.try_recv().is_err());
    }

    #[test]
    fn stop_if_listening_stops_a_running_session() {
        let h = harness(TALKING_ENGINE);
        assert_eq!(h.controller.toggle(), ToggleOutcome::Started);
        assert_eq!(next_status(&h.status_rx), StatusEvent::Listening);

        h.controller.stop_if_listening();
        assert_eq!(next_status(&h.status_rx), StatusEvent::Stopped);
        assert_eq!(h.controller.state(), SessionState::Idle);
    }
}
