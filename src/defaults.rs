//! Default configuration constants for overscribe.
//!
//! The engine parameters are tuned for `whisper-stream` running on a
//! 4-core laptop with live microphone input. They trade latency for
//! stable, repeat-free output.

/// Default number of engine worker threads.
pub const ENGINE_THREADS: u32 = 4;

/// Default capture device index passed to the engine.
pub const CAPTURE_INDEX: u32 = 0;

/// Default streaming step size in milliseconds.
///
/// Higher step means more latency but noticeably better accuracy on
/// continuous speech.
pub const STEP_MS: u32 = 4000;

/// Default streaming window length in milliseconds.
///
/// Equal to the step size so consecutive windows do not overlap, which
/// kills the echo where the tail of one window is re-recognized at the
/// head of the next.
pub const LENGTH_MS: u32 = 4000;

/// Default audio carried over between windows in milliseconds.
///
/// A small keep prevents "returns return" style duplicate glitches at
/// window boundaries.
pub const KEEP_MS: u32 = 100;

/// Default voice-activity threshold (0.0 to 1.0).
///
/// 0.6 is a good balance for catching soft speech onsets without
/// triggering on ambient noise.
pub const VAD_THRESHOLD: f32 = 0.6;

/// Default high-pass frequency threshold in Hz.
///
/// 100 Hz keeps natural voice depth while cutting rumble.
pub const FREQ_THRESHOLD: f32 = 100.0;

/// Default beam size. 1 selects greedy decoding, the fastest mode.
pub const BEAM_SIZE: u32 = 1;

/// Default maximum tokens per streaming window.
///
/// Caps runaway hallucinations on silence without cutting off normal
/// sentences at the default window length.
pub const MAX_TOKENS: u32 = 32;

/// Default audio context size. 0 lets the engine pick.
pub const AUDIO_CTX: u32 = 0;

/// Default engine binary filename, looked up under the data directory.
pub const ENGINE_BINARY: &str = "whisper-stream";

/// Default model filename, looked up under the data directory.
pub const MODEL_FILE: &str = "ggml-base.en.bin";

/// Output line prefixes that are engine/loader diagnostics, never speech.
pub const NOISE_PREFIXES: &[&str] = &["init:", "SDL_main:", "whisper_"];

/// Output markers the engine emits for non-speech audio.
pub const NOISE_MARKERS: &[&str] = &["[BLANK_AUDIO]"];

/// Device identifier used when the probe cannot resolve a microphone.
pub const FALLBACK_DEVICE: &str = "default";

/// Case-insensitive keyword that selects a device from the probe output.
pub const PROBE_KEYWORD: &str = "microphone";

/// Default device-enumeration probe invocation.
///
/// The probe is an opaque external command; only its diagnostic text is
/// parsed. Override `[audio] probe_command` for capture backends whose
/// listing flags differ.
pub fn probe_command() -> Vec<String> {
    ["ffmpeg", "-list_devices", "true", "-f", "dshow", "-i", "dummy"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
