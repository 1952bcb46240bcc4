//! Output line filtering.
//!
//! The recognition engine mixes transcript text with diagnostics on both
//! of its streams, with no structured framing. This module is the only
//! boundary enforcing that only real transcription reaches consumers:
//! decode, strip terminal redraw codes, reassemble lines across chunk
//! boundaries, trim, and drop noise.

pub mod ansi;
pub mod noise;
pub mod stream;

pub use ansi::strip_control_sequences;
pub use noise::{NoiseRule, is_noise, resolve_noise_rules};
pub use stream::LineFilter;
