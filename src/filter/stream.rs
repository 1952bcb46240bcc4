//! Chunk-to-line normalization for engine output.

use crate::filter::ansi::strip_control_sequences;
use crate::filter::noise::{NoiseRule, is_noise};
use crate::session::events::TranscriptEvent;

/// Turns raw output chunks into transcript events.
///
/// Chunk boundaries carry no meaning: a read may end mid-line or even
/// mid-codepoint. Complete lines are drained as they arrive; the
/// trailing partial line stays in a byte-level carry buffer and is
/// prepended to the next chunk, so a line split across any number of
/// reads is reassembled intact. The carry buffer belongs to one session
/// and is discarded with the filter.
#[derive(Debug)]
pub struct LineFilter {
    carry: Vec<u8>,
    rules: Vec<NoiseRule>,
}

impl LineFilter {
    /// Creates a filter with the given noise rule set.
    pub fn new(rules: Vec<NoiseRule>) -> Self {
        Self {
            carry: Vec::new(),
            rules,
        }
    }

    /// Consumes one raw chunk and returns the transcript events for every
    /// complete line it finished, in output order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<TranscriptEvent> {
        self.carry.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.carry.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.carry.drain(..=newline).collect();
            // Lossy decode: a malformed fragment becomes U+FFFD and the
            // rest of the line survives. Decoding per complete line means
            // a multi-byte sequence split across chunks is never broken.
            let text = String::from_utf8_lossy(&line[..line.len() - 1]);
            if let Some(event) = self.accept(&text) {
                events.push(event);
            }
        }
        events
    }

    /// Bytes currently buffered as an incomplete trailing line.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    fn accept(&self, raw: &str) -> Option<TranscriptEvent> {
        let stripped = strip_control_sequences(raw);
        let line = stripped.trim();
        if line.is_empty() || is_noise(line, &self.rules) {
            return None;
        }
        Some(TranscriptEvent::now(line.to_string()))
    }
}
