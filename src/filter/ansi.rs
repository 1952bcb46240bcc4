//! Terminal escape sequence removal.
//!
//! Streaming engines redraw partial hypotheses in place using CSI codes
//! (cursor movement, clear-line). None of that is transcript text.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

// CSI sequences: ESC [ <params> <final letter>, e.g. ESC[2K (clear line).
#[allow(clippy::expect_used)]
static CONTROL_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("static pattern is valid"));

/// Removes CSI escape sequences from a line of engine output.
pub fn strip_control_sequences(text: &str) -> Cow<'_, str> {
    CONTROL_SEQUENCE.replace_all(text, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(strip_control_sequences("Hello world"), "Hello world");
    }

    #[test]
    fn clear_line_code_is_removed() {
        assert_eq!(strip_control_sequences("\x1b[2KHello"), "Hello");
    }

    #[test]
    fn cursor_movement_codes_are_removed() {
        assert_eq!(strip_control_sequences("\x1b[1A\x1b[0Gredrawn"), "redrawn");
    }

    #[test]
    fn multiple_codes_in_one_line() {
        assert_eq!(
            strip_control_sequences("\x1b[2K\x1b[1Gso far\x1b[0m"),
            "so far"
        );
    }

    #[test]
    fn stripping_is_idempotent() {
        let once = strip_control_sequences("\x1b[2KHello").into_owned();
        let twice = strip_control_sequences(&once).into_owned();
        assert_eq!(once, twice);
    }
}
