//! Capture device discovery.
//!
//! The recognizer addresses its capture device by index, but status
//! surfaces and diagnostics want a human-readable name. Discovery runs
//! an external probe command and scans its diagnostic listing for quoted
//! device names; resolution picks the first one matching a keyword and
//! falls back to a sentinel when nothing matches or the probe itself
//! fails. Resolution never blocks startup on an error: a missing probe
//! tool degrades to the fallback name, not a refusal to run.

use crate::config::AudioSection;
use crate::defaults;
use crate::error::{OverscribeError, Result};
use regex::Regex;
use std::process::Command;
use std::sync::LazyLock;

/// Quoted tokens in probe output; device listings quote device names.
static QUOTED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#""([^"]+)""#).expect("quoted-name pattern is valid")
});

/// Source of a raw device listing.
pub trait DeviceProbe {
    /// Runs the probe and returns its combined diagnostic output.
    fn enumerate(&self) -> Result<String>;
}

/// Probe backed by an external listing command.
///
/// Listing tools commonly print the device table to stderr with a
/// nonzero exit code, so both streams are captured and the exit status
/// is ignored as long as the process ran at all.
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    /// Builds a probe from configuration. Fails only when the configured
    /// command line is empty.
    pub fn from_config(audio: &AudioSection) -> Result<Self> {
        let mut parts = audio.probe_command.iter();
        let program = parts
            .next()
            .ok_or_else(|| OverscribeError::DeviceProbe {
                message: "probe command is empty".to_string(),
            })?
            .clone();
        Ok(Self {
            program,
            args: parts.cloned().collect(),
        })
    }
}

impl DeviceProbe for CommandProbe {
    fn enumerate(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| OverscribeError::DeviceProbe {
                message: format!("failed to run {}: {}", self.program, e),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined)
    }
}

/// Outcome of device resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceProbeResult {
    /// A device matching the keyword was found in the listing.
    Detected(String),
    /// Probe failed or no device matched; the fallback name applies.
    Fallback,
}

impl DeviceProbeResult {
    /// Device name to report, substituting the fallback sentinel.
    pub fn device_name(&self) -> &str {
        match self {
            DeviceProbeResult::Detected(name) => name,
            DeviceProbeResult::Fallback => defaults::FALLBACK_DEVICE,
        }
    }
}

/// All quoted device names in a probe listing, in listing order.
pub fn quoted_device_names(output: &str) -> Vec<String> {
    QUOTED_NAME
        .captures_iter(output)
        .map(|c| c[1].to_string())
        .collect()
}

/// First quoted name containing `keyword`, case-insensitively.
pub fn select_device(output: &str, keyword: &str) -> Option<String> {
    let keyword = keyword.to_lowercase();
    quoted_device_names(output)
        .into_iter()
        .find(|name| name.to_lowercase().contains(&keyword))
}

/// Resolves the capture device through a probe.
///
/// Infallible by design: every failure path collapses to `Fallback`.
pub fn resolve(probe: &dyn DeviceProbe, keyword: &str) -> DeviceProbeResult {
    match probe.enumerate() {
        Ok(output) => match select_device(&output, keyword) {
            Some(name) => DeviceProbeResult::Detected(name),
            None => DeviceProbeResult::Fallback,
        },
        Err(_) => DeviceProbeResult::Fallback,
    }
}
