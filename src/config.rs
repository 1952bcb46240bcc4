use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSection,
    pub audio: AudioSection,
    pub filter: FilterSection,
}

/// Recognition engine configuration.
///
/// Everything except `binary` and `model` is an opaque pass-through
/// argument to the engine; only those two paths are validated before a
/// session starts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSection {
    pub binary: PathBuf,
    pub model: PathBuf,
    pub capture_index: u32,
    pub threads: u32,
    pub step_ms: u32,
    pub length_ms: u32,
    pub keep_ms: u32,
    pub vad_threshold: f32,
    pub freq_threshold: f32,
    pub beam_size: u32,
    pub max_tokens: u32,
    pub no_fallback: bool,
    pub audio_ctx: u32,
    pub use_gpu: bool,
}

/// Audio device selection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSection {
    /// Explicit device name; skips the probe entirely when set.
    pub device: Option<String>,
    pub probe_command: Vec<String>,
    pub probe_keyword: String,
}

/// Output noise classification configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterSection {
    /// Line prefixes dropped as engine diagnostics.
    pub noise_prefixes: Vec<String>,
    /// Substrings dropped as non-speech markers.
    pub noise_markers: Vec<String>,
}

/// Directory where the engine binary and model are expected by default.
fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("overscribe")
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            binary: data_dir().join(defaults::ENGINE_BINARY),
            model: data_dir().join(defaults::MODEL_FILE),
            capture_index: defaults::CAPTURE_INDEX,
            threads: defaults::ENGINE_THREADS,
            step_ms: defaults::STEP_MS,
            length_ms: defaults::LENGTH_MS,
            keep_ms: defaults::KEEP_MS,
            vad_threshold: defaults::VAD_THRESHOLD,
            freq_threshold: defaults::FREQ_THRESHOLD,
            beam_size: defaults::BEAM_SIZE,
            max_tokens: defaults::MAX_TOKENS,
            no_fallback: true,
            audio_ctx: defaults::AUDIO_CTX,
            use_gpu: false,
        }
    }
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            device: None,
            probe_command: defaults::probe_command(),
            probe_keyword: defaults::PROBE_KEYWORD.to_string(),
        }
    }
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            noise_prefixes: defaults::NOISE_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            noise_markers: defaults::NOISE_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - OVERSCRIBE_ENGINE → engine.binary
    /// - OVERSCRIBE_MODEL → engine.model
    /// - OVERSCRIBE_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(binary) = std::env::var("OVERSCRIBE_ENGINE")
            && !binary.is_empty()
        {
            self.engine.binary = PathBuf::from(binary);
        }

        if let Ok(model) = std::env::var("OVERSCRIBE_MODEL")
            && !model.is_empty()
        {
            self.engine.model = PathBuf::from(model);
        }

        if let Ok(device) = std::env::var("OVERSCRIBE_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/overscribe/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("overscribe")
            .join("config.toml")
    }
}
