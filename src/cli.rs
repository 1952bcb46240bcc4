//! Command-line interface for overscribe
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Live speech transcription session controller
#[derive(Parser, Debug)]
#[command(
    name = "overscribe",
    version,
    about = "Live speech transcription session controller"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Capture device name override (skips the device probe)
    #[arg(long, global = true, value_name = "DEVICE")]
    pub device: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the daemon (foreground process for systemd)
    Daemon {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/overscribe.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Toggle the transcription session on/off via IPC
    Toggle {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/overscribe.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Get daemon status via IPC
    Status {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/overscribe.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Shut the daemon down via IPC
    Shutdown {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/overscribe.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Follow daemon events (session state, live transcript lines)
    Follow {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/overscribe.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,

        /// Print raw JSON event lines instead of rendered output
        #[arg(long)]
        json: bool,
    },

    /// Probe and list capture devices
    Devices,

    /// Check that the engine binary, model, and probe command are available
    Check,

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration inspection actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_daemon() {
        let cli = Cli::try_parse_from(["overscribe", "daemon"]).unwrap();
        match cli.command {
            Commands::Daemon { socket } => {
                assert!(socket.is_none());
            }
            _ => panic!("Expected Daemon command"),
        }
    }

    #[test]
    fn test_parse_daemon_with_socket() {
        let cli =
            Cli::try_parse_from(["overscribe", "daemon", "--socket", "/tmp/test.sock"]).unwrap();
        match cli.command {
            Commands::Daemon { socket } => {
                assert_eq!(socket, Some(PathBuf::from("/tmp/test.sock")));
            }
            _ => panic!("Expected Daemon command"),
        }
    }

    #[test]
    fn test_parse_toggle() {
        let cli = Cli::try_parse_from(["overscribe", "toggle"]).unwrap();
        match cli.command {
            Commands::Toggle { socket } => {
                assert!(socket.is_none());
            }
            _ => panic!("Expected Toggle command"),
        }
    }

    #[test]
    fn test_parse_status_with_socket() {
        let cli =
            Cli::try_parse_from(["overscribe", "status", "--socket", "/tmp/test.sock"]).unwrap();
        match cli.command {
            Commands::Status { socket } => {
                assert_eq!(socket, Some(PathBuf::from("/tmp/test.sock")));
            }
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_parse_shutdown() {
        let cli = Cli::try_parse_from(["overscribe", "shutdown"]).unwrap();
        match cli.command {
            Commands::Shutdown { socket } => {
                assert!(socket.is_none());
            }
            _ => panic!("Expected Shutdown command"),
        }
    }

    #[test]
    fn test_parse_follow() {
        let cli = Cli::try_parse_from(["overscribe", "follow"]).unwrap();
        match cli.command {
            Commands::Follow { socket, json } => {
                assert!(socket.is_none());
                assert!(!json);
            }
            _ => panic!("Expected Follow command"),
        }
    }

    #[test]
    fn test_parse_follow_json() {
        let cli = Cli::try_parse_from(["overscribe", "follow", "--json"]).unwrap();
        match cli.command {
            Commands::Follow { json, .. } => assert!(json),
            _ => panic!("Expected Follow command"),
        }
    }

    #[test]
    fn test_parse_devices() {
        let cli = Cli::try_parse_from(["overscribe", "devices"]).unwrap();
        assert!(matches!(cli.command, Commands::Devices));
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["overscribe", "check"]).unwrap();
        assert!(matches!(cli.command, Commands::Check));
    }

    #[test]
    fn test_parse_config_show() {
        let cli = Cli::try_parse_from(["overscribe", "config", "show"]).unwrap();
        match cli.command {
            Commands::Config { action } => assert!(matches!(action, ConfigAction::Show)),
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_parse_config_path() {
        let cli = Cli::try_parse_from(["overscribe", "config", "path"]).unwrap();
        match cli.command {
            Commands::Config { action } => assert!(matches!(action, ConfigAction::Path)),
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn test_parse_global_config() {
        let cli = Cli::try_parse_from([
            "overscribe",
            "daemon",
            "--config",
            "/path/to/config.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
    }

    #[test]
    fn test_parse_global_quiet() {
        let cli = Cli::try_parse_from(["overscribe", "--quiet", "daemon"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_parse_global_device() {
        let cli = Cli::try_parse_from(["overscribe", "daemon", "--device", "hw:1,0"]).unwrap();
        assert_eq!(cli.device.as_deref(), Some("hw:1,0"));
    }

    #[test]
    fn test_command_is_required() {
        let result = Cli::try_parse_from(["overscribe"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_command_returns_error() {
        let result = Cli::try_parse_from(["overscribe", "invalid"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_help_flag() {
        let result = Cli::try_parse_from(["overscribe", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["overscribe", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_global_options_after_command() {
        let cli =
            Cli::try_parse_from(["overscribe", "devices", "--config", "/tmp/config.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.toml")));
    }
}
