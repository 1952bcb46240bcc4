use anyhow::Result;
use clap::{CommandFactory, Parser};
use overscribe::cli::{Cli, Commands, ConfigAction};
use overscribe::config::Config;
use overscribe::daemon::run_daemon;
use overscribe::device::{self, CommandProbe, DeviceProbe};
use overscribe::ipc::client::{follow_events, send_command};
use overscribe::ipc::protocol::{Command, Response};
use overscribe::ipc::server::IpcServer;
use owo_colors::OwoColorize;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon { socket } => {
            let config = load_config(cli.config.as_deref(), cli.device)?;
            run_daemon(config, socket, cli.quiet).await?;
        }
        Commands::Toggle { socket } => {
            handle_ipc_command(socket, Command::Toggle).await?;
        }
        Commands::Status { socket } => {
            handle_ipc_command(socket, Command::Status).await?;
        }
        Commands::Shutdown { socket } => {
            handle_ipc_command(socket, Command::Shutdown).await?;
        }
        Commands::Follow { socket, json } => {
            handle_follow(socket, json).await?;
        }
        Commands::Devices => {
            let config = load_config(cli.config.as_deref(), cli.device)?;
            list_capture_devices(&config)?;
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref(), cli.device)?;
            check_setup(&config);
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref(), cli.device)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "overscribe",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/overscribe/config.toml)
/// 3. Built-in defaults with environment variable overrides
///
/// A `--device` flag beats both the file and the environment.
fn load_config(custom_path: Option<&std::path::Path>, device: Option<String>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    let mut config = config.with_env_overrides();
    if device.is_some() {
        config.audio.device = device;
    }
    Ok(config)
}

/// Probe and list capture devices.
fn list_capture_devices(config: &Config) -> Result<()> {
    let probe = CommandProbe::from_config(&config.audio)?;
    let output = probe.enumerate()?;
    let names = device::quoted_device_names(&output);

    if names.is_empty() {
        eprintln!("No capture devices found in probe output");
        std::process::exit(1);
    }

    let selected = device::select_device(&output, &config.audio.probe_keyword);
    println!("Capture devices:");
    for name in &names {
        if Some(name) == selected.as_ref() {
            println!("  {} {}", "●".green(), name);
        } else {
            println!("  ○ {}", name);
        }
    }

    Ok(())
}

/// Check that the engine binary, model, and probe command are usable.
fn check_setup(config: &Config) {
    let mut ok = true;

    let binary = &config.engine.binary;
    if binary.is_file() {
        println!("{} engine binary: {}", "ok".green(), binary.display());
    } else {
        println!("{} engine binary: {} (not found)", "missing".red(), binary.display());
        ok = false;
    }

    let model = &config.engine.model;
    if model.is_file() {
        println!("{} model: {}", "ok".green(), model.display());
    } else {
        println!("{} model: {} (not found)", "missing".red(), model.display());
        ok = false;
    }

    match CommandProbe::from_config(&config.audio) {
        Ok(probe) => match probe.enumerate() {
            Ok(output) => {
                match device::select_device(&output, &config.audio.probe_keyword) {
                    Some(name) => println!("{} device probe: {}", "ok".green(), name),
                    None => println!(
                        "{} device probe: no match for '{}', will use fallback",
                        "warn".yellow(),
                        config.audio.probe_keyword
                    ),
                }
            }
            Err(e) => {
                println!("{} device probe: {} (fallback applies)", "warn".yellow(), e);
            }
        },
        Err(e) => {
            println!("{} device probe: {}", "warn".yellow(), e);
        }
    }

    if !ok {
        std::process::exit(1);
    }
}

/// Handle configuration inspection commands.
fn handle_config_command(
    action: ConfigAction,
    custom_path: Option<&std::path::Path>,
    device: Option<String>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path, device)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(std::path::PathBuf::from)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Send IPC command to daemon and handle response.
async fn handle_ipc_command(socket: Option<std::path::PathBuf>, command: Command) -> Result<()> {
    let socket_path = socket.unwrap_or_else(IpcServer::default_socket_path);

    match send_command(&socket_path, command).await {
        Ok(response) => match response {
            Response::Ok => {
                println!("{}", "ok".green());
            }
            Response::Ignored => {
                println!("{}", "ignored (transition in flight)".yellow());
            }
            Response::Status { state, device } => {
                println!("Status:");
                println!("  {}  {}", "Client:".dimmed(), overscribe::version_string());
                println!("  {}   {}", "State:".dimmed(), state);
                println!("  {}  {}", "Device:".dimmed(), device);
            }
            Response::Error { message } => {
                eprintln!("{}", format!("Error: {}", message).red());
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!(
                "{}",
                format!("Failed to communicate with daemon: {}", e).red()
            );
            eprintln!("Is the daemon running? Start it with: overscribe daemon");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Follow daemon events and render live output.
async fn handle_follow(socket: Option<std::path::PathBuf>, json: bool) -> Result<()> {
    let socket_path = socket.unwrap_or_else(IpcServer::default_socket_path);

    if !json {
        eprintln!("Following daemon events... (Ctrl+C to stop)");
    }

    let result = follow_events(&socket_path, |event| {
        if json {
            if let Ok(line) = event.to_json() {
                println!("{}", line);
            }
        } else {
            overscribe::output::render_event(&event);
        }
    })
    .await;

    match result {
        Ok(()) => {
            if !json {
                eprintln!("Daemon connection closed");
            }
        }
        Err(e) => {
            eprintln!("Failed to follow daemon: {}", e);
            eprintln!("Is the daemon running? Start it with: overscribe daemon");
            std::process::exit(1);
        }
    }

    Ok(())
}
