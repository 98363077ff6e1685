//! perwindow-layout daemon
//!
//! Remembers the keyboard layout of every Hyprland window and restores it
//! when the window is focused again.

mod directory;
mod error;
mod hypr_ipc;
mod supervisor;
mod tracker;

#[cfg(test)]
mod testing;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use perwindow_layout_config::{Config, GlobalConfig};
use tokio::signal::unix::{signal, SignalKind};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::directory::LayoutDirectory;
use crate::error::PipelineError;
use crate::hypr_ipc::{event_socket_path, Hyprctl, SocketConnector};
use crate::supervisor::{Backoff, Supervisor};

#[derive(Parser, Debug)]
#[command(name = "perwindow-layoutd")]
#[command(about = "Per-window keyboard layout daemon for Hyprland")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/perwindow-layout/config.kdl")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Commands {
    /// Run the daemon (default)
    Run,

    /// Probe the keyboard and print the discovered layouts
    Layouts,

    /// Validate the configuration file and print the effective settings
    CheckConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&args.config).into_owned().into();

    // Logging is configured by the file itself, so parser warnings go to a
    // plain stderr subscriber
    let bootstrap = fmt().with_writer(std::io::stderr).finish();
    let config = tracing::subscriber::with_default(bootstrap, || {
        perwindow_layout_config::load_config(&config_path)
    })
    .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let _log_guard = init_logging(&config.global)?;
    tracing::debug!("Loaded configuration from {}", config_path.display());

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd_run(&config).await,
        Commands::Layouts => cmd_layouts(&config).await,
        Commands::CheckConfig => cmd_check_config(&config_path, &config),
    }
}

/// Log to stderr, and additionally to `log-file` when configured
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(global: &GlobalConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(global.log_level.as_filter()));

    let (file_layer, guard) = match &global.log_file {
        Some(path) => {
            let appender = file_appender(path)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

fn file_appender(path: &Path) -> Result<RollingFileAppender> {
    let file_name = path
        .file_name()
        .with_context(|| format!("log-file has no file name: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("Could not open log file {}", path.display()))
}

fn socket_path(config: &Config) -> Result<PathBuf, PipelineError> {
    match &config.hyprland.socket_path {
        Some(path) => Ok(path.clone()),
        None => event_socket_path().map_err(PipelineError::Startup),
    }
}

async fn cmd_run(config: &Config) -> Result<()> {
    let socket_path = socket_path(config).inspect_err(|e| tracing::error!("{}", e))?;

    let connector = SocketConnector::new(socket_path);
    tracing::info!(
        socket = %connector.path().display(),
        "perwindow-layout daemon starting..."
    );

    let mut supervisor = Supervisor::new(
        connector,
        Hyprctl::from_config(&config.controller),
        Backoff::from_config(&config.reconnect),
    );

    tokio::select! {
        err = supervisor.run() => {
            tracing::error!("{}", err);
            Err(err.into())
        }
        res = shutdown_signal() => {
            res?;
            tracing::info!("Shutting down...");
            Ok(())
        }
    }
}

async fn shutdown_signal() -> Result<()> {
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res?,
        _ = terminate.recv() => {}
    }
    Ok(())
}

async fn cmd_layouts(config: &Config) -> Result<()> {
    let controller = Hyprctl::from_config(&config.controller);
    let directory = LayoutDirectory::discover(&controller).await?;

    if directory.is_empty() {
        println!("No layouts configured");
    }
    for (index, name) in directory.names().iter().enumerate() {
        println!("{}\t{}", index, name);
    }

    Ok(())
}

fn cmd_check_config(config_path: &Path, config: &Config) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    write_settings(&mut stdout, config_path, config)?;
    Ok(())
}

fn write_settings(out: &mut impl Write, config_path: &Path, config: &Config) -> io::Result<()> {
    if config_path.exists() {
        writeln!(out, "Configuration is valid: {}", config_path.display())?;
    } else {
        writeln!(
            out,
            "No configuration at {}, using defaults",
            config_path.display()
        )?;
    }

    writeln!(out, "  Log level: {}", config.global.log_level.as_filter())?;
    if let Some(log_file) = &config.global.log_file {
        writeln!(out, "  Log file: {}", log_file.display())?;
    }
    match &config.hyprland.socket_path {
        Some(path) => writeln!(out, "  Event socket: {}", path.display())?,
        None => writeln!(out, "  Event socket: derived from $HYPRLAND_INSTANCE_SIGNATURE")?,
    }

    let mut hyprctl = config.controller.hyprctl.display().to_string();
    for arg in &config.controller.hyprctl_args {
        hyprctl.push(' ');
        hyprctl.push_str(arg);
    }
    writeln!(out, "  hyprctl: {}", hyprctl)?;

    match config.controller.timeout {
        Some(timeout) => writeln!(out, "  Controller timeout: {:?}", timeout)?,
        None => writeln!(out, "  Controller timeout: none")?,
    }
    writeln!(
        out,
        "  Backoff: {:?}, max retries: {}",
        config.reconnect.backoff, config.reconnect.max_retries
    )
}
