//! Configuration data model

use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub global: GlobalConfig,
    pub hyprland: HyprlandConfig,
    pub controller: ControllerConfig,
    pub reconnect: ReconnectConfig,
}

/// Global settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
    /// Extra log sink, appended to alongside stderr
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Where to find the Hyprland event socket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HyprlandConfig {
    /// Explicit `.socket2.sock` path. When unset the path is derived from
    /// `HYPRLAND_INSTANCE_SIGNATURE` and the current uid.
    pub socket_path: Option<PathBuf>,
}

/// How the layout controller (`hyprctl`) is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Program used for `devices -j` and `switchxkblayout`
    pub hyprctl: PathBuf,
    /// Arguments passed before every subcommand (e.g. `--instance 1`)
    pub hyprctl_args: Vec<String>,
    /// Upper bound for a single controller call; `None` waits forever
    pub timeout: Option<Duration>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            hyprctl: PathBuf::from("hyprctl"),
            hyprctl_args: Vec::new(),
            timeout: Some(Duration::from_millis(5000)),
        }
    }
}

/// Reconnect policy for the event pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Wait before the k-th consecutive retry; the last value repeats
    pub backoff: Vec<Duration>,
    /// Consecutive failed attempts tolerated before giving up
    pub max_retries: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            backoff: [500, 1000, 2000, 4000]
                .into_iter()
                .map(Duration::from_millis)
                .collect(),
            max_retries: 4,
        }
    }
}
