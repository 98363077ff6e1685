//! Keyboard layout controller
//!
//! Hyprland only exposes the *currently active* keymap of each keyboard, and
//! switching is done by index. Both operations go through `hyprctl`.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use perwindow_layout_config::ControllerConfig;
use tokio::process::Command;
use tracing::trace;

use super::error::HyprError;
use super::types::DevicesResponse;

/// Queries keyboards and switches their layout
#[async_trait]
pub trait Controller: Send + Sync {
    /// Report every keyboard with its configured layouts and active keymap
    async fn devices(&self) -> Result<DevicesResponse, HyprError>;

    /// Switch all keyboards to the layout at `index`
    async fn switch_layout(&self, index: usize) -> Result<(), HyprError>;
}

/// `Controller` backed by the `hyprctl` command line tool
#[derive(Debug, Clone)]
pub struct Hyprctl {
    program: PathBuf,
    /// Arguments placed before every subcommand (e.g. `--instance 1`)
    base_args: Vec<OsString>,
    timeout: Option<Duration>,
}

impl Hyprctl {
    pub fn with_args<I, S>(program: impl Into<PathBuf>, base_args: I, timeout: Option<Duration>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            base_args: base_args.into_iter().map(Into::into).collect(),
            timeout,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::with_args(
            config.hyprctl.clone(),
            config.hyprctl_args.iter().cloned(),
            config.timeout,
        )
    }

    /// Human readable command line, used in errors and logs
    fn describe(&self, args: &[&str]) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(args.iter().map(|arg| arg.to_string()));
        parts.join(" ")
    }

    async fn run(&self, args: &[&str]) -> Result<Output, HyprError> {
        let command = self.describe(args);
        trace!(command = %command, "Running controller");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, cmd.output())
                .await
                .map_err(|_| HyprError::ControllerTimeout {
                    command: command.clone(),
                    timeout,
                })?,
            None => cmd.output().await,
        };

        let output = result.map_err(|source| HyprError::ControllerSpawn {
            command: command.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(HyprError::ControllerFailed {
                command,
                status: output.status.to_string(),
                output: describe_output(&output),
            });
        }

        Ok(output)
    }
}

/// Trimmed stderr, or stdout when stderr is empty
fn describe_output(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr.trim().to_string()
    }
}

#[async_trait]
impl Controller for Hyprctl {
    async fn devices(&self) -> Result<DevicesResponse, HyprError> {
        let output = self.run(&["devices", "-j"]).await?;
        serde_json::from_slice(&output.stdout).map_err(HyprError::DeserializeFailed)
    }

    async fn switch_layout(&self, index: usize) -> Result<(), HyprError> {
        let index = index.to_string();
        let args = ["switchxkblayout", "all", index.as_str()];
        let output = self.run(&args).await?;

        // hyprctl exits 0 even when the dispatcher rejects the request
        let reply = String::from_utf8_lossy(&output.stdout);
        let reply = reply.trim();
        if !reply.is_empty() && reply != "ok" {
            return Err(HyprError::ControllerFailed {
                command: self.describe(&args),
                status: output.status.to_string(),
                output: reply.to_string(),
            });
        }

        Ok(())
    }
}
