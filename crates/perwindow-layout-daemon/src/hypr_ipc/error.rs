//! Error types for Hyprland IPC operations

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to Hyprland
#[derive(Debug, Error)]
pub enum HyprError {
    /// The HYPRLAND_INSTANCE_SIGNATURE environment variable is not set
    #[error("HYPRLAND_INSTANCE_SIGNATURE not set - is Hyprland running?")]
    SignatureNotSet,

    /// Failed to connect to the event socket
    #[error("Failed to connect to Hyprland event socket at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read from the event socket
    #[error("Failed to read from Hyprland event socket: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The compositor closed the event socket
    #[error("Hyprland event socket closed unexpectedly")]
    ConnectionClosed,

    /// The stream was closed locally and can no longer be read
    #[error("Event stream already closed")]
    StreamClosed,

    /// An event line without the `>>` delimiter
    #[error("Malformed event line: {line:?}")]
    MalformedEvent { line: String },

    /// The controller process could not be started
    #[error("Failed to run `{command}`: {source}")]
    ControllerSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The controller ran but reported failure
    #[error("`{command}` failed ({status}): {output}")]
    ControllerFailed {
        command: String,
        status: String,
        output: String,
    },

    /// The controller did not finish in time
    #[error("`{command}` did not finish within {timeout:?}")]
    ControllerTimeout { command: String, timeout: Duration },

    /// The controller output could not be deserialized
    #[error("Failed to deserialize controller response: {0}")]
    DeserializeFailed(#[source] serde_json::Error),

    /// The controller reported no keyboards at all
    #[error("Hyprland reported no keyboards")]
    NoKeyboards,
}
