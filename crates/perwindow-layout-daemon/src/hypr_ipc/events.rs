//! Hyprland event socket
//!
//! Hyprland publishes compositor events on `.socket2.sock`, one line per
//! event, for as long as the client stays connected. Nothing is ever written
//! to this socket by the client.
//!
//! The pipeline does not use `HyprEventStream` directly; it is generic over
//! `Connector` and `EventSource` so tests can drive it with scripted events.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::debug;

use super::error::HyprError;
use super::event::HyprEvent;

/// Environment variable identifying the running Hyprland instance
pub const INSTANCE_SIGNATURE_ENV: &str = "HYPRLAND_INSTANCE_SIGNATURE";

/// Derive the event socket path for the current session
///
/// The path is `/run/user/<uid>/hypr/<signature>/.socket2.sock`.
///
/// # Errors
///
/// Returns `HyprError::SignatureNotSet` if `$HYPRLAND_INSTANCE_SIGNATURE` is
/// unset or empty.
pub fn event_socket_path() -> Result<PathBuf, HyprError> {
    let signature = std::env::var(INSTANCE_SIGNATURE_ENV)
        .ok()
        .filter(|sig| !sig.is_empty())
        .ok_or(HyprError::SignatureNotSet)?;

    let uid = nix::unistd::getuid().as_raw();
    Ok(socket_path_for(uid, &signature))
}

fn socket_path_for(uid: u32, signature: &str) -> PathBuf {
    PathBuf::from(format!("/run/user/{}/hypr/{}/.socket2.sock", uid, signature))
}

/// A source of parsed compositor events
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next event
    async fn read_event(&mut self) -> Result<HyprEvent, HyprError>;

    /// Release the connection; later reads fail with `HyprError::StreamClosed`
    async fn close(&mut self);
}

/// Opens a fresh `EventSource` for every pipeline attempt
#[async_trait]
pub trait Connector: Send + Sync {
    type Source: EventSource;

    async fn connect(&self) -> Result<Self::Source, HyprError>;
}

/// Connects to a fixed event socket path
#[derive(Debug, Clone)]
pub struct SocketConnector {
    path: PathBuf,
}

impl SocketConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Connector for SocketConnector {
    type Source = HyprEventStream;

    async fn connect(&self) -> Result<HyprEventStream, HyprError> {
        HyprEventStream::connect(&self.path).await
    }
}

/// Live connection to the Hyprland event socket
#[derive(Debug)]
pub struct HyprEventStream {
    /// `None` once the stream has been closed
    reader: Option<BufReader<UnixStream>>,
}

impl HyprEventStream {
    /// Connect to the event socket at `path`
    ///
    /// # Errors
    ///
    /// Returns `HyprError::ConnectionFailed` if the socket cannot be opened.
    pub async fn connect(path: &Path) -> Result<Self, HyprError> {
        let socket = UnixStream::connect(path)
            .await
            .map_err(|e| HyprError::ConnectionFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        debug!("Connected to Hyprland event socket at {}", path.display());

        Ok(Self {
            reader: Some(BufReader::new(socket)),
        })
    }

    /// Read and parse the next event line
    ///
    /// # Errors
    ///
    /// Returns `HyprError::StreamClosed` after `close()`.
    /// Returns `HyprError::ConnectionClosed` on EOF.
    /// Returns `HyprError::ReceiveFailed` if reading from the socket fails.
    /// Returns `HyprError::MalformedEvent` if the line cannot be parsed.
    pub async fn next_event(&mut self) -> Result<HyprEvent, HyprError> {
        let reader = self.reader.as_mut().ok_or(HyprError::StreamClosed)?;

        // Window titles are not guaranteed to be UTF-8
        let mut buf = Vec::new();
        let bytes_read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(HyprError::ReceiveFailed)?;

        if bytes_read == 0 {
            return Err(HyprError::ConnectionClosed);
        }

        let line = String::from_utf8_lossy(&buf);
        HyprEvent::parse(line.trim_end_matches(['\n', '\r']))
    }

    /// Shut the socket down and drop it
    pub async fn shutdown(&mut self) {
        if let Some(reader) = self.reader.take() {
            let mut socket = reader.into_inner();
            if let Err(e) = socket.shutdown().await {
                debug!("Error shutting down event socket: {}", e);
            }
        }
    }
}

#[async_trait]
impl EventSource for HyprEventStream {
    async fn read_event(&mut self) -> Result<HyprEvent, HyprError> {
        self.next_event().await
    }

    async fn close(&mut self) {
        self.shutdown().await;
    }
}
