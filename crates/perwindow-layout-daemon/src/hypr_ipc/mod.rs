//! Hyprland IPC for the layout daemon
//!
//! Two channels are involved:
//!
//! - The event socket (`/run/user/<uid>/hypr/<signature>/.socket2.sock`),
//!   a one-way stream of `NAME>>ARG1,ARG2,...` lines.
//! - The `hyprctl` controller, used to list keyboards (`devices -j`) and to
//!   switch the active layout (`switchxkblayout all <index>`).
//!
//! ## Architecture
//!
//! - `HyprEvent`: one parsed event line
//! - `HyprEventStream`: live connection to the event socket
//! - `EventSource` / `Connector`: seams the pipeline is generic over
//! - `Controller` / `Hyprctl`: keyboard queries and layout switches
//! - `HyprError`: error type for all of the above

mod controller;
mod error;
mod event;
mod events;
mod types;

pub use controller::{Controller, Hyprctl};
pub use error::HyprError;
pub use event::HyprEvent;
pub use events::{event_socket_path, Connector, EventSource, SocketConnector};
pub use types::{DevicesResponse, Keyboard};
