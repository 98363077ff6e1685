//! Configuration parsing for perwindow-layout
//!
//! This crate handles parsing the daemon's KDL configuration file: logging,
//! the Hyprland socket location, the `hyprctl` controller and the reconnect
//! policy.

mod error;
mod model;
mod parser;

pub use error::ConfigError;
pub use model::*;
pub use parser::{load_config, parse_config, parse_config_str};
