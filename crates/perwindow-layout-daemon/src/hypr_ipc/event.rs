//! Event line parsing

use super::HyprError;

const DELIMITER: &str = ">>";

/// One event from the Hyprland event socket
///
/// Lines look like `activewindowv2>>55d0b1c2e3f0` or
/// `activelayout>>at-translated-set-2-keyboard,English (US)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyprEvent {
    pub name: String,
    pub args: Vec<String>,
}

impl HyprEvent {
    /// Parse a single line (without its trailing newline)
    ///
    /// Splits on the first `>>` and then splits the remainder on `,`. An empty
    /// remainder gives a single empty argument.
    ///
    /// # Errors
    ///
    /// Returns `HyprError::MalformedEvent` if the line has no `>>`.
    pub fn parse(line: &str) -> Result<Self, HyprError> {
        let (name, raw_args) =
            line.split_once(DELIMITER)
                .ok_or_else(|| HyprError::MalformedEvent {
                    line: line.to_string(),
                })?;

        Ok(Self {
            name: name.to_string(),
            args: raw_args.split(',').map(str::to_string).collect(),
        })
    }

    /// The final argument, which carries the payload for the events we track
    pub fn last_arg(&self) -> &str {
        self.args.last().map(String::as_str).unwrap_or_default()
    }
}
