//! Per-window layout tracking
//!
//! The tracker correlates two Hyprland events:
//!
//! - `activelayout>>KEYBOARD,KEYMAP` — the user switched layout; remember it
//!   for the focused window.
//! - `activewindowv2>>ADDRESS` — focus moved; restore the layout remembered
//!   for the new window (or the default layout for windows seen first time).
//!
//! `closewindow>>ADDRESS` drops the association so the map only holds live
//! windows. Every other event is ignored.
//!
//! A layout switch is only issued when the target differs from the layout the
//! tracker believes is active. The switch itself triggers an `activelayout`
//! event from Hyprland, which simply re-records the same index.

use std::collections::HashMap;

use tracing::debug;

use crate::directory::{LayoutDirectory, LayoutIndex, DEFAULT_LAYOUT};
use crate::error::PipelineError;
use crate::hypr_ipc::{Controller, HyprEvent};

pub const ACTIVE_LAYOUT_EVENT: &str = "activelayout";
pub const ACTIVE_WINDOW_EVENT: &str = "activewindowv2";
pub const CLOSE_WINDOW_EVENT: &str = "closewindow";

/// Opaque window address assigned by Hyprland
pub type WindowId = String;

/// What handling a single event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Event not relevant, or nothing to attribute it to
    Ignored,
    /// Layout change remembered for the focused window
    Recorded { window: WindowId, layout: LayoutIndex },
    /// Focus change that required a layout switch
    Switched { window: WindowId, layout: LayoutIndex },
    /// Focus change where the right layout was already active
    Unchanged,
    /// Closed window's association dropped
    Forgotten { window: WindowId },
}

/// Session cursor plus the window→layout associations
#[derive(Debug, Default)]
struct SessionState {
    current_window: Option<WindowId>,
    /// `None` until the tracker has observed or applied a layout
    current_layout: Option<LayoutIndex>,
    windows: HashMap<WindowId, LayoutIndex>,
}

/// Remembers the last layout of each window and restores it on focus
#[derive(Debug)]
pub struct WindowLayoutTracker {
    directory: LayoutDirectory,
    state: SessionState,
}

impl WindowLayoutTracker {
    pub fn new(directory: LayoutDirectory) -> Self {
        Self {
            directory,
            state: SessionState::default(),
        }
    }

    pub fn current_window(&self) -> Option<&str> {
        self.state.current_window.as_deref()
    }

    pub fn current_layout(&self) -> Option<LayoutIndex> {
        self.state.current_layout
    }

    /// Layout remembered for `window`, if any
    pub fn layout_for(&self, window: &str) -> Option<LayoutIndex> {
        self.state.windows.get(window).copied()
    }

    pub fn tracked_windows(&self) -> usize {
        self.state.windows.len()
    }

    /// Apply one compositor event
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Command` if a required layout switch fails. The
    /// tracker state is left as it was before the event in that case.
    pub async fn handle_event<C>(
        &mut self,
        event: &HyprEvent,
        controller: &C,
    ) -> Result<Outcome, PipelineError>
    where
        C: Controller + ?Sized,
    {
        match event.name.as_str() {
            ACTIVE_LAYOUT_EVENT => Ok(self.on_active_layout(event.last_arg())),
            ACTIVE_WINDOW_EVENT => self.on_active_window(event.last_arg(), controller).await,
            CLOSE_WINDOW_EVENT => Ok(self.on_close_window(event.last_arg())),
            _ => Ok(Outcome::Ignored),
        }
    }

    fn on_active_layout(&mut self, keymap: &str) -> Outcome {
        if self.directory.lookup(keymap).is_none() {
            debug!(keymap = %keymap, "Unknown keymap, assuming default layout");
        }
        let layout = self.directory.resolve(keymap);

        let Some(window) = self.state.current_window.clone() else {
            return Outcome::Ignored;
        };

        self.state.current_layout = Some(layout);
        self.state.windows.insert(window.clone(), layout);

        Outcome::Recorded { window, layout }
    }

    async fn on_active_window<C>(
        &mut self,
        window: &str,
        controller: &C,
    ) -> Result<Outcome, PipelineError>
    where
        C: Controller + ?Sized,
    {
        if self.state.current_window.as_deref() == Some(window) {
            return Ok(Outcome::Unchanged);
        }

        let target = self.layout_for(window).unwrap_or(DEFAULT_LAYOUT);
        if self.state.current_layout == Some(target) {
            self.state.current_window = Some(window.to_string());
            return Ok(Outcome::Unchanged);
        }

        controller
            .switch_layout(target)
            .await
            .map_err(|source| PipelineError::Command {
                index: target,
                source,
            })?;

        self.state.current_window = Some(window.to_string());
        self.state.current_layout = Some(target);

        Ok(Outcome::Switched {
            window: window.to_string(),
            layout: target,
        })
    }

    fn on_close_window(&mut self, window: &str) -> Outcome {
        if self.state.current_window.as_deref() == Some(window) {
            self.state.current_window = None;
        }

        match self.state.windows.remove(window) {
            Some(_) => Outcome::Forgotten {
                window: window.to_string(),
            },
            None => Outcome::Ignored,
        }
    }
}
